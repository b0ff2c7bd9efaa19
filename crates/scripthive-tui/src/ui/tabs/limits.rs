use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame,
};

use scripthive_core::models::{FeeLimitKind, Role};
use scripthive_core::utils::format_date;

use crate::app::{App, LimitFocus};
use crate::ui::render::centered_rect_fixed;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    render_table(frame, app, FeeLimitKind::Registration, chunks[0]);
    render_table(frame, app, FeeLimitKind::ProjectBudget, chunks[1]);
}

fn render_table(frame: &mut Frame, app: &App, kind: FeeLimitKind, area: Rect) {
    let focused = app.limits_kind == kind;
    let limits = app.limits(kind);

    let header = Row::new([Cell::from("Role"), Cell::from("Amount"), Cell::from("Created")])
        .style(styles::title_style())
        .height(1);

    let rows: Vec<Row> = limits
        .iter()
        .enumerate()
        .map(|(i, limit)| {
            let style = if focused && i == app.limits_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            let created = limit
                .created_at
                .as_deref()
                .map(format_date)
                .unwrap_or_else(|| "-".to_string());
            Row::new(vec![
                Cell::from(limit.role.clone()),
                Cell::from(format!("KES {}", limit.amount)),
                Cell::from(created),
            ])
            .style(style)
        })
        .collect();

    let hints = match kind {
        FeeLimitKind::Registration => "[a]dd [e]dit [d]elete",
        FeeLimitKind::ProjectBudget => "[a]dd [d]elete",
    };
    let title = if app.view_loading && limits.is_empty() {
        format!(" {} (loading...) ", kind.title())
    } else if focused {
        format!(" {} ({}) {} ", kind.title(), limits.len(), hints)
    } else {
        format!(" {} ({}) [Tab] to select ", kind.title(), limits.len())
    };
    let block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(30),
            Constraint::Percentage(30),
            Constraint::Percentage(40),
        ],
    )
    .header(header)
    .block(block);

    let mut state = TableState::default();
    if focused && !limits.is_empty() {
        state.select(Some(app.limits_selection));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

/// Add/edit dialog for a fee limit.
pub fn render_form_overlay(frame: &mut Frame, app: &App) {
    let height = if app.limit_error.is_some() { 11 } else { 9 };
    let area = centered_rect_fixed(48, height, frame.area());
    frame.render_widget(Clear, area);

    let form = &app.limit_form;
    let role_focused = app.limit_focus == LimitFocus::Role;
    let amount_focused = app.limit_focus == LimitFocus::Amount;

    let mut role_spans = vec![Span::styled("  Role:    ", styles::muted_style())];
    for role in Role::ALL {
        let selected = form.role == Some(role);
        let marker = if selected { "(•) " } else { "( ) " };
        let style = if selected && role_focused {
            styles::selected_style()
        } else if selected {
            styles::highlight_style()
        } else {
            styles::list_item_style()
        };
        role_spans.push(Span::styled(format!("{}{}", marker, role.as_str()), style));
        role_spans.push(Span::raw("  "));
    }

    let cursor = if amount_focused { "▌" } else { " " };
    let mut lines = vec![
        Line::from(""),
        Line::from(role_spans),
        Line::from(vec![
            Span::styled("  Amount:  KES [", styles::muted_style()),
            Span::styled(
                format!("{:<12}{}", form.amount, cursor),
                styles::input_style(amount_focused),
            ),
            Span::styled("]", styles::muted_style()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Enter", styles::help_key_style()),
            Span::styled(" save  ", styles::muted_style()),
            Span::styled("←/→", styles::help_key_style()),
            Span::styled(" role  ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" cancel", styles::muted_style()),
        ]),
    ];

    if let Some(ref error) = app.limit_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("  {}", error),
            styles::error_style(),
        )));
    }

    let action = if form.editing_id.is_some() { "Edit" } else { "Add" };
    let block = Block::default()
        .title(format!(" {} {} ", action, app.limit_form_kind.title()))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
