use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use scripthive_core::models::Project;
use scripthive_core::utils::{format_amount, format_optional, truncate_string};

use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(area);

    render_project_list(frame, app, chunks[0]);
    render_project_detail(frame, app.projects.get(app.scripts_selection), chunks[1]);
}

fn render_project_list(frame: &mut Frame, app: &App, area: Rect) {
    let header = Row::new([
        Cell::from("Title"),
        Cell::from("Category"),
        Cell::from("Status"),
        Cell::from("Due"),
        Cell::from("Budget"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = app
        .projects
        .iter()
        .enumerate()
        .map(|(i, project)| {
            let style = if i == app.scripts_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };

            Row::new(vec![
                Cell::from(truncate_string(&project.project_title, 28)),
                Cell::from(project.category.clone()),
                Cell::from(project.status_label().to_string())
                    .style(styles::status_style(project.status_kind())),
                Cell::from(project.due_display()),
                Cell::from(format_amount(project.payment_budget)),
            ])
            .style(style)
        })
        .collect();

    let title = if app.view_loading {
        " Posted Scripts (loading...) ".to_string()
    } else {
        format!(" Posted Scripts ({}) ", app.projects.len())
    };
    let block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(34),
            Constraint::Percentage(16),
            Constraint::Percentage(14),
            Constraint::Percentage(18),
            Constraint::Percentage(18),
        ],
    )
    .header(header)
    .block(block);

    let mut state = TableState::default();
    if !app.projects.is_empty() {
        state.select(Some(app.scripts_selection));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

fn detail_line(label: &'static str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<12}", label), styles::highlight_style()),
        Span::raw(value),
    ])
}

fn render_project_detail(frame: &mut Frame, project: Option<&Project>, area: Rect) {
    let (title, lines) = match project {
        Some(p) => (
            format!(" {} ", truncate_string(&p.project_title, 30)),
            vec![
                detail_line("Category", p.category.clone()),
                Line::from(vec![
                    Span::styled(format!("{:<12}", "Status"), styles::highlight_style()),
                    Span::styled(p.status_label().to_string(), styles::status_style(p.status_kind())),
                ]),
                detail_line("Due", p.due_display()),
                detail_line("Budget", format_amount(p.payment_budget)),
                Line::from(""),
                detail_line("Repository", format_optional(Some(p.repository_url.as_str()), "N/A")),
                detail_line("Deployment", format_optional(Some(p.deployment.as_str()), "N/A")),
                detail_line("Hosting", format_optional(Some(p.hosting.as_str()), "N/A")),
            ],
        ),
        None => (
            " No Script Selected ".to_string(),
            vec![Line::from(Span::styled(
                "Select a script from the list",
                styles::muted_style(),
            ))],
        ),
    };

    let block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}
