use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use scripthive_core::models::Transaction;
use scripthive_core::utils::{format_amount, format_date, format_optional, format_phone};

use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(8)])
        .split(area);

    render_transaction_list(frame, app, chunks[0]);
    render_transaction_detail(
        frame,
        app.transactions.get(app.payments_selection),
        chunks[1],
    );
}

fn render_transaction_list(frame: &mut Frame, app: &App, area: Rect) {
    let header = Row::new([
        Cell::from("Phone"),
        Cell::from("Amount"),
        Cell::from("Receipt"),
        Cell::from("Status"),
        Cell::from("Date"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = app
        .transactions
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let style = if i == app.payments_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            let date = t
                .transaction_date
                .as_deref()
                .map(format_date)
                .unwrap_or_else(|| "N/A".to_string());

            Row::new(vec![
                Cell::from(format_phone(&t.phone_number)),
                Cell::from(format_amount(t.amount)),
                Cell::from(t.receipt_display().to_string()),
                Cell::from(t.status.clone()).style(styles::status_style(t.status_kind())),
                Cell::from(date),
            ])
            .style(style)
        })
        .collect();

    let successful = app.transactions.iter().filter(|t| t.is_successful()).count();
    let title = if app.view_loading {
        " Transactions (loading...) ".to_string()
    } else {
        format!(
            " Transactions ({}, {} successful) ",
            app.transactions.len(),
            successful
        )
    };
    let block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(22),
            Constraint::Percentage(16),
            Constraint::Percentage(18),
            Constraint::Percentage(14),
            Constraint::Percentage(30),
        ],
    )
    .header(header)
    .block(block);

    let mut state = TableState::default();
    if !app.transactions.is_empty() {
        state.select(Some(app.payments_selection));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_transaction_detail(frame: &mut Frame, transaction: Option<&Transaction>, area: Rect) {
    let lines = match transaction {
        Some(t) => vec![
            Line::from(vec![
                Span::styled("Result      ", styles::highlight_style()),
                Span::raw(format_optional(Some(t.result_desc.as_str()), "N/A")),
            ]),
            Line::from(vec![
                Span::styled("Merchant ID ", styles::highlight_style()),
                Span::raw(format_optional(t.merchant_request_id.as_deref(), "N/A")),
            ]),
            Line::from(vec![
                Span::styled("Checkout ID ", styles::highlight_style()),
                Span::raw(format_optional(t.checkout_request_id.as_deref(), "N/A")),
            ]),
        ],
        None => vec![Line::from(Span::styled(
            "No transaction selected",
            styles::muted_style(),
        ))],
    };

    let block = Block::default()
        .title(" Details ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}
