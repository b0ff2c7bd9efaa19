use ratatui::{
    layout::{Constraint, Rect},
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use scripthive_core::utils::{format_phone, truncate_string};

use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let header = Row::new([
        Cell::from("Name"),
        Cell::from("Username"),
        Cell::from("Email"),
        Cell::from("Phone"),
        Cell::from("Role"),
        Cell::from("Status"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = app
        .users
        .iter()
        .enumerate()
        .map(|(i, user)| {
            let style = if i == app.users_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            let status_style = if user.active {
                styles::success_style()
            } else {
                styles::muted_style()
            };
            let phone = match user.phone.as_deref() {
                Some(p) if !p.trim().is_empty() => format_phone(p),
                _ => "-".to_string(),
            };

            Row::new(vec![
                Cell::from(truncate_string(&user.full_name, 24)),
                Cell::from(user.username.clone()),
                Cell::from(truncate_string(&user.email, 30)),
                Cell::from(phone),
                Cell::from(user.role.clone()),
                Cell::from(user.status_label()).style(status_style),
            ])
            .style(style)
        })
        .collect();

    let title = if app.view_loading {
        " Manage Users (loading...) ".to_string()
    } else {
        format!(" Manage Users ({}) [d] delete ", app.users.len())
    };
    let block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(20),
            Constraint::Percentage(14),
            Constraint::Percentage(26),
            Constraint::Percentage(16),
            Constraint::Percentage(10),
            Constraint::Percentage(14),
        ],
    )
    .header(header)
    .block(block);

    let mut state = TableState::default();
    if !app.users.is_empty() {
        state.select(Some(app.users_selection));
    }
    frame.render_stateful_widget(table, area, &mut state);
}
