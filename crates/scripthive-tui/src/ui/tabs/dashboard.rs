use chrono::Local;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph},
    Frame,
};

use scripthive_core::models::DashboardStats;
use scripthive_core::utils::{format_amount, initials, truncate_string};

use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    // Vertical layout:
    // 1. Welcome banner with profile header
    // 2. Two rows of stat cards
    // 3. Revenue trend and category charts
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),
            Constraint::Length(5),
            Constraint::Length(5),
            Constraint::Min(0),
        ])
        .split(area);

    render_welcome(frame, app, chunks[0]);

    let change = app.stats.as_ref().and_then(|s| s.revenue_change());
    let (scripts, active, pending, revenue, successful, failed) = match app.stats {
        Some(ref stats) => (
            stats.total_scripts.to_string(),
            format!("{} of {}", stats.active_users, stats.total_users),
            stats.pending_reviews.to_string(),
            format_amount(stats.revenue),
            stats.successful_payments.to_string(),
            stats.failed_payments.to_string(),
        ),
        None => {
            let placeholder = if app.view_loading { "..." } else { "-" };
            (
                placeholder.to_string(),
                placeholder.to_string(),
                placeholder.to_string(),
                placeholder.to_string(),
                placeholder.to_string(),
                placeholder.to_string(),
            )
        }
    };

    let cards = [
        [
            ("Total Scripts", scripts),
            ("Active Users", active),
            ("Pending Reviews", pending),
        ],
        [
            ("Revenue", revenue),
            ("Successful Payments", successful),
            ("Failed Payments", failed),
        ],
    ];

    for (row, area) in cards.into_iter().zip([chunks[1], chunks[2]]) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ])
            .split(area);
        for ((label, value), column) in row.into_iter().zip(columns.iter()) {
            let detail = if label == "Revenue" { change } else { None };
            render_card(frame, label, value, detail, *column);
        }
    }

    if let Some(ref stats) = app.stats {
        let charts = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(chunks[3]);
        render_revenue_chart(frame, stats, charts[0]);
        render_category_chart(frame, stats, charts[1]);
    }
}

fn render_welcome(frame: &mut Frame, app: &App, area: Rect) {
    let name = app.display_name();

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Welcome back, ", styles::list_item_style()),
            Span::styled(name.to_string(), styles::title_style()),
        ]),
        Line::from(Span::styled(
            format!(
                "Here's what's happening on ScriptHive today, {}.",
                Local::now().format("%A %b %-d")
            ),
            styles::muted_style(),
        )),
        Line::from(""),
    ];

    match app.profile() {
        Some(profile) => {
            let avatar = match app.picture_url {
                Some(ref url) => url.clone(),
                None => format!("[{}]", initials(&profile.full_name)),
            };
            lines.push(Line::from(vec![
                Span::styled(profile.full_name.clone(), styles::highlight_style()),
                Span::styled(format!("  {}  ", profile.role), styles::muted_style()),
                Span::styled(avatar, styles::muted_style()),
            ]));
        }
        None => lines.push(Line::from(Span::styled(
            "Loading profile...",
            styles::muted_style(),
        ))),
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_card(frame: &mut Frame, label: &str, value: String, change: Option<f64>, area: Rect) {
    let mut lines = vec![
        Line::from(Span::styled(label.to_string(), styles::muted_style())),
        Line::from(Span::styled(value, styles::stat_value_style())),
    ];
    if let Some(change) = change {
        let style = if change < 0.0 {
            styles::error_style()
        } else {
            styles::success_style()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{:+.1}%", change), style),
            Span::styled(" vs last month", styles::muted_style()),
        ]));
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn chart_block(title: &str) -> Block<'static> {
    Block::default()
        .title(Span::styled(format!(" {} ", title), styles::title_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style(false))
}

/// "12.5k" style label that fits above a narrow bar.
fn compact_amount(amount: f64) -> String {
    if amount >= 1_000_000.0 {
        format!("{:.1}M", amount / 1_000_000.0)
    } else if amount >= 1_000.0 {
        format!("{:.1}k", amount / 1_000.0)
    } else {
        format!("{:.0}", amount)
    }
}

fn render_revenue_chart(frame: &mut Frame, stats: &DashboardStats, area: Rect) {
    let block = chart_block("Revenue Trend (KES)");
    if stats.revenue_by_month.is_empty() {
        let empty = Paragraph::new(Span::styled("No dated payments yet", styles::muted_style()));
        frame.render_widget(empty.block(block), area);
        return;
    }

    let bars: Vec<Bar> = stats
        .revenue_by_month
        .iter()
        .map(|m| {
            Bar::default()
                .value(m.amount.max(0.0).round() as u64)
                .text_value(compact_amount(m.amount))
                .label(Line::from(m.label()))
        })
        .collect();

    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .bar_width(6)
        .bar_gap(2)
        .bar_style(styles::highlight_style())
        .value_style(styles::selected_style());
    frame.render_widget(chart, area);
}

fn render_category_chart(frame: &mut Frame, stats: &DashboardStats, area: Rect) {
    let block = chart_block("Script Categories");
    if stats.categories.is_empty() {
        let empty = Paragraph::new(Span::styled("No scripts posted yet", styles::muted_style()));
        frame.render_widget(empty.block(block), area);
        return;
    }

    let bars: Vec<Bar> = stats
        .categories
        .iter()
        .map(|c| {
            Bar::default()
                .value(c.count as u64)
                .label(Line::from(truncate_string(&c.name, 12)))
        })
        .collect();

    let chart = BarChart::default()
        .block(block)
        .direction(Direction::Horizontal)
        .data(BarGroup::default().bars(&bars))
        .bar_width(1)
        .bar_gap(0)
        .bar_style(styles::highlight_style())
        .value_style(styles::selected_style());
    frame.render_widget(chart, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_amount() {
        assert_eq!(compact_amount(950.0), "950");
        assert_eq!(compact_amount(12_500.0), "12.5k");
        assert_eq!(compact_amount(2_300_000.0), "2.3M");
    }
}
