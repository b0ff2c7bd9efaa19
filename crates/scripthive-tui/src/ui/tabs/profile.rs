use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use scripthive_core::utils::{format_optional, initials};

use crate::app::{App, AppState, ProfileField};
use crate::ui::render::centered_rect_fixed;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    render_details(frame, app, chunks[0]);
    render_picture(frame, app, chunks[1]);
}

fn render_details(frame: &mut Frame, app: &App, area: Rect) {
    let editing = matches!(app.state, AppState::EditingProfile);

    let Some(profile) = app.profile() else {
        let block = Block::default()
            .title(" Profile ")
            .title_style(styles::title_style())
            .borders(Borders::ALL)
            .border_style(styles::border_style(true));
        let paragraph = Paragraph::new(Line::from(Span::styled(
            "Loading profile...",
            styles::muted_style(),
        )))
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    };

    let saved = profile.to_update();
    let shown = if editing { &app.profile_form } else { &saved };

    let mut lines = vec![Line::from("")];
    for field in ProfileField::ALL {
        let focused = editing && app.profile_focus == field;
        let value = field.value(shown);
        let text = if editing {
            format!("{}{}", value, if focused { "▌" } else { "" })
        } else {
            format_optional(Some(value), "-")
        };
        lines.push(Line::from(vec![
            Span::styled(format!("  {:<11}", field.label()), styles::highlight_style()),
            Span::styled(text, styles::input_style(focused)),
        ]));
    }
    lines.push(Line::from(vec![
        Span::styled(format!("  {:<11}", "Role"), styles::highlight_style()),
        Span::styled(profile.role.clone(), styles::muted_style()),
    ]));
    lines.push(Line::from(""));

    let hints = if editing {
        vec![
            Span::styled("  Enter", styles::help_key_style()),
            Span::styled(" save  ", styles::muted_style()),
            Span::styled("Tab", styles::help_key_style()),
            Span::styled(" next field  ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" cancel", styles::muted_style()),
        ]
    } else {
        vec![
            Span::styled("  e", styles::help_key_style()),
            Span::styled(" edit profile  ", styles::muted_style()),
            Span::styled("p", styles::help_key_style()),
            Span::styled(" upload picture", styles::muted_style()),
        ]
    };
    lines.push(Line::from(hints));

    let title = if editing { " Edit Profile " } else { " Profile " };
    let block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_picture(frame: &mut Frame, app: &App, area: Rect) {
    let name = app
        .profile()
        .map(|p| p.full_name.as_str())
        .or_else(|| app.session().map(|s| s.display_name()))
        .unwrap_or("");

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  [ {} ]", initials(name)),
            styles::title_style(),
        )),
        Line::from(""),
    ];
    match app.picture_url {
        Some(ref url) => lines.push(Line::from(Span::styled(
            url.clone(),
            styles::highlight_style(),
        ))),
        None => lines.push(Line::from(Span::styled(
            "No profile picture uploaded",
            styles::muted_style(),
        ))),
    }

    let block = Block::default()
        .title(" Picture ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// Prompt for the path of an image to upload.
pub fn render_picture_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(60, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  File: ", styles::muted_style()),
            Span::styled(format!("{}▌", app.picture_path), styles::selected_style()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Enter", styles::help_key_style()),
            Span::styled(" upload  ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .title(" Upload Profile Picture ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());
    frame.render_widget(Paragraph::new(lines).block(block), area);
}
