use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use scripthive_core::auth::{Navigation, Route};

use crate::app::{App, AppState, LoginFocus, ResetFocus, ResetStep};

use super::styles;
use super::tabs::{dashboard, limits, payments, profile, scripts, users};

const LOGO: [&str; 3] = [
    "╔═╗╔═╗╦═╗╦╔═╗╔╦╗╦ ╦╦╦  ╦╔═╗",
    "╚═╗║  ╠╦╝║╠═╝ ║ ╠═╣║╚╗╔╝║╣ ",
    "╚═╝╚═╝╩╚═╩╩   ╩ ╩ ╩╩ ╚╝ ╚═╝",
];

/// Field width inside the login and reset dialogs.
const FIELD_WIDTH: usize = 24;

pub fn render(frame: &mut Frame, app: &App) {
    if app.navigation == Navigation::Loading {
        render_loading_screen(frame);
        return;
    }

    match app.route {
        Route::Login => {
            render_login_screen(frame, app);
            if matches!(app.state, AppState::ResettingPassword) {
                render_reset_overlay(frame, app);
            }
        }
        Route::NotFound | Route::Root => render_not_found(frame, app),
        _ => render_portal(frame, app),
    }

    match app.state {
        AppState::EnteringPath => render_path_prompt(frame, app),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        _ => {}
    }
}

fn render_portal(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(3), // Tabs
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_tabs(frame, app, chunks[1]);
    render_main_content(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::ConfirmingLogout => render_logout_overlay(frame),
        AppState::ConfirmingDelete => render_delete_overlay(frame, app),
        AppState::EditingLimit => limits::render_form_overlay(frame, app),
        AppState::EnteringPicturePath => profile::render_picture_overlay(frame, app),
        _ => {}
    }
}

fn logo_lines(indent: usize) -> Vec<Line<'static>> {
    LOGO.iter()
        .map(|row| {
            Line::from(Span::styled(
                format!("{}{}", " ".repeat(indent), row),
                styles::title_style(),
            ))
        })
        .collect()
}

fn render_loading_screen(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 7, frame.area());
    let mut lines = logo_lines(8);
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Checking your session...",
        styles::muted_style(),
    )));

    let paragraph = Paragraph::new(lines).alignment(Alignment::Left);
    frame.render_widget(paragraph, area);
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  ScriptHive Admin";
    let user = app
        .session()
        .map(|s| format!("{} (@{})", s.display_name(), s.user_name))
        .unwrap_or_default();
    let help_hint = "[?] Help";

    let used = title.chars().count() + user.chars().count() + help_hint.len() + 6;
    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat((area.width as usize).saturating_sub(used))),
        Span::styled(user, styles::highlight_style()),
        Span::raw("   "),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::raw(" ")];
    for (i, route) in Route::NAVIGABLE.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        let label = format!("[{}] {}", i + 1, route.title());
        if *route == app.route {
            spans.push(Span::styled(label, styles::tab_style(true)));
        } else {
            spans.push(Span::styled(label, styles::muted_style()));
        }
    }

    let path = format!("{} ", app.route.path());
    let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
    spans.push(Span::raw(
        " ".repeat((area.width as usize).saturating_sub(used + path.len())),
    ));
    spans.push(Span::styled(path, styles::muted_style()));

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.route {
        Route::Dashboard => dashboard::render(frame, app, area),
        Route::Users => users::render(frame, app, area),
        Route::Scripts => scripts::render(frame, app, area),
        Route::Payments => payments::render(frame, app, area),
        Route::RegistrationLimits => limits::render(frame, app, area),
        Route::Profile => profile::render(frame, app, area),
        Route::Root | Route::Login | Route::NotFound => {}
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = "[r]efresh | [:]go to | [L]ogout | [q]uit";

    let (left_text, left_style) = match app.notice {
        Some(ref notice) => (format!(" {} ", notice.text), styles::notice_style(notice.kind)),
        None if app.view_loading => (" Loading...".to_string(), styles::muted_style()),
        None => (format!(" {} ", app.route.title()), styles::muted_style()),
    };
    let right_text = format!(" {} ", shortcuts);

    let width = area.width as usize;
    let padding_len = width
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.len());
    let status_line = Line::from(vec![
        Span::styled(left_text, left_style),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 28, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let mut help_text = logo_lines(11);
    help_text.push(Line::from(Span::styled(
        format!("               version {}", version),
        styles::muted_style(),
    )));
    help_text.extend([
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_line("1-6", "Switch views"),
        help_line("←/→", "Previous/next view"),
        help_line("↑/↓", "Move selection"),
        help_line("PgUp/PgDn", "Scroll a page"),
        help_line(":", "Go to a path (e.g. /users)"),
        Line::from(""),
        Line::from(Span::styled(" Actions", styles::highlight_style())),
        help_line("r", "Refresh the current view"),
        help_line("d", "Delete selected user or limit"),
        help_line("a / e", "Add / edit a limit"),
        help_line("Tab", "Switch limit table"),
        help_line("e / p", "Edit profile / upload picture"),
        help_line("L", "Log out"),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

/// Render a bracketed text field, masking its contents if asked.
fn field_line(label: &str, value: &str, focused: bool, masked: bool) -> Line<'static> {
    let shown: String = if masked {
        "*".repeat(value.chars().count().min(FIELD_WIDTH))
    } else {
        let count = value.chars().count();
        value.chars().skip(count.saturating_sub(FIELD_WIDTH)).collect()
    };
    let cursor = if focused { "▌" } else { " " };
    Line::from(vec![
        Span::styled(format!("  {:>9}: [", label), styles::muted_style()),
        Span::styled(
            format!("{:<width$}{}", shown, cursor, width = FIELD_WIDTH),
            styles::input_style(focused),
        ),
        Span::styled("]", styles::muted_style()),
    ])
}

fn button_line(label: &str, focused: bool, disabled: bool) -> Line<'static> {
    let style = if disabled {
        styles::muted_style()
    } else {
        styles::input_style(focused)
    };
    let text = if focused && !disabled {
        format!(" ▶ {} ◀ ", label)
    } else {
        format!("   {}   ", label)
    };
    Line::from(vec![
        Span::raw("              ["),
        Span::styled(text, style),
        Span::raw("]"),
    ])
}

fn render_login_screen(frame: &mut Frame, app: &App) {
    let mut height = 16;
    if app.login_error.is_some() {
        height += 2;
    }
    if app.notice.is_some() {
        height += 2;
    }
    let area = centered_rect_fixed(50, height, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = logo_lines(10);
    lines.push(Line::from(Span::styled(
        "                  Admin Portal",
        styles::muted_style(),
    )));
    lines.push(Line::from(""));

    lines.push(field_line(
        "Email",
        &app.login_email,
        app.login_focus == LoginFocus::Email,
        false,
    ));
    lines.push(field_line(
        "Password",
        &app.login_password,
        app.login_focus == LoginFocus::Password,
        true,
    ));
    lines.push(Line::from(""));

    let pending = app.login_pending();
    let label = if pending { "Signing in..." } else { "Sign In" };
    lines.push(button_line(
        label,
        app.login_focus == LoginFocus::Button,
        pending,
    ));
    lines.push(Line::from(""));

    let forgot_style = styles::input_style(app.login_focus == LoginFocus::Forgot);
    lines.push(Line::from(vec![
        Span::raw("             "),
        Span::styled("Forgot password?", forgot_style),
    ]));

    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )));
    }
    if let Some(ref notice) = app.notice {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", notice.text),
            styles::notice_style(notice.kind),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .title(" Sign In ")
        .title_style(styles::title_style());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_reset_overlay(frame: &mut Frame, app: &App) {
    let height = if app.reset_message.is_some() { 13 } else { 11 };
    let area = centered_rect_fixed(50, height, frame.area());
    frame.render_widget(Clear, area);

    let form = &app.reset_form;
    let mut lines = vec![Line::from("")];

    match app.reset_step {
        ResetStep::RequestOtp => {
            lines.push(Line::from(Span::styled(
                "  We'll email you a one-time password.",
                styles::muted_style(),
            )));
            lines.push(Line::from(""));
            lines.push(field_line(
                "Email",
                &form.email,
                app.reset_focus == ResetFocus::Email,
                false,
            ));
        }
        ResetStep::EnterOtp => {
            lines.push(Line::from(vec![
                Span::styled("  Code sent to ", styles::muted_style()),
                Span::styled(form.email.clone(), styles::highlight_style()),
            ]));
            lines.push(Line::from(""));
            lines.push(field_line(
                "OTP",
                &form.otp,
                app.reset_focus == ResetFocus::Otp,
                false,
            ));
            lines.push(field_line(
                "New pass",
                &form.new_password,
                app.reset_focus == ResetFocus::NewPassword,
                true,
            ));
        }
    }

    lines.push(Line::from(""));
    let pending = app.reset_pending();
    let label = match (app.reset_step, pending) {
        (_, true) => "Sending...",
        (ResetStep::RequestOtp, false) => "Send OTP",
        (ResetStep::EnterOtp, false) => "Reset Password",
    };
    lines.push(button_line(label, true, pending));

    if let Some(ref message) = app.reset_message {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", message.text),
            styles::notice_style(message.kind),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .title(" Reset Password [Esc to cancel] ")
        .title_style(styles::title_style());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_not_found(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(50, 10, frame.area());

    let home = if app.ctx.is_authenticated() {
        "dashboard"
    } else {
        "sign in"
    };
    let lines = vec![
        Line::from(Span::styled("404", styles::title_style())),
        Line::from(""),
        Line::from(Span::styled(
            "The page you are looking for does not exist.",
            styles::list_item_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Press ", styles::muted_style()),
            Span::styled("Enter", styles::help_key_style()),
            Span::styled(format!(" to go to {}, ", home), styles::muted_style()),
            Span::styled("q", styles::help_key_style()),
            Span::styled(" to quit", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(block);
    frame.render_widget(paragraph, area);
}

fn render_path_prompt(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let prompt_area = Rect::new(area.x, area.bottom().saturating_sub(1), area.width, 1);
    frame.render_widget(Clear, prompt_area);

    let line = Line::from(vec![
        Span::styled(":", styles::help_key_style()),
        Span::styled(format!("{}▌", app.path_input), styles::list_item_style()),
    ]);
    frame.render_widget(
        Paragraph::new(line).style(styles::status_bar_style()),
        prompt_area,
    );
}

/// Create a centered rectangle with fixed dimensions
pub fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

/// Yes/no dialog with a question under the logo.
fn render_confirm_overlay(frame: &mut Frame, question: String, confirm: &'static str) {
    let area = centered_rect_fixed(60, 10, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = logo_lines(15);
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("   {}", question),
        styles::highlight_style(),
    )));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("   Press ", styles::muted_style()),
        Span::styled("[Y]", styles::help_key_style()),
        Span::styled(format!(" to {}, ", confirm), styles::muted_style()),
        Span::styled("[N]", styles::help_key_style()),
        Span::styled(" to cancel", styles::muted_style()),
    ]));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_quit_overlay(frame: &mut Frame) {
    render_confirm_overlay(frame, "Are you sure you want to quit?".to_string(), "quit");
}

fn render_logout_overlay(frame: &mut Frame) {
    render_confirm_overlay(frame, "Log out of ScriptHive Admin?".to_string(), "log out");
}

fn render_delete_overlay(frame: &mut Frame, app: &App) {
    let target = app
        .pending_delete
        .as_ref()
        .map(|t| t.describe())
        .unwrap_or_default();
    render_confirm_overlay(frame, format!("Delete {}?", target), "delete");
}
