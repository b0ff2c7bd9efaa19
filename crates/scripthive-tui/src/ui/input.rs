//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes. Anything that talks to the API is spawned by
//! `App`, so handlers here never block.

use crossterm::event::{KeyCode, KeyEvent};

use scripthive_core::auth::{Navigation, Route};
use scripthive_core::forms::{can_add_char, FieldKind};

use crate::app::{
    App, AppState, LimitFocus, LoginFocus, ProfileField, ResetFocus, ResetStep, PAGE_SCROLL_SIZE,
};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> bool {
    // Nothing is interactive until the stored session has been read
    if app.navigation == Navigation::Loading {
        if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
            app.state = AppState::Quitting;
            return true;
        }
        return false;
    }

    match app.state {
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            return false;
        }
        AppState::ConfirmingQuit => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.state = AppState::Quitting;
                    return true;
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return false;
        }
        AppState::ConfirmingLogout => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.logout(),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return false;
        }
        AppState::ConfirmingDelete => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => app.delete_confirmed(),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.pending_delete = None;
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return false;
        }
        AppState::EnteringPath => {
            handle_path_input(app, key);
            return false;
        }
        AppState::ResettingPassword => {
            handle_reset_input(app, key);
            return false;
        }
        AppState::EditingLimit => {
            handle_limit_form_input(app, key);
            return false;
        }
        AppState::EditingProfile => {
            handle_profile_edit_input(app, key);
            return false;
        }
        AppState::EnteringPicturePath => {
            match key.code {
                KeyCode::Esc => app.state = AppState::Normal,
                KeyCode::Enter => app.submit_picture_upload(),
                _ => {
                    edit_text(&mut app.picture_path, FieldKind::Text, key);
                }
            }
            return false;
        }
        AppState::Quitting => return true,
        AppState::Normal => {}
    }

    if app.route == Route::Login {
        return handle_login_input(app, key);
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
            return false;
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
            return false;
        }
        KeyCode::Char(c @ '1'..='6') => {
            let index = c as usize - '1' as usize;
            app.go_to(Route::NAVIGABLE[index]);
            return false;
        }
        KeyCode::Left => {
            app.go_to(app.route.prev());
            return false;
        }
        KeyCode::Right => {
            app.go_to(app.route.next());
            return false;
        }
        KeyCode::Char('r') => {
            app.refresh();
            return false;
        }
        KeyCode::Char('L') => {
            app.state = AppState::ConfirmingLogout;
            return false;
        }
        KeyCode::Char(':') => {
            app.open_path_prompt();
            return false;
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.move_selection(-1);
            return false;
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.move_selection(1);
            return false;
        }
        KeyCode::PageUp => {
            app.move_selection(-(PAGE_SCROLL_SIZE as isize));
            return false;
        }
        KeyCode::PageDown => {
            app.move_selection(PAGE_SCROLL_SIZE as isize);
            return false;
        }
        KeyCode::Home => {
            app.select_first();
            return false;
        }
        KeyCode::End => {
            app.select_last();
            return false;
        }
        _ => {}
    }

    // View-specific keys
    match app.route {
        Route::Users => {
            if key.code == KeyCode::Char('d') {
                app.confirm_delete_user();
            }
        }
        Route::RegistrationLimits => match key.code {
            KeyCode::Tab | KeyCode::BackTab => app.switch_limits_table(),
            KeyCode::Char('a') => app.start_add_limit(),
            KeyCode::Char('e') => app.start_edit_limit(),
            KeyCode::Char('d') => app.confirm_delete_limit(),
            _ => {}
        },
        Route::Profile => match key.code {
            KeyCode::Char('e') => app.start_edit_profile(),
            KeyCode::Char('p') => app.start_picture_upload(),
            _ => {}
        },
        Route::NotFound | Route::Root => {
            if key.code == KeyCode::Enter {
                app.navigate("/");
            }
        }
        _ => {}
    }

    false
}

/// Apply an editing key to a text buffer. Returns true if the key was used.
fn edit_text(buf: &mut String, kind: FieldKind, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Backspace => {
            buf.pop();
            true
        }
        KeyCode::Char(c) => {
            if can_add_char(kind, buf.chars().count(), c) {
                buf.push(c);
            }
            true
        }
        _ => false,
    }
}

fn handle_login_input(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc => {
            // Quit if on login screen
            app.state = AppState::Quitting;
            return true;
        }
        KeyCode::Down | KeyCode::Tab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Email => LoginFocus::Password,
                LoginFocus::Password => LoginFocus::Button,
                LoginFocus::Button => LoginFocus::Forgot,
                LoginFocus::Forgot => LoginFocus::Email,
            };
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Email => LoginFocus::Forgot,
                LoginFocus::Password => LoginFocus::Email,
                LoginFocus::Button => LoginFocus::Password,
                LoginFocus::Forgot => LoginFocus::Button,
            };
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Email => app.login_focus = LoginFocus::Password,
            LoginFocus::Password | LoginFocus::Button => {
                if !app.login_pending() {
                    app.submit_login();
                }
            }
            LoginFocus::Forgot => app.open_reset_dialog(),
        },
        _ => match app.login_focus {
            LoginFocus::Email => {
                edit_text(&mut app.login_email, FieldKind::Email, key);
            }
            LoginFocus::Password => {
                edit_text(&mut app.login_password, FieldKind::Password, key);
            }
            LoginFocus::Button | LoginFocus::Forgot => {}
        },
    }
    false
}

fn handle_reset_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_reset_dialog(),
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Down | KeyCode::Up => {
            if app.reset_step == ResetStep::EnterOtp {
                app.reset_focus = match app.reset_focus {
                    ResetFocus::Otp => ResetFocus::NewPassword,
                    ResetFocus::NewPassword | ResetFocus::Email => ResetFocus::Otp,
                };
            }
        }
        KeyCode::Enter => {
            if app.reset_pending() {
                return;
            }
            if app.reset_focus == ResetFocus::Otp {
                app.reset_focus = ResetFocus::NewPassword;
            } else {
                app.submit_reset_step();
            }
        }
        _ => {
            let (buf, kind) = match app.reset_focus {
                ResetFocus::Email => (&mut app.reset_form.email, FieldKind::Email),
                ResetFocus::Otp => (&mut app.reset_form.otp, FieldKind::Otp),
                ResetFocus::NewPassword => (&mut app.reset_form.new_password, FieldKind::Password),
            };
            edit_text(buf, kind, key);
        }
    }
}

fn handle_path_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.path_input.clear();
            app.state = AppState::Normal;
        }
        KeyCode::Enter => app.submit_path_prompt(),
        _ => {
            edit_text(&mut app.path_input, FieldKind::Email, key);
        }
    }
}

fn handle_limit_form_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_limit_form(),
        KeyCode::Enter => app.submit_limit_form(),
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
            app.limit_focus = match app.limit_focus {
                LimitFocus::Role => LimitFocus::Amount,
                LimitFocus::Amount => LimitFocus::Role,
            };
        }
        _ => match app.limit_focus {
            LimitFocus::Role => {
                if matches!(key.code, KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')) {
                    app.limit_form.cycle_role();
                }
            }
            LimitFocus::Amount => {
                edit_text(&mut app.limit_form.amount, FieldKind::Amount, key);
            }
        },
    }
}

fn handle_profile_edit_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_edit_profile(),
        KeyCode::Enter => app.save_profile(),
        KeyCode::Tab | KeyCode::Down => app.profile_focus = app.profile_focus.next(),
        KeyCode::BackTab | KeyCode::Up => app.profile_focus = app.profile_focus.prev(),
        _ => {
            let field = app.profile_focus;
            let kind = match field {
                ProfileField::Email => FieldKind::Email,
                _ => FieldKind::Text,
            };
            edit_text(field.value_mut(&mut app.profile_form), kind, key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use scripthive_core::api::ApiClient;
    use scripthive_core::auth::{AuthContext, MemoryStorage, Session, SessionStore, Storage};
    use scripthive_core::config::Config;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_input(app, key(KeyCode::Char(c)));
        }
    }

    fn app_with(storage: MemoryStorage) -> App {
        let api = ApiClient::new("http://127.0.0.1:9").unwrap();
        let ctx = AuthContext::new(api, Storage::Memory(storage));
        let config_path = std::env::temp_dir()
            .join(format!("scripthive-input-test-{}", std::process::id()))
            .join("config.json");
        App::new(Config::at(config_path), ctx)
    }

    fn logged_in_app() -> App {
        let storage = MemoryStorage::new();
        let session = Session {
            token: "abc123".to_string(),
            user_id: 7,
            full_name: "Ada Admin".to_string(),
            user_name: "ada".to_string(),
        };
        SessionStore::new(storage.clone()).save(&session).unwrap();
        let mut app = app_with(storage);
        app.bootstrap("/");
        app
    }

    #[test]
    fn test_q_quits_while_loading() {
        let mut app = app_with(MemoryStorage::new());
        assert!(handle_input(&mut app, key(KeyCode::Char('q'))));
    }

    #[tokio::test]
    async fn test_login_typing_and_focus() {
        let mut app = app_with(MemoryStorage::new());
        app.login_email.clear();
        app.bootstrap("/login");
        assert_eq!(app.login_focus, LoginFocus::Email);

        type_text(&mut app, "a b@c.com");
        // Whitespace is not accepted in the email field
        assert_eq!(app.login_email, "ab@c.com");

        handle_input(&mut app, key(KeyCode::Enter));
        assert_eq!(app.login_focus, LoginFocus::Password);
        type_text(&mut app, "pw");
        handle_input(&mut app, key(KeyCode::Backspace));
        assert_eq!(app.login_password, "p");

        handle_input(&mut app, key(KeyCode::BackTab));
        handle_input(&mut app, key(KeyCode::BackTab));
        assert_eq!(app.login_focus, LoginFocus::Forgot);
        handle_input(&mut app, key(KeyCode::Enter));
        assert_eq!(app.state, AppState::ResettingPassword);
        assert_eq!(app.reset_form.email, "ab@c.com");

        handle_input(&mut app, key(KeyCode::Esc));
        assert_eq!(app.state, AppState::Normal);
    }

    #[tokio::test]
    async fn test_digit_keys_switch_views() {
        let mut app = logged_in_app();
        handle_input(&mut app, key(KeyCode::Char('2')));
        assert_eq!(app.route, Route::NAVIGABLE[1]);
        handle_input(&mut app, key(KeyCode::Char('1')));
        assert_eq!(app.route, Route::NAVIGABLE[0]);
    }

    #[tokio::test]
    async fn test_logout_requires_confirmation() {
        let mut app = logged_in_app();
        handle_input(&mut app, key(KeyCode::Char('L')));
        assert_eq!(app.state, AppState::ConfirmingLogout);
        handle_input(&mut app, key(KeyCode::Char('n')));
        assert!(app.session().is_some());

        handle_input(&mut app, key(KeyCode::Char('L')));
        handle_input(&mut app, key(KeyCode::Char('y')));
        assert!(app.session().is_none());
        assert_eq!(app.route, Route::Login);
    }

    #[tokio::test]
    async fn test_path_prompt_navigates() {
        let mut app = logged_in_app();
        handle_input(&mut app, key(KeyCode::Char(':')));
        assert_eq!(app.state, AppState::EnteringPath);
        type_text(&mut app, "users");
        handle_input(&mut app, key(KeyCode::Enter));
        assert_eq!(app.route, Route::Users);
    }

    #[tokio::test]
    async fn test_limit_form_keys() {
        let mut app = logged_in_app();
        app.go_to(Route::RegistrationLimits);
        handle_input(&mut app, key(KeyCode::Char('a')));
        assert_eq!(app.state, AppState::EditingLimit);

        handle_input(&mut app, key(KeyCode::Char(' ')));
        assert!(app.limit_form.role.is_some());
        handle_input(&mut app, key(KeyCode::Tab));
        type_text(&mut app, "12x5");
        assert_eq!(app.limit_form.amount, "125");

        handle_input(&mut app, key(KeyCode::Esc));
        assert_eq!(app.state, AppState::Normal);
        assert!(app.limit_form.role.is_none());
    }

    #[test]
    fn test_edit_text_respects_field_kind() {
        let mut otp = String::new();
        edit_text(&mut otp, FieldKind::Otp, key(KeyCode::Char('4')));
        edit_text(&mut otp, FieldKind::Otp, key(KeyCode::Char('-')));
        assert_eq!(otp, "4");
        assert!(!edit_text(&mut otp, FieldKind::Otp, key(KeyCode::Enter)));
    }
}
