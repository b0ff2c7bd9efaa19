//! ScriptHive Admin - a terminal admin portal for the ScriptHive marketplace.
//!
//! This application provides a keyboard-driven interface for signing in as an
//! administrator and managing users, scripts, payments and registration fees.

mod app;
mod ui;

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use scripthive_core::api::ApiClient;
use scripthive_core::auth::AuthContext;
use scripthive_core::config::Config;
use scripthive_core::forms::LoginForm;

use app::{App, AppState, Context};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file name prefix inside the log directory
const LOG_FILE_PREFIX: &str = "scripthive.log";

/// What to do instead of (or before) opening the terminal UI.
#[derive(Debug, Default, PartialEq, Eq)]
struct Cli {
    login: bool,
    logout: bool,
    whoami: bool,
    /// Keep the session in memory only.
    ephemeral: bool,
    /// Path to show first, as typed at the `:` prompt.
    open: Option<String>,
}

impl Cli {
    fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self> {
        let mut cli = Cli::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--login" => cli.login = true,
                "--logout" => cli.logout = true,
                "--whoami" => cli.whoami = true,
                "--ephemeral" => cli.ephemeral = true,
                "--open" => match args.next() {
                    Some(path) => cli.open = Some(path),
                    None => bail!("--open needs a path, e.g. --open /users"),
                },
                other => bail!("Unknown argument: {}", other),
            }
        }
        Ok(cli)
    }
}

/// Initialize logging to a daily rolling file. Stderr would draw over the
/// terminal UI. Use RUST_LOG to control the level (e.g. RUST_LOG=debug).
fn init_tracing(log_dir: &Path) -> WorkerGuard {
    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse(std::env::args().skip(1))?;

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: could not read config ({}), using defaults", e);
            Config::default()
        }
    };

    let _log_guard = match config.data_dir() {
        Ok(dir) => Some(init_tracing(&dir.join("logs"))),
        Err(e) => {
            eprintln!("Warning: logging disabled: {}", e);
            None
        }
    };
    info!(base_url = %config.base_url(), "ScriptHive admin starting");

    let storage = config.open_storage(cli.ephemeral)?;
    let api = ApiClient::new(config.base_url())?;
    let mut ctx: Context = AuthContext::new(api, storage);

    if cli.login || cli.logout || cli.whoami {
        ctx.bootstrap();
        return run_command(&cli, config, &mut ctx).await;
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, ctx);

    // Show the loading screen while the stored session is read
    terminal.draw(|f| render(f, &app))?;
    app.bootstrap(cli.open.as_deref().unwrap_or("/"));

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("ScriptHive admin shutting down");
    Ok(())
}

/// Non-interactive session commands.
async fn run_command(cli: &Cli, mut config: Config, ctx: &mut Context) -> Result<()> {
    if cli.logout {
        ctx.logout();
        eprintln!("Signed out.");
    }

    if cli.login {
        let email = prompt_email(config.last_email.as_deref())?;
        let password = rpassword::prompt_password("Password: ")?;
        let form = LoginForm::new(email.clone(), password);

        match ctx.login(&form).await {
            Ok(_) => {
                let name = ctx.session().map(|s| s.display_name()).unwrap_or("Admin");
                eprintln!("Signed in as {}.", name);
                config.last_email = Some(email);
                if let Err(e) = config.save() {
                    warn!(error = %e, "Failed to save config");
                }
            }
            Err(e) => bail!("{}", e.user_message()),
        }
    }

    if cli.whoami {
        let Some(session) = ctx.session().cloned() else {
            bail!("Not signed in. Run with --login first.");
        };
        let profile = match ctx.profile().await {
            Ok(profile) => Some(profile),
            Err(e) => {
                eprintln!("Could not fetch profile: {}", e.user_message());
                None
            }
        };
        let output = serde_json::json!({
            "userId": session.user_id,
            "fullName": session.full_name,
            "userName": session.user_name,
            "profile": profile,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    Ok(())
}

/// Read the email from stdin, offering the last one used as a default.
fn prompt_email(last: Option<&str>) -> Result<String> {
    match last {
        Some(last) => eprint!("Email [{}]: ", last),
        None => eprint!("Email: "),
    }
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let email = line.trim();
    match (email.is_empty(), last) {
        (true, Some(last)) => Ok(last.to_string()),
        _ => Ok(email.to_string()),
    }
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key) {
                    return Ok(());
                }
            }
        }

        // Check for completed background tasks
        app.check_background_tasks();

        // Check if we should quit
        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_cli_parse() {
        assert_eq!(Cli::parse(args(&[])).unwrap(), Cli::default());

        let cli = Cli::parse(args(&["--ephemeral", "--open", "/users"])).unwrap();
        assert!(cli.ephemeral);
        assert_eq!(cli.open.as_deref(), Some("/users"));
        assert!(!cli.login);

        let cli = Cli::parse(args(&["--logout", "--login"])).unwrap();
        assert!(cli.login && cli.logout);
    }

    #[test]
    fn test_cli_rejects_bad_arguments() {
        assert!(Cli::parse(args(&["--open"])).is_err());
        assert!(Cli::parse(args(&["--frobnicate"])).is_err());
    }
}
