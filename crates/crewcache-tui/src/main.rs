//! crewcache - a terminal admin console for workforce management.
//!
//! All management screens work from locally cached snapshots of the
//! hosted data store: one bulk fetch per collection, with search and
//! pagination served from memory.

mod app;
mod ui;
mod utils;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crewcache_core::api::StoreClient;
use crewcache_core::auth::{CredentialStore, Session};
use crewcache_core::config::Config;
use crewcache_core::models::{plan_auto_absent, Role};

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Initialize tracing into a log file - the terminal belongs to the UI.
/// The guard must stay alive for the duration of the process.
fn init_tracing(log_dir: &Path) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    // RUST_LOG controls the level (e.g. RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let appender = tracing_appender::rolling::never(log_dir, "crewcache.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    Some(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = Config::load().unwrap_or_default();
    let log_dir = config
        .cache_dir()
        .unwrap_or_else(|_| PathBuf::from("./cache"));
    std::fs::create_dir_all(&log_dir).ok();
    let _guard = init_tracing(&log_dir);

    // Headless subcommand: run the auto-absent sweep and exit
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "--sweep-absent" {
        return sweep_absent(args.get(2).cloned()).await;
    }

    info!("crewcache starting");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app
    let app = App::new();
    let mut app = match app {
        Ok(app) => app,
        Err(e) => {
            // Restore the terminal before reporting a startup failure
            disable_raw_mode()?;
            execute!(
                terminal.backend_mut(),
                LeaveAlternateScreen,
                DisableMouseCapture
            )?;
            terminal.show_cursor()?;
            eprintln!("Error: {}", e);
            return Ok(());
        }
    };

    // Load cached data first (for display behind login)
    app.load_from_cache();

    // Check if we need to login
    if !app.is_authenticated() {
        app.start_login();
    } else if app.is_cache_stale() {
        app.refresh_all_background();
    }

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

    info!("crewcache shutting down");
    Ok(())
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
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
                {
                    return Ok(());
                }

                if handle_input(app, key).await? {
                    return Ok(());
                }
            }
        }

        // Check for completed background tasks
        app.check_background_tasks();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}

// ============================================================================
// Headless auto-absent sweep
// ============================================================================

/// Mark every regular employee without an attendance row as absent for the
/// given date (default: yesterday). Designed to run from cron.
async fn sweep_absent(date_arg: Option<String>) -> Result<()> {
    let config = Config::load().unwrap_or_default();
    let store_url = config.resolved_store_url().ok_or_else(|| {
        anyhow::anyhow!("Store connection not configured. Set CREWCACHE_STORE_URL")
    })?;
    let store_key = config
        .resolved_store_key()
        .ok_or_else(|| anyhow::anyhow!("Store key not configured. Set CREWCACHE_STORE_KEY"))?;

    let cache_dir = config
        .cache_dir()
        .unwrap_or_else(|_| PathBuf::from("./cache"));
    let mut session = Session::new(cache_dir);
    let _ = session.load();

    let mut store = StoreClient::new(&store_url, &store_key)?;
    match session.data.clone().filter(|d| !d.is_expired()) {
        Some(data) => store.set_token(data.token),
        None => {
            let data = login_interactive(&store, &config).await?;
            session.update(data.clone());
            session.save()?;
            store.set_token(data.token);
        }
    }

    let date = match date_arg {
        Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map_err(|_| anyhow::anyhow!("Invalid date {:?}, expected YYYY-MM-DD", s))?,
        None => (Utc::now() - chrono::Duration::days(1)).date_naive(),
    };

    eprintln!("Checking attendance for {}...", date);
    let employees = store.fetch_users(Role::Employee).await?;
    let existing = store.fetch_attendance_on(date).await?;
    let planned = plan_auto_absent(&employees, &existing, date);

    if planned.is_empty() {
        println!("All {} employees already have records for {}", employees.len(), date);
        return Ok(());
    }

    store.insert_attendance(&planned).await?;
    println!("Marked {} employees absent for {}", planned.len(), date);
    Ok(())
}

/// Prompt for credentials on the terminal (used by the headless path only).
async fn login_interactive(
    store: &StoreClient,
    config: &Config,
) -> Result<crewcache_core::auth::SessionData> {
    let username = if let Some(ref last_user) = config.last_username {
        print!("Username [{}]: ", last_user);
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim();

        if input.is_empty() {
            last_user.clone()
        } else {
            input.to_string()
        }
    } else {
        print!("Username: ");
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        input.trim().to_string()
    };

    let password = if CredentialStore::has_credentials(&username) {
        print!("Use stored password? [Y/n]: ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if input.trim().to_lowercase() != "n" {
            CredentialStore::get_password(&username)?
        } else {
            rpassword::prompt_password("Password: ")?
        }
    } else {
        rpassword::prompt_password("Password: ")?
    };

    eprintln!("Authenticating...");
    let data = store.authenticate(&username, &password).await?;

    if let Err(e) = CredentialStore::store(&username, &password) {
        eprintln!("Warning: could not store credentials: {}", e);
    }

    Ok(data)
}
