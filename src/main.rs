//! coinwatch - a searchable terminal watchlist for cryptocurrency prices.

mod actions;
mod api;
mod app;
mod cli;
mod command;
mod config;
mod export;
mod format;
mod models;
mod ui;

use anyhow::Result;
use app::{App, RefreshOutcome};
use cli::Args;
use config::{Config, Preferences};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::fs::{self, OpenOptions};
use std::io;
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "COINWATCH_LOG";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    let config = if let Some(ref path) = args.config {
        Config::load(path)?
    } else {
        Config::load_or_default()
    };

    let prefs = Preferences::resolve(&args, &config);

    if !prefs.has_tickers() {
        eprintln!("Error: No tickers to watch.");
        eprintln!("Provide tickers via -s flag or config file.");
        eprintln!();
        eprintln!("Example: coinwatch -s BTC,ETH,SOL");
        eprintln!();
        eprintln!("Or create a config file at {:?}", Config::default_config_path());
        eprintln!();
        eprintln!("Sample config:");
        eprintln!("{}", config::sample_config());
        std::process::exit(1);
    }

    init_tracing(args.batch);

    let mut app = App::new(&args, prefs)?;

    if app.batch_mode {
        run_batch(&mut app).await
    } else {
        run_interactive(&mut app).await
    }
}

/// Batch mode logs to stderr; the interactive view logs to a file so the
/// alternate screen isn't scribbled over.
fn init_tracing(batch: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    if batch {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .try_init();
        return;
    }

    let Some(dir) = dirs::cache_dir().map(|d| d.join("coinwatch")) else {
        return;
    };
    let file = fs::create_dir_all(&dir).and_then(|_| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("coinwatch.log"))
    });

    if let Ok(file) = file {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init();
    }
}

/// Run in batch mode (non-interactive).
async fn run_batch(app: &mut App) -> Result<()> {
    loop {
        app.refresh().await;
        ui::render_batch(app)?;
        app.dismiss_notice();

        if app.should_quit() {
            break;
        }

        tokio::time::sleep(app.prefs.refresh_interval).await;
    }

    Ok(())
}

/// Run in interactive mode with TUI.
async fn run_interactive(app: &mut App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, app).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Main application loop.
///
/// Refresh cycles run as tasks in a `JoinSet`; their outcomes are applied
/// here, so `App` has a single writer. Leaving the loop drops the set, which
/// aborts any cycle still in flight.
async fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_millis(100);
    let mut cycles: JoinSet<RefreshOutcome> = JoinSet::new();

    loop {
        if app.needs_refresh() {
            let request = app.begin_refresh();
            tracing::debug!(seq = request.seq(), in_flight = cycles.len(), "starting refresh");
            cycles.spawn(request.run());
        }

        while let Some(joined) = cycles.try_join_next() {
            match joined {
                Ok(outcome) => {
                    app.apply_refresh(outcome);
                }
                Err(e) => tracing::error!(error = %e, "refresh task failed"),
            }
        }

        terminal.draw(|f| ui::render(f, app))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key_event(app, key.code, key.modifiers);
                }
            }
        }

        if app.should_quit() {
            break;
        }
    }

    cycles.abort_all();
    Ok(())
}

/// Handle keyboard input.
fn handle_key_event(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    // Close help overlay on any key
    if app.show_help {
        app.show_help = false;
        return;
    }

    // Dismiss notice on any key
    if app.notice.is_some() {
        app.dismiss_notice();
        return;
    }

    if app.search_mode {
        match code {
            KeyCode::Esc => app.cancel_search(),
            KeyCode::Enter => app.finish_search(),
            KeyCode::Backspace => app.pop_search(),
            KeyCode::Up => app.select_up(),
            KeyCode::Down => app.select_down(),
            KeyCode::Char(c) => app.push_search(c),
            _ => {}
        }
        return;
    }

    match code {
        // Quit
        KeyCode::Char('q') => app.quit(),
        KeyCode::Esc if !app.search.is_empty() => app.cancel_search(),
        KeyCode::Esc => app.quit(),

        // Navigation
        KeyCode::Up | KeyCode::Char('k') => app.select_up(),
        KeyCode::Down | KeyCode::Char('j') => app.select_down(),
        KeyCode::Home | KeyCode::Char('g') => app.select_top(),
        KeyCode::End | KeyCode::Char('G') => app.select_bottom(),

        // Search
        KeyCode::Char('/') => app.start_search(),

        // Row actions
        KeyCode::Enter | KeyCode::Char('o') => app.open_selected(),
        KeyCode::Char('c') => app.copy_selected_price(),
        KeyCode::Char('y') => app.copy_selected_symbol(),

        // Display
        KeyCode::Char('h') | KeyCode::Char('?') => app.toggle_help(),

        // Refresh
        KeyCode::Char(' ') | KeyCode::Char('R') => app.force_refresh(),

        _ => {}
    }
}
