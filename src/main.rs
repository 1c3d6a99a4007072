mod app;
mod clipboard;
mod config;
mod event;
mod form;
mod store;
mod theme;
mod toast;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self as term_event, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app::{App, Popup, Section};
use clipboard::SystemClipboard;
use config::AppConfig;
use store::storage::{FileStorage, KeyValueStorage, MemoryStorage};
use store::VerseStore;

#[derive(Parser, Debug)]
#[command(name = "versekeep")]
#[command(version = "0.1.0")]
#[command(about = "A terminal-friendly keeper for your favourite bible verses")]
struct Args {
    /// Print the verse list as JSON and exit
    #[arg(short, long)]
    list: bool,

    /// Only list verses with this exact theme (with --list)
    #[arg(short, long, requires = "list")]
    theme: Option<String>,

    /// Print the distinct themes, one per line
    #[arg(long)]
    themes: bool,

    /// Copy the verse at this position (0 = newest) to the clipboard
    #[arg(short, long, value_name = "INDEX")]
    copy: Option<usize>,

    /// Directory holding verses.json
    #[arg(long, value_name = "PATH")]
    data_dir: Option<PathBuf>,
}

impl Args {
    fn is_cli_only(&self) -> bool {
        self.list || self.themes || self.copy.is_some()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let (config, config_error) = AppConfig::load();

    let data_dir = args
        .data_dir
        .clone()
        .or_else(|| config.data_dir.clone())
        .or_else(FileStorage::default_dir);

    init_logging(&args, data_dir.as_ref());

    if let Some(e) = config_error {
        tracing::warn!("{:#}; using default settings", e);
    }

    let storage = open_storage(data_dir);

    // Handle CLI-only commands
    if args.list {
        return print_list(storage, args.theme.as_deref());
    }

    if args.themes {
        return print_themes(storage);
    }

    if let Some(index) = args.copy {
        return copy_verse(storage, index, &config).await;
    }

    // Run TUI
    run_tui(&config, storage).await
}

/// TUI mode logs to a file in the data dir; CLI modes log to stderr
fn init_logging(args: &Args, data_dir: Option<&PathBuf>) {
    let log_file = if args.is_cli_only() {
        None
    } else {
        data_dir.and_then(|dir| {
            std::fs::create_dir_all(dir).ok()?;
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join("versekeep.log"))
                .ok()
        })
    };

    match log_file {
        Some(file) => tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file)),
            )
            .with(tracing_subscriber::EnvFilter::from_default_env())
            .init(),
        None if args.is_cli_only() => tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .with(tracing_subscriber::EnvFilter::from_default_env())
            .init(),
        // Nowhere safe to write while the TUI owns the terminal
        None => {}
    }
}

fn open_storage(data_dir: Option<PathBuf>) -> Box<dyn KeyValueStorage> {
    match data_dir {
        Some(dir) => {
            tracing::debug!("Using data directory {}", dir.display());
            Box::new(FileStorage::new(dir))
        }
        None => {
            tracing::warn!("No data directory available, verses will not be saved");
            Box::new(MemoryStorage::new())
        }
    }
}

fn print_list(storage: Box<dyn KeyValueStorage>, theme: Option<&str>) -> Result<()> {
    let mut store = VerseStore::load(storage);
    if let Some(theme) = theme {
        store.filter_by_theme(theme);
    }

    let verses: Vec<&store::Verse> = store.displayed().into_iter().map(|(_, v)| v).collect();
    println!("{}", serde_json::to_string_pretty(&verses)?);
    Ok(())
}

fn print_themes(storage: Box<dyn KeyValueStorage>) -> Result<()> {
    let store = VerseStore::load(storage);
    for theme in store.distinct_themes() {
        println!("{}", theme);
    }
    Ok(())
}

async fn copy_verse(storage: Box<dyn KeyValueStorage>, index: usize, config: &AppConfig) -> Result<()> {
    let store = VerseStore::load(storage);
    let verse = store
        .get(index)
        .with_context(|| format!("No verse at position {} ({} saved)", index, store.len()))?;

    let text = clipboard::format_verse(verse);
    let writer = tokio::task::spawn_blocking(SystemClipboard::open).await??;
    println!("{}", text);

    if config.notifications {
        notify_copied(&verse.reference(), notify);
    }

    if cfg!(target_os = "linux") {
        eprintln!("Holding the clipboard until something else is copied (Ctrl+C to stop)");
    }
    clipboard::write_and_hold(Arc::new(writer), text).await?;
    Ok(())
}

/// A failed notification never fails the copy
fn notify_copied(reference: &str, send: impl FnOnce(&str, &str) -> Result<()>) {
    if let Err(e) = send("versekeep", &format!("Copied {}", reference)) {
        tracing::warn!("Desktop notification failed: {:#}", e);
    }
}

async fn run_tui(config: &AppConfig, storage: Box<dyn KeyValueStorage>) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app state
    let mut app = App::new(config, storage, Arc::new(SystemClipboard::new()));

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Tear down the surface; dropping the app cancels a pending toast timer
    drop(app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if term_event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = term_event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') if app.popup == Popup::None && app.section == Section::List => {
                            return Ok(())
                        }
                        KeyCode::Char('c') if key.modifiers.contains(term_event::KeyModifiers::CONTROL) => {
                            return Ok(())
                        }
                        _ => {
                            // Handle key and catch any errors to prevent crashes
                            if let Err(e) = app.handle_key(key) {
                                tracing::error!("Key handling failed: {:#}", e);
                            }
                        }
                    }
                }
            }
        }

        // Let timer and clipboard tasks make progress between polls
        tokio::task::yield_now().await;
        app.tick();
    }
}

fn notify(summary: &str, body: &str) -> Result<()> {
    notify_rust::Notification::new()
        .summary(summary)
        .body(body)
        .icon("accessories-text-editor")
        .show()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_notify_copied_sends_reference() {
        let sent = RefCell::new(Vec::new());
        notify_copied("John 3:16", |summary, body| {
            sent.borrow_mut().push((summary.to_string(), body.to_string()));
            Ok(())
        });
        assert_eq!(
            sent.into_inner(),
            [("versekeep".to_string(), "Copied John 3:16".to_string())]
        );
    }

    #[test]
    fn test_notify_copied_swallows_failure() {
        let mut called = false;
        notify_copied("John 3:16", |_, _| {
            called = true;
            Err(anyhow::anyhow!("no notification daemon"))
        });
        assert!(called);
    }

    #[test]
    fn test_theme_requires_list() {
        assert!(Args::try_parse_from(["versekeep", "--theme", "Love"]).is_err());
        let args = Args::try_parse_from(["versekeep", "--list", "--theme", "Love"]).unwrap();
        assert!(args.is_cli_only());
    }
}
