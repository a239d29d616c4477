mod app;
mod clipboard;
mod handler;
mod tui;
mod ui;

use std::fs::{self, OpenOptions};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use pagegrab_core::{Config, ElementPicker, RunMode};

use crate::app::App;
use crate::clipboard::ClipboardPicker;
use crate::tui::{EventHandler, Tui};

const CLIPBOARD_POLL: Duration = Duration::from_millis(400);

#[derive(Parser)]
#[command(name = "pagegrab")]
#[command(about = "Terminal panel for sending element change requests to a local OpenCode server")]
struct Cli {
    /// Enable editing (same as PAGEGRAB_MODE=development)
    #[arg(long)]
    dev: bool,
    /// Endpoint to post change requests to
    #[arg(long)]
    endpoint: Option<String>,
    /// Don't watch the clipboard; selections can still be pasted
    #[arg(long)]
    no_clipboard: bool,
}

/// Log to a file under the cache dir; the terminal belongs to the panel
fn init_logging() {
    let Some(dir) = dirs::cache_dir().map(|p| p.join("pagegrab")) else {
        return;
    };
    if fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(dir.join("tui.log")) else {
        return;
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let mut config = Config::load()?;
    if cli.dev {
        config.mode = RunMode::Development;
    }
    if let Some(endpoint) = cli.endpoint {
        config.endpoint_url = endpoint;
    }

    let picker: Option<Box<dyn ElementPicker>> = if config.mode.is_development() && !cli.no_clipboard {
        ClipboardPicker::spawn(CLIPBOARD_POLL).map(|p| Box::new(p) as Box<dyn ElementPicker>)
    } else {
        None
    };

    let mut app = App::new(&config, picker);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(frame, app))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }
    Ok(())
}
