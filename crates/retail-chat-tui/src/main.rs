use std::sync::Arc;

use anyhow::Result;
use retail_chat_core::{Config, HttpAnsweringService, SubmissionController};

mod app;
mod charts;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, TICK_RATE};

#[tokio::main]
async fn main() -> Result<()> {
    // Logging is best effort; the client works without a log file
    let log_path = logging::init().ok();

    if let Err(e) = Config::init_file() {
        tracing::warn!(error = %e, "could not write default config");
    }
    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not read config, using defaults");
        Config::new()
    });

    let service = Arc::new(HttpAnsweringService::new(config.api_base_url()));
    let controller = SubmissionController::new(service).with_timeout(config.request_timeout());
    let mut app = App::new(controller, config.api_base_url());

    tracing::info!(
        api = config.api_base_url(),
        timeout_secs = config.request_timeout().as_secs(),
        log = ?log_path,
        "starting retail chat"
    );

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new(TICK_RATE);

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        app.sync_scroll();
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }
    Ok(())
}
