//! Non-interactive "say" command

use std::error::Error;
use std::sync::Arc;

use ratatui::crossterm::tty::IsTty;

use crate::core::app::App;
use crate::core::chat_stream::OllamaTransport;
use crate::core::config::Settings;
use crate::core::engine::TurnOutcome;
use crate::ui::renderer::TerminalRenderer;

/// Streams one answer to stdout. Exits non-zero when the turn does not
/// complete: 130 when interrupted, 1 on failure.
pub async fn run_say(
    prompt: &str,
    settings: &Settings,
    use_color: bool,
) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        eprintln!("Usage: matollama say <prompt>");
        std::process::exit(2);
    }
    if settings.model.is_none() {
        eprintln!("❌ No model selected");
        eprintln!("   Pass -m <model> or run 'matollama set default-model <model>'.");
        std::process::exit(1);
    }

    let transport = OllamaTransport::new(settings.host.clone(), settings.timeout)?;
    let mut app = App::from_settings(Arc::new(transport), settings)?;

    let cancellation = app.engine.cancellation();
    ctrlc::set_handler(move || {
        cancellation.request();
    })?;

    let mut renderer = TerminalRenderer::stdout(use_color);
    if !std::io::stdout().is_tty() {
        renderer = renderer.without_waiting_line();
    }
    let report = app.engine.send(prompt, &mut renderer).await?;
    match report.outcome {
        TurnOutcome::Completed => Ok(()),
        TurnOutcome::Cancelled => std::process::exit(130),
        TurnOutcome::Failed(_) => std::process::exit(1),
    }
}
