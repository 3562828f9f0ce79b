//! Interactive prompt loop.
//!
//! Input is read with rustyline; every line goes through
//! [`crate::commands::process_input`] and the resulting
//! [`CommandResult`] decides whether a turn is streamed. A process-wide
//! Ctrl+C handler forwards interrupts to the engine's cancellation
//! controller, so pressing it mid-answer stops the turn without leaving the
//! prompt. At the prompt itself rustyline reports the key instead.

use std::error::Error;
use std::io;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::debug;

use crate::api::models::{fetch_models, resolve_model_selector, sort_models};
use crate::api::ModelInfo;
use crate::cli::version::{client_line, version_lines};
use crate::commands::{process_input, CommandResult};
use crate::core::app::App;
use crate::core::engine::TurnReport;
use crate::core::error::SessionError;
use crate::ui::renderer::TerminalRenderer;

pub struct Repl {
    app: App,
    client: reqwest::Client,
    host: String,
    renderer: TerminalRenderer<io::Stdout>,
}

impl Repl {
    pub fn new(app: App, client: reqwest::Client, host: String, use_color: bool) -> Self {
        Self {
            app,
            client,
            host,
            renderer: TerminalRenderer::stdout(use_color),
        }
    }

    pub async fn run(mut self) -> Result<(), Box<dyn Error>> {
        let mut editor = DefaultEditor::new()?;

        let cancellation = self.app.engine.cancellation();
        ctrlc::set_handler(move || {
            if cancellation.request() {
                debug!("interrupt forwarded to the active turn");
            }
        })?;

        self.app.info(format!(
            "{} - type 'help' for commands, 'list' to see models",
            client_line()
        ));
        if let Some(model) = self.app.engine.context().model() {
            let line = format!("Using model: {model}");
            self.app.info(line);
        }
        self.flush_notices();

        loop {
            let prompt = format!("{}> ", self.app.prompt_label());
            match editor.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let _ = editor.add_history_entry(line);

                    let result = process_input(&mut self.app, line);
                    self.flush_notices();
                    if !self.dispatch(result).await {
                        break;
                    }
                    self.flush_notices();
                }
                Err(ReadlineError::Interrupted) => {
                    self.app.warn("Use 'exit' to quit");
                    self.flush_notices();
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err.into()),
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    /// Carries out the asynchronous part of a command. Returns `false` when
    /// the loop should end.
    async fn dispatch(&mut self, result: CommandResult) -> bool {
        match result {
            CommandResult::Continue => {}
            CommandResult::Exit => return false,
            CommandResult::ListModels => {
                if let Some(models) = self.load_models().await {
                    let active = self.app.engine.context().model().map(str::to_string);
                    if let Err(err) = self.renderer.model_table(&models, active.as_deref()) {
                        debug!(error = %err, "terminal write failed");
                    }
                }
            }
            CommandResult::RunModel(selector) => self.run_model(&selector).await,
            CommandResult::ShowVersion => {
                for line in version_lines(&self.client, &self.host).await {
                    self.app.info(line);
                }
            }
            CommandResult::Retry => {
                let outcome = self.app.engine.retry(&mut self.renderer).await;
                self.after_turn(outcome);
            }
            CommandResult::ProcessAsMessage(text) => {
                if self.app.engine.context().model().is_none() {
                    self.app
                        .warn("No model selected. Use 'list' and then 'run <number>' first.");
                    return true;
                }
                let outcome = self.app.engine.send(text, &mut self.renderer).await;
                self.after_turn(outcome);
            }
        }
        true
    }

    fn after_turn(&mut self, outcome: Result<TurnReport, SessionError>) {
        match outcome {
            Ok(report) if self.app.verbose => {
                if let Err(err) = self.renderer.report(&report) {
                    debug!(error = %err, "terminal write failed");
                }
            }
            Ok(_) => {}
            Err(err) => self.app.error(err.to_string()),
        }
    }

    async fn load_models(&mut self) -> Option<Vec<ModelInfo>> {
        match fetch_models(&self.client, &self.host).await {
            Ok(tags) => {
                let mut models = tags.models;
                sort_models(&mut models);
                Some(models)
            }
            Err(err) => {
                self.app
                    .error(format!("Could not list models from {}: {err}", self.host));
                None
            }
        }
    }

    async fn run_model(&mut self, selector: &str) {
        let Some(models) = self.load_models().await else {
            return;
        };
        if models.is_empty() {
            self.app.warn("No models available");
            return;
        }

        let Some(name) = resolve_model_selector(&models, selector) else {
            if selector.parse::<usize>().is_ok() {
                self.app.error(format!(
                    "Invalid model number. Please choose 1-{}",
                    models.len()
                ));
            } else {
                self.app
                    .error(format!("Model '{selector}' not found locally"));
            }
            return;
        };

        match self.app.engine.switch_model(name.clone()) {
            Ok(()) => {
                self.app.info(format!("Using model: {name}"));
                let kept = self.app.engine.context().len();
                if kept > 0 {
                    self.app
                        .info(format!("{kept} messages of history will be replayed"));
                }
            }
            Err(err) => self.app.error(err.to_string()),
        }
    }

    fn flush_notices(&mut self) {
        let notices = self.app.take_notices();
        if let Err(err) = self.renderer.notices(&notices) {
            debug!(error = %err, "terminal write failed");
        }
    }
}
