//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod model_list;
pub mod say;
pub mod settings;
pub mod version;

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use ratatui::crossterm::tty::IsTty;

use crate::cli::model_list::list_models;
use crate::cli::say::run_say;
use crate::cli::settings::{describe_all, set_value, unset_value, SettingError};
use crate::cli::version::print_version;
use crate::core::app::App;
use crate::core::chat_stream::OllamaTransport;
use crate::core::config::data::path_display;
use crate::core::config::{Config, Overrides, Settings};
use crate::ui::repl::Repl;
use crate::utils::logging::init_tracing;

#[derive(Parser)]
#[command(name = "matollama")]
#[command(version)]
#[command(about = "A terminal chat client for local Ollama servers")]
#[command(
    long_about = "MatOllama streams chat answers from an Ollama server, showing a model's \
reasoning separately from its answer. Conversations can be saved, loaded and continued \
with a different model.\n\n\
Controls:\n\
  Ctrl+C            Stop the answer being generated\n\
  Ctrl+D / exit     Quit\n\n\
Commands (inside chat):\n\
  list, run <n>     Pick a model\n\
  save / load       Keep a conversation for later\n\
  help              Show all commands\n\n\
Environment:\n\
  MATOLLAMA_LOG     Log filter, e.g. 'debug' or 'matollama=trace' (default: warn)"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Ollama server URL (overrides the config file)
    #[arg(long, global = true, value_name = "URL")]
    pub host: Option<String>,

    /// Seconds to wait on a silent connection
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Model to chat with (overrides default-model)
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Write logs to this file instead of stderr
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            host: self.host.clone(),
            timeout_secs: self.timeout,
            model: self.model.clone(),
        }
    }

    fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_tty()
    }
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Start an interactive chat (default)
    Chat,
    /// Send one prompt and stream the answer to stdout
    Say {
        /// Prompt text (multiple words are joined)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// List models installed on the server
    List,
    /// Show client and server versions
    Version,
    /// Set configuration values, or list them when no key is given
    Set {
        /// Configuration key to set
        key: Option<String>,
        /// Value to set for the key (can be multiple words for system-prompt)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(args.log_file.as_deref())?;

    let command = args.command.as_ref().unwrap_or(&Commands::Chat);
    match command {
        Commands::Set { key, value } => return handle_set(key.as_deref(), value),
        Commands::Unset { key } => return handle_unset(key),
        _ => {}
    }

    let settings = Config::load()?.resolve(&args.overrides())?;
    tracing::debug!(host = %settings.host, model = ?settings.model, "resolved settings");
    let use_color = args.use_color();

    match command {
        Commands::Chat => run_chat(settings, use_color).await,
        Commands::Say { prompt } => run_say(&prompt.join(" "), &settings, use_color).await,
        Commands::List => {
            let transport = OllamaTransport::new(settings.host.clone(), settings.timeout)?;
            list_models(transport.client(), &settings.host, settings.model.as_deref(), use_color)
                .await
        }
        Commands::Version => {
            let transport = OllamaTransport::new(settings.host.clone(), settings.timeout)?;
            print_version(transport.client(), &settings.host).await;
            Ok(())
        }
        Commands::Set { .. } | Commands::Unset { .. } => Ok(()),
    }
}

async fn run_chat(settings: Settings, use_color: bool) -> Result<(), Box<dyn Error>> {
    let transport = OllamaTransport::new(settings.host.clone(), settings.timeout)?;
    let client = transport.client().clone();
    let app = App::from_settings(Arc::new(transport), &settings)?;
    Repl::new(app, client, settings.host, use_color).run().await
}

fn exit_with(err: SettingError) -> ! {
    err.print();
    std::process::exit(err.exit_code());
}

fn handle_set(key: Option<&str>, value: &[String]) -> Result<(), Box<dyn Error>> {
    let config_path = Config::get_config_path()?;
    let Some(key) = key else {
        let config = Config::load_from_path(&config_path)?;
        println!("Configuration ({}):", path_display(&config_path));
        for line in describe_all(&config) {
            println!("{line}");
        }
        return Ok(());
    };

    match set_value(&config_path, key, value) {
        Ok(message) => {
            println!("{message}");
            Ok(())
        }
        Err(err) => exit_with(err),
    }
}

fn handle_unset(key: &str) -> Result<(), Box<dyn Error>> {
    let config_path = Config::get_config_path()?;
    match unset_value(&config_path, key) {
        Ok(message) => {
            println!("{message}");
            Ok(())
        }
        Err(err) => exit_with(err),
    }
}

#[cfg(test)]
mod tests;
