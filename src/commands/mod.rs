//! Prompt commands.
//!
//! Most commands are bare words (`list`, `run 2`, `save`); in-chat toggles and
//! free-text commands use a leading slash (`/set think off`, `/system ...`).
//! A bare word only counts as a command when what follows it fits the
//! command, so "clear up my confusion" is sent to the model.

mod registry;

pub use registry::{all_commands, find_command, ArgShape, Command, CommandInvocation, Spelling};

use chrono::Local;

use crate::cli::settings::helpers::{format_bool, parse_bool};
use crate::core::app::App;
use crate::core::config::data::path_display;
use crate::core::constants::CLI_VERSION;
use crate::core::error::SessionError;
use crate::core::message::Role;
use crate::core::persistence::{
    default_file_name, load_from_path, resolve_session_path, save_to_path, SnapshotMetadata,
};

/// What the prompt loop should do after a command ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Continue,
    ProcessAsMessage(String),
    ListModels,
    /// Select a model by name or by its number in the last listing.
    RunModel(String),
    ShowVersion,
    Retry,
    Exit,
}

pub fn process_input(app: &mut App, input: &str) -> CommandResult {
    let trimmed = input.trim();
    let (slash, body) = match trimmed.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };

    let mut parts = body.splitn(2, char::is_whitespace);
    let command_name = match parts.next() {
        Some(name) if !name.is_empty() => name,
        _ => return CommandResult::ProcessAsMessage(trimmed.to_string()),
    };
    let args = parts.next().unwrap_or("").trim();

    match registry::find_command(command_name, slash) {
        Some(command) if !command.args.accepts(args, slash) => {
            if slash {
                app.warn(format!("Usage: {}", command.usage));
                CommandResult::Continue
            } else {
                CommandResult::ProcessAsMessage(trimmed.to_string())
            }
        }
        Some(command) => {
            let invocation = CommandInvocation {
                input: trimmed,
                args,
            };
            (command.handler)(app, invocation)
        }
        None if slash => {
            app.error(format!("Unknown command: /{command_name}"));
            CommandResult::Continue
        }
        None => CommandResult::ProcessAsMessage(trimmed.to_string()),
    }
}

fn report_session_error(app: &mut App, err: SessionError) -> CommandResult {
    app.error(err.to_string());
    CommandResult::Continue
}

pub(super) fn handle_help(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    app.info("Commands:");
    for command in all_commands() {
        app.info(format!("  {:<30} {}", command.usage, command.help));
    }
    app.info("Anything else is sent to the active model. Ctrl+C stops a generation.");
    CommandResult::Continue
}

pub(super) fn handle_list(_app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    CommandResult::ListModels
}

pub(super) fn handle_run(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    match invocation.arg_list().first() {
        Some(selector) => CommandResult::RunModel(selector.to_string()),
        None => {
            app.warn("Usage: run <model|number>");
            CommandResult::Continue
        }
    }
}

pub(super) fn handle_model(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    if let Some(name) = invocation.arg_list().first() {
        return CommandResult::RunModel(name.to_string());
    }

    let current = app
        .engine
        .context()
        .model()
        .map(|model| format!("Model: {model}"))
        .unwrap_or_else(|| "No model selected".to_string());
    app.info(current);
    CommandResult::Continue
}

pub(super) fn handle_temp(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        let temperature = app.engine.context().temperature();
        app.info(format!("Temperature: {temperature}"));
        return CommandResult::Continue;
    }

    let Ok(temperature) = invocation.args.parse::<f32>() else {
        app.error("Invalid temperature value");
        return CommandResult::Continue;
    };

    match app.engine.set_temperature(temperature) {
        Ok(()) => {
            app.info(format!("Temperature set to {temperature}"));
            CommandResult::Continue
        }
        Err(SessionError::InvalidTemperature(_)) => {
            app.error("Temperature must be between 0.0 and 2.0");
            CommandResult::Continue
        }
        Err(err) => report_session_error(app, err),
    }
}

pub(super) fn handle_system(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    let slash = invocation.input.starts_with('/');
    if !slash {
        let current = match app.engine.context().system_prompt() {
            Some(prompt) => format!("System prompt: {prompt}"),
            None => "No system prompt".to_string(),
        };
        app.info(current);
        return CommandResult::Continue;
    }

    let prompt = Some(invocation.args.to_string()).filter(|text| !text.is_empty());
    let message = match &prompt {
        Some(text) => {
            let preview: String = text.chars().take(50).collect();
            let ellipsis = if text.chars().count() > 50 { "..." } else { "" };
            format!("System prompt set: {preview}{ellipsis}")
        }
        None => "System prompt cleared".to_string(),
    };

    match app.engine.set_system_prompt(prompt) {
        Ok(()) => {
            app.info(message);
            CommandResult::Continue
        }
        Err(err) => report_session_error(app, err),
    }
}

pub(super) fn handle_history(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    let context = app.engine.context();
    if context.is_empty() {
        app.info("No conversation history");
        return CommandResult::Continue;
    }

    let assistant_label = context.model().unwrap_or("Assistant").to_string();
    let lines: Vec<String> = context
        .messages()
        .iter()
        .map(|message| {
            let ts = message.timestamp.with_timezone(&Local).format("%H:%M:%S");
            match message.role {
                Role::User => format!("You [{ts}]: {}", message.content),
                Role::System => format!("System [{ts}]: {}", message.content),
                Role::Assistant => format!("{assistant_label} [{ts}]:\n{}", message.content),
            }
        })
        .collect();

    for line in lines {
        app.info(line);
    }
    CommandResult::Continue
}

pub(super) fn handle_clear(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    let cleared = app.engine.context().cleared();
    match app.engine.replace_context(cleared) {
        Ok(()) => {
            app.info("History cleared");
            CommandResult::Continue
        }
        Err(err) => report_session_error(app, err),
    }
}

pub(super) fn handle_save(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    let name = match invocation.arg_list().first() {
        Some(name) => name.to_string(),
        None => default_file_name(Local::now()),
    };
    let path = resolve_session_path(&name, &app.session_dir);
    let metadata = SnapshotMetadata::new(app.theme.clone());

    match save_to_path(app.engine.context(), &metadata, &path) {
        Ok(()) => app.info(format!("Session saved to {}", path_display(&path))),
        Err(err) => app.error(format!("Save error: {err}")),
    }
    CommandResult::Continue
}

pub(super) fn handle_load(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    let Some(name) = invocation.arg_list().first().copied() else {
        app.warn("Usage: load <file>");
        return CommandResult::Continue;
    };
    let path = resolve_session_path(name, &app.session_dir);

    let (context, metadata) = match load_from_path(&path) {
        Ok(loaded) => loaded,
        Err(err) => {
            app.error(format!("Load error: {err}"));
            return CommandResult::Continue;
        }
    };

    if metadata.cli_version != CLI_VERSION {
        app.warn(format!(
            "Session saved with version {}, current version is {CLI_VERSION}",
            metadata.cli_version
        ));
    }

    let summary = format!(
        "Model: {}, Messages: {}",
        context.model().unwrap_or("None"),
        context.len()
    );
    match app.engine.replace_context(context) {
        Ok(()) => {
            if metadata.theme.is_some() {
                app.theme = metadata.theme;
            }
            app.info(format!("Session loaded from {}", path_display(&path)));
            app.info(summary);
            CommandResult::Continue
        }
        Err(err) => report_session_error(app, err),
    }
}

pub(super) fn handle_retry(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    if app.engine.unanswered_prompt().is_none() {
        return report_session_error(app, SessionError::NothingToRetry);
    }
    CommandResult::Retry
}

pub(super) fn handle_version(_app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    CommandResult::ShowVersion
}

pub(super) fn handle_exit(_app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    CommandResult::Exit
}

pub(super) fn handle_set(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    let args = invocation.arg_list();
    let (Some(option), Some(value)) = (args.first(), args.get(1)) else {
        app.warn("Usage: /set <think|verbose> <on|off>");
        return CommandResult::Continue;
    };
    let Some(enabled) = parse_bool(value) else {
        app.warn(format!("Usage: /set {option} <on|off>"));
        return CommandResult::Continue;
    };

    match option.to_ascii_lowercase().as_str() {
        "think" => {
            app.engine.set_inline_thinking(enabled);
            app.info(format!("Thinking mode {}", format_bool(enabled)));
        }
        "verbose" => {
            app.verbose = enabled;
            app.info(format!("Verbose mode {}", format_bool(enabled)));
        }
        other => app.error(format!("Unknown option: {other}")),
    }
    CommandResult::Continue
}

#[cfg(test)]
mod tests;
