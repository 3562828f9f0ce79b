//! String setting handlers for text-based settings.

use std::path::PathBuf;

use crate::cli::settings::error::SettingError;
use crate::cli::settings::helpers::{success_set, success_unset, truncate_with_ellipsis};
use crate::cli::settings::SettingHandler;
use crate::core::config::data::Config;
use crate::core::constants::DEFAULT_HOST;
use crate::utils::url::normalize_host;

/// Data-driven handler for free-text settings.
pub struct StringHandler {
    key: &'static str,
    hint: &'static str,
    example: &'static str,
    default_display: Option<&'static str>,
    /// Shown after the value when the setting does not do what its name suggests.
    note: Option<&'static str>,
    get: fn(&Config) -> Option<String>,
    set_field: fn(&mut Config, Option<String>),
    normalize: fn(String) -> String,
}

impl SettingHandler for StringHandler {
    fn key(&self) -> &'static str {
        self.key
    }

    fn set(&self, args: &[String], config: &mut Config) -> Result<String, SettingError> {
        let value = args.join(" ");
        if value.trim().is_empty() {
            return Err(SettingError::MissingArgs {
                hint: self.hint,
                example: self.example,
            });
        }

        let value = (self.normalize)(value);
        let mut message = success_set(self.key, &truncate_with_ellipsis(&value, 50));
        if let Some(note) = self.note {
            message.push_str(&format!(" ({note})"));
        }
        (self.set_field)(config, Some(value));
        Ok(message)
    }

    fn unset(&self, config: &mut Config) -> String {
        (self.set_field)(config, None);
        match self.default_display {
            Some(default) => format!("✅ Unset {} (will use default: {default})", self.key),
            None => success_unset(self.key),
        }
    }

    fn format(&self, config: &Config) -> String {
        let line = match ((self.get)(config), self.default_display) {
            (Some(value), _) => {
                let flat = value.replace('\n', " ");
                format!("  {}: {}", self.key, truncate_with_ellipsis(&flat, 50))
            }
            (None, Some(default)) => format!("  {}: (unset, default: {default})", self.key),
            (None, None) => format!("  {}: (unset)", self.key),
        };
        match self.note {
            Some(note) => format!("{line}  [{note}]"),
            None => line,
        }
    }
}

fn unchanged(value: String) -> String {
    value
}

fn normalized_host(value: String) -> String {
    normalize_host(&value)
}

/// Create a handler for the `host` setting.
pub fn host_handler() -> StringHandler {
    StringHandler {
        key: "host",
        hint: "To set the Ollama host, specify host and port:",
        example: "matollama set host gpu-box:11434",
        default_display: Some(DEFAULT_HOST),
        note: None,
        get: |c| c.host.clone(),
        set_field: |c, v| c.host = v,
        normalize: normalized_host,
    }
}

/// Create a handler for the `default-model` setting.
pub fn default_model_handler() -> StringHandler {
    StringHandler {
        key: "default-model",
        hint: "To set a default model, specify the model name:",
        example: "matollama set default-model llama3.2:latest",
        default_display: None,
        note: None,
        get: |c| c.default_model.clone(),
        set_field: |c, v| c.default_model = v,
        normalize: unchanged,
    }
}

/// Create a handler for the `system-prompt` setting.
pub fn system_prompt_handler() -> StringHandler {
    StringHandler {
        key: "system-prompt",
        hint: "To set a system prompt, provide the prompt text:",
        example: "matollama set system-prompt \"You are terse.\"",
        default_display: None,
        note: None,
        get: |c| c.system_prompt.clone(),
        set_field: |c, v| c.system_prompt = v,
        normalize: unchanged,
    }
}

/// Create a handler for the `theme` setting.
pub fn theme_handler() -> StringHandler {
    StringHandler {
        key: "theme",
        hint: "To record a theme name in saved sessions, specify it:",
        example: "matollama set theme dark",
        default_display: None,
        note: Some("recorded in saved sessions, does not change colors"),
        get: |c| c.theme.clone(),
        set_field: |c, v| c.theme = v,
        normalize: |value| value.trim().to_lowercase(),
    }
}

/// Create a handler for the `session-dir` setting.
pub fn session_dir_handler() -> StringHandler {
    StringHandler {
        key: "session-dir",
        hint: "To set where sessions are saved, specify a directory:",
        example: "matollama set session-dir ~/chats",
        default_display: Some("platform data directory"),
        note: None,
        get: |c| c.session_dir.as_ref().map(|p| p.display().to_string()),
        set_field: |c, v| c.session_dir = v.map(PathBuf::from),
        normalize: expand_home,
    }
}

fn expand_home(value: String) -> String {
    match (value.strip_prefix("~/"), directories::UserDirs::new()) {
        (Some(rest), Some(dirs)) => dirs.home_dir().join(rest).display().to_string(),
        _ => value,
    }
}
