use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::config::io::ConfigError;
use crate::core::constants::{DEFAULT_HOST, DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT_SECS};
use crate::core::context::{MAX_TEMPERATURE, MIN_TEMPERATURE};
use crate::core::persistence::default_session_dir;
use crate::utils::url::normalize_host;

/// Contents of `config.toml`. Every key is optional; unset keys fall back to
/// built-in defaults when resolved into [`Settings`].
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Ollama server, e.g. "http://localhost:11434"
    pub host: Option<String>,
    /// Seconds a silent connection may stay open
    pub timeout_secs: Option<u64>,
    /// Model selected when a session starts
    pub default_model: Option<String>,
    pub temperature: Option<f32>,
    pub system_prompt: Option<String>,
    /// Theme name written into saved sessions. Output colors ignore it.
    pub theme: Option<String>,
    /// Split `<think>` blocks out of answers
    pub think: Option<bool>,
    /// Where `save`/`load` resolve bare file names
    pub session_dir: Option<PathBuf>,
}

/// Values given on the command line. They win over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub timeout_secs: Option<u64>,
    pub model: Option<String>,
}

/// Effective settings after applying flag > config file > default.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub host: String,
    pub timeout: Duration,
    pub model: Option<String>,
    pub temperature: f32,
    pub system_prompt: Option<String>,
    pub theme: Option<String>,
    pub think: bool,
    pub session_dir: PathBuf,
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
///
/// # Examples
/// - Unix: `/home/user/.config/matollama/config.toml` → `~/.config/matollama/config.toml`
/// - macOS: `/Users/user/Library/Application Support/...` → `~/Library/Application Support/...`
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}

impl Config {
    pub fn resolve(&self, overrides: &Overrides) -> Result<Settings, ConfigError> {
        let temperature = self.temperature.unwrap_or(DEFAULT_TEMPERATURE);
        if !(MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&temperature) {
            return Err(ConfigError::Invalid {
                key: "temperature",
                message: format!("{temperature} is outside {MIN_TEMPERATURE}..={MAX_TEMPERATURE}"),
            });
        }

        let timeout_secs = overrides
            .timeout_secs
            .or(self.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "timeout_secs",
                message: "must be at least 1".to_string(),
            });
        }

        let host = overrides
            .host
            .as_deref()
            .or(self.host.as_deref())
            .unwrap_or(DEFAULT_HOST);

        let session_dir = self
            .session_dir
            .clone()
            .or_else(default_session_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Settings {
            host: normalize_host(host),
            timeout: Duration::from_secs(timeout_secs),
            model: overrides
                .model
                .clone()
                .or_else(|| self.default_model.clone())
                .filter(|model| !model.trim().is_empty()),
            temperature,
            system_prompt: self
                .system_prompt
                .clone()
                .filter(|prompt| !prompt.trim().is_empty()),
            theme: self.theme.clone(),
            think: self.think.unwrap_or(true),
            session_dir,
        })
    }
}
