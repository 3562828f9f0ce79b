//! Shared constants used across the application

/// Client version recorded in saved sessions and shown by `version`.
pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default Ollama endpoint when neither flag nor config names one.
pub const DEFAULT_HOST: &str = "http://localhost:11434";

/// Seconds the network layer waits on a silent connection before giving up.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Inline reasoning delimiters emitted by thinking-capable models.
pub const THINK_OPEN: &str = "<think>";
pub const THINK_CLOSE: &str = "</think>";

/// Environment variable holding the tracing filter directive.
pub const LOG_ENV_VAR: &str = "MATOLLAMA_LOG";
