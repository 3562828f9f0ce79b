//! Settings management for CLI set/unset commands.
//!
//! Each config key has a handler; handlers differ by value shape:
//!
//! - Boolean settings (`think`)
//! - String settings (`host`, `default-model`, `system-prompt`, ...)
//! - Numeric settings (`temperature`, `timeout`)

pub mod error;
pub mod handlers;
pub mod helpers;
pub mod registry;

pub use error::SettingError;
pub use registry::SettingRegistry;

use std::path::Path;

use crate::core::config::data::Config;

/// Trait for handling a configuration setting.
///
/// Handlers only edit the in-memory [`Config`]; loading and saving the file
/// happens in [`set_value`] and [`unset_value`].
pub trait SettingHandler: Send + Sync {
    /// Returns the configuration key this handler manages.
    fn key(&self) -> &'static str;

    /// Set the configuration value from the words following the key.
    ///
    /// Returns a success message to display.
    fn set(&self, args: &[String], config: &mut Config) -> Result<String, SettingError>;

    /// Clear the configuration value so the built-in default applies.
    fn unset(&self, config: &mut Config) -> String;

    /// Format the current value for display in `matollama set` output.
    fn format(&self, config: &Config) -> String;
}

fn load(config_path: &Path) -> Result<Config, SettingError> {
    Config::load_from_path(config_path).map_err(|e| SettingError::ConfigError(e.to_string()))
}

fn save(config: &Config, config_path: &Path) -> Result<(), SettingError> {
    config
        .save_to_path(config_path)
        .map_err(|e| SettingError::ConfigError(e.to_string()))
}

pub fn set_value(config_path: &Path, key: &str, args: &[String]) -> Result<String, SettingError> {
    let registry = SettingRegistry::new();
    let handler = registry
        .get(key)
        .ok_or_else(|| SettingError::UnknownKey(key.to_string()))?;

    let mut config = load(config_path)?;
    let message = handler.set(args, &mut config)?;
    save(&config, config_path)?;
    Ok(message)
}

pub fn unset_value(config_path: &Path, key: &str) -> Result<String, SettingError> {
    let registry = SettingRegistry::new();
    let handler = registry
        .get(key)
        .ok_or_else(|| SettingError::UnknownKey(key.to_string()))?;

    let mut config = load(config_path)?;
    let message = handler.unset(&mut config);
    save(&config, config_path)?;
    Ok(message)
}

/// One line per key, in display order, for `matollama set` without a key.
pub fn describe_all(config: &Config) -> Vec<String> {
    let registry = SettingRegistry::new();
    registry
        .keys_display_order()
        .iter()
        .filter_map(|key| registry.get(key))
        .map(|handler| handler.format(config))
        .collect()
}
