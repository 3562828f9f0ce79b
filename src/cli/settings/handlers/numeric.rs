//! Numeric setting handlers.

use crate::cli::settings::error::SettingError;
use crate::cli::settings::helpers::success_set;
use crate::cli::settings::SettingHandler;
use crate::core::config::data::Config;
use crate::core::constants::{DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT_SECS};
use crate::core::context::{MAX_TEMPERATURE, MIN_TEMPERATURE};

/// Handler for the `temperature` setting.
pub struct TemperatureHandler;

impl SettingHandler for TemperatureHandler {
    fn key(&self) -> &'static str {
        "temperature"
    }

    fn set(&self, args: &[String], config: &mut Config) -> Result<String, SettingError> {
        let Some(input) = args.first() else {
            return Err(SettingError::MissingArgs {
                hint: "To set the default temperature, specify a value:",
                example: "matollama set temperature 0.9",
            });
        };

        let value = input
            .parse::<f32>()
            .ok()
            .filter(|v| (MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(v))
            .ok_or_else(|| SettingError::InvalidValue {
                key: "temperature",
                input: input.clone(),
                expected: "a number between 0.0 and 2.0",
            })?;

        config.temperature = Some(value);
        Ok(success_set("temperature", &value.to_string()))
    }

    fn unset(&self, config: &mut Config) -> String {
        config.temperature = None;
        format!("✅ Unset temperature (will use default: {DEFAULT_TEMPERATURE})")
    }

    fn format(&self, config: &Config) -> String {
        match config.temperature {
            Some(value) => format!("  temperature: {value}"),
            None => format!("  temperature: (unset, default: {DEFAULT_TEMPERATURE})"),
        }
    }
}

/// Handler for the `timeout` setting, in seconds.
pub struct TimeoutHandler;

impl SettingHandler for TimeoutHandler {
    fn key(&self) -> &'static str {
        "timeout"
    }

    fn set(&self, args: &[String], config: &mut Config) -> Result<String, SettingError> {
        let Some(input) = args.first() else {
            return Err(SettingError::MissingArgs {
                hint: "To set the network timeout, specify seconds:",
                example: "matollama set timeout 120",
            });
        };

        let value = input
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or_else(|| SettingError::InvalidValue {
                key: "timeout",
                input: input.clone(),
                expected: "a whole number of seconds, at least 1",
            })?;

        config.timeout_secs = Some(value);
        Ok(success_set("timeout", &format!("{value}s")))
    }

    fn unset(&self, config: &mut Config) -> String {
        config.timeout_secs = None;
        format!("✅ Unset timeout (will use default: {DEFAULT_TIMEOUT_SECS}s)")
    }

    fn format(&self, config: &Config) -> String {
        match config.timeout_secs {
            Some(value) => format!("  timeout: {value}s"),
            None => format!("  timeout: (unset, default: {DEFAULT_TIMEOUT_SECS}s)"),
        }
    }
}
