//! Registry of setting handlers.

use std::collections::HashMap;

use super::handlers::boolean::think_handler;
use super::handlers::numeric::{TemperatureHandler, TimeoutHandler};
use super::handlers::string::{
    default_model_handler, host_handler, session_dir_handler, system_prompt_handler,
    theme_handler,
};
use super::SettingHandler;

/// Registry of all available setting handlers.
pub struct SettingRegistry {
    handlers: HashMap<&'static str, Box<dyn SettingHandler>>,
    /// Keys in display order for `matollama set` output.
    display_order: Vec<&'static str>,
}

impl SettingRegistry {
    /// Create a new registry with all handlers registered.
    pub fn new() -> Self {
        let mut registry = Self {
            handlers: HashMap::new(),
            display_order: Vec::new(),
        };

        // Register handlers in display order
        registry.register(Box::new(host_handler()));
        registry.register(Box::new(TimeoutHandler));
        registry.register(Box::new(default_model_handler()));
        registry.register(Box::new(TemperatureHandler));
        registry.register(Box::new(system_prompt_handler()));
        registry.register(Box::new(theme_handler()));
        registry.register(Box::new(think_handler()));
        registry.register(Box::new(session_dir_handler()));

        registry
    }

    fn register(&mut self, handler: Box<dyn SettingHandler>) {
        let key = handler.key();
        self.display_order.push(key);
        self.handlers.insert(key, handler);
    }

    /// Get a handler by key. The TOML spelling (`default_model`) works too.
    pub fn get(&self, key: &str) -> Option<&dyn SettingHandler> {
        let key = key.trim().to_ascii_lowercase().replace('_', "-");
        let key = match key.as_str() {
            "timeout-secs" => "timeout",
            other => other,
        };
        self.handlers.get(key).map(|h| h.as_ref())
    }

    /// Get all keys in display order.
    pub fn keys_display_order(&self) -> &[&'static str] {
        &self.display_order
    }
}

impl Default for SettingRegistry {
    fn default() -> Self {
        Self::new()
    }
}
