//! Conversation history and per-session generation settings.

use std::sync::Arc;

use crate::core::constants::DEFAULT_TEMPERATURE;
use crate::core::error::SessionError;
use crate::core::message::Message;

pub const MIN_TEMPERATURE: f32 = 0.0;
pub const MAX_TEMPERATURE: f32 = 2.0;

/// Ordered, append-only record of what the model has been told.
///
/// The history is replayed verbatim on every turn, so it is the only
/// place a model's "memory" lives. The system prompt is held separately and
/// is never part of the history.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationContext {
    messages: Vec<Message>,
    model: Option<String>,
    temperature: f32,
    system_prompt: Option<String>,
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            model: None,
            temperature: DEFAULT_TEMPERATURE,
            system_prompt: None,
        }
    }
}

impl ConversationContext {
    pub fn new(model: Option<String>) -> Self {
        Self {
            model,
            ..Self::default()
        }
    }

    /// Assembles a context from already-validated parts. Used by the
    /// persistence codec.
    pub(crate) fn from_parts(
        messages: Vec<Message>,
        model: Option<String>,
        temperature: f32,
        system_prompt: Option<String>,
    ) -> Result<Self, SessionError> {
        validate_temperature(temperature)?;
        Ok(Self {
            messages,
            model,
            temperature,
            system_prompt: normalize_prompt(system_prompt),
        })
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Appends a message whose role arrives as text. Fails with
    /// `InvalidRole` without touching the history.
    pub fn append_parts(&mut self, role: &str, content: &str) -> Result<(), SessionError> {
        let message = Message::parse(role, content)?;
        self.append(message);
        Ok(())
    }

    /// Replaces or clears the single system directive. Empty text clears it.
    pub fn set_system_prompt(&mut self, prompt: Option<String>) {
        self.system_prompt = normalize_prompt(prompt);
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = Some(model.into());
    }

    pub fn set_temperature(&mut self, temperature: f32) -> Result<(), SessionError> {
        validate_temperature(temperature)?;
        self.temperature = temperature;
        Ok(())
    }

    /// A fresh context that keeps the settings but none of the history.
    pub fn cleared(&self) -> Self {
        Self {
            messages: Vec::new(),
            ..self.clone()
        }
    }

    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            messages: Arc::from(self.messages.as_slice()),
            model: self.model.clone(),
            temperature: self.temperature,
            system_prompt: self.system_prompt.clone(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }
}

/// Immutable view of a context taken at the start of a turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextSnapshot {
    pub messages: Arc<[Message]>,
    pub model: Option<String>,
    pub temperature: f32,
    pub system_prompt: Option<String>,
}

fn validate_temperature(temperature: f32) -> Result<(), SessionError> {
    if (MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&temperature) {
        Ok(())
    } else {
        Err(SessionError::InvalidTemperature(temperature))
    }
}

fn normalize_prompt(prompt: Option<String>) -> Option<String> {
    prompt.filter(|text| !text.trim().is_empty())
}
