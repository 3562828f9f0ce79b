//! State of one interactive session: the engine plus the client-side
//! settings the REPL commands read and change.

use std::path::PathBuf;
use std::sync::Arc;

use crate::core::chat_stream::ChatTransport;
use crate::core::config::Settings;
use crate::core::context::ConversationContext;
use crate::core::engine::SessionEngine;
use crate::core::error::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Warning,
    Error,
}

/// A line of client output that is not part of the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

pub struct App {
    pub engine: SessionEngine,
    pub session_dir: PathBuf,
    pub theme: Option<String>,
    /// Print generation statistics after each answer.
    pub verbose: bool,
    notices: Vec<Notice>,
}

impl App {
    pub fn new(engine: SessionEngine, session_dir: PathBuf) -> Self {
        Self {
            engine,
            session_dir,
            theme: None,
            verbose: false,
            notices: Vec::new(),
        }
    }

    pub fn from_settings(
        transport: Arc<dyn ChatTransport>,
        settings: &Settings,
    ) -> Result<Self, SessionError> {
        let mut context = ConversationContext::new(settings.model.clone());
        context.set_temperature(settings.temperature)?;
        context.set_system_prompt(settings.system_prompt.clone());

        let engine = SessionEngine::new(transport, context).with_inline_thinking(settings.think);
        let mut app = Self::new(engine, settings.session_dir.clone());
        app.theme = settings.theme.clone();
        Ok(app)
    }

    /// Label shown before the input cursor; changes once a model is active.
    pub fn prompt_label(&self) -> &'static str {
        if self.engine.context().model().is_some() {
            "You"
        } else {
            "Ollama"
        }
    }

    fn push(&mut self, kind: NoticeKind, text: impl Into<String>) {
        self.notices.push(Notice {
            kind,
            text: text.into(),
        });
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.push(NoticeKind::Info, text);
    }

    pub fn warn(&mut self, text: impl Into<String>) {
        self.push(NoticeKind::Warning, text);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.push(NoticeKind::Error, text);
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}
