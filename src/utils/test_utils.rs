use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{self, StreamExt};

use crate::api::ChatRequest;
use crate::core::app::App;
use crate::core::chat_stream::{ChatTransport, FragmentStream};
use crate::core::context::ConversationContext;
use crate::core::engine::SessionEngine;
use crate::core::error::TransportError;
use crate::core::message::Message;

/// One canned response for [`ScriptedTransport`].
pub enum ScriptedResponse {
    /// The request itself fails.
    Reject(TransportError),
    /// Yields the fragments, then ends the body.
    Body(Vec<Result<Bytes, TransportError>>),
    /// Yields the fragments, then never produces another one.
    Stall(Vec<Result<Bytes, TransportError>>),
}

impl ScriptedResponse {
    pub fn lines(lines: &[&str]) -> Self {
        ScriptedResponse::Body(lines.iter().map(|line| Ok(ndjson_line(line))).collect())
    }

    pub fn answer(text: &str) -> Self {
        Self::lines(&[answer_line(text).as_str(), r#"{"done":true}"#])
    }
}

pub fn ndjson_line(line: &str) -> Bytes {
    Bytes::from(format!("{line}\n"))
}

pub fn answer_line(text: &str) -> String {
    serde_json::json!({"message": {"role": "assistant", "content": text}, "done": false})
        .to_string()
}

pub fn thinking_line(text: &str) -> String {
    serde_json::json!({"message": {"role": "assistant", "content": "", "thinking": text}, "done": false})
        .to_string()
}

/// In-memory transport that replays scripted responses and records every
/// request it receives.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    responses: Arc<Mutex<VecDeque<ScriptedResponse>>>,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<ScriptedResponse>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            requests: Arc::default(),
        }
    }

    pub fn push(&self, response: ScriptedResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn send_turn(&self, request: &ChatRequest) -> Result<FragmentStream, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted response left");

        match response {
            ScriptedResponse::Reject(err) => Err(err),
            ScriptedResponse::Body(fragments) => Ok(Box::pin(stream::iter(fragments))),
            ScriptedResponse::Stall(fragments) => {
                Ok(Box::pin(stream::iter(fragments).chain(stream::pending())))
            }
        }
    }
}

pub fn create_test_context() -> ConversationContext {
    let mut context = ConversationContext::new(Some("test-model".to_string()));
    context.append(Message::user("Hello"));
    context.append(Message::assistant("Hi there!", None));
    context
}

/// App over [`create_test_context`] whose transport replays `responses`.
pub fn create_test_app_with(responses: Vec<ScriptedResponse>) -> (App, ScriptedTransport) {
    let transport = ScriptedTransport::new(responses);
    let engine = SessionEngine::new(Arc::new(transport.clone()), create_test_context());
    (App::new(engine, std::env::temp_dir()), transport)
}

pub fn create_test_app() -> App {
    create_test_app_with(Vec::new()).0
}
