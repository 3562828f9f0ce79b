use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tracing::debug;

use crate::api::{ChatMessage, ChatOptions, ChatRequest};
use crate::core::context::ContextSnapshot;
use crate::core::error::TransportError;
use crate::core::message::Message;
use crate::utils::url::construct_api_url;

/// Raw body fragments of one streamed response, in arrival order.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// Sends one chat turn and yields the response body as it arrives.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_turn(&self, request: &ChatRequest) -> Result<FragmentStream, TransportError>;
}

/// Builds the request for the next turn: the system directive first, then
/// the full history, then the new user message, all against `model`.
pub fn build_chat_request(
    snapshot: &ContextSnapshot,
    model: &str,
    user_message: &Message,
) -> ChatRequest {
    let mut messages = Vec::with_capacity(snapshot.messages.len() + 2);

    if let Some(system_prompt) = &snapshot.system_prompt {
        messages.push(ChatMessage {
            role: "system".to_string(),
            content: system_prompt.clone(),
        });
    }

    for msg in snapshot.messages.iter().chain(std::iter::once(user_message)) {
        messages.push(ChatMessage {
            role: msg.role.as_str().to_string(),
            content: msg.content.clone(),
        });
    }

    ChatRequest {
        model: model.to_string(),
        messages,
        stream: true,
        options: ChatOptions {
            temperature: snapshot.temperature,
        },
    }
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .get("error")
        .and_then(|v| match v {
            serde_json::Value::String(s) => Some(s.to_string()),
            serde_json::Value::Object(map) => map
                .get("message")
                .and_then(|message| message.as_str().map(str::to_owned)),
            _ => None,
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary.map(|text| {
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        collapsed.trim().to_string()
    })
}

/// One-line description of an error response body.
fn summarize_error_body(error_text: &str) -> String {
    let trimmed = error_text.trim();

    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Ok(json_value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(summary) = extract_error_summary(&json_value) {
            if !summary.is_empty() {
                return summary;
            }
        }
        return json_value.to_string();
    }

    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// HTTP transport for an Ollama server's `/api/chat` endpoint.
#[derive(Clone)]
pub struct OllamaTransport {
    client: reqwest::Client,
    host: String,
}

impl OllamaTransport {
    /// `timeout` bounds how long a connection may stay silent, not the length
    /// of a whole generation.
    pub fn new(host: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout.min(Duration::from_secs(30)))
            .read_timeout(timeout)
            .build()?;
        Ok(Self::with_client(client, host))
    }

    pub fn with_client(client: reqwest::Client, host: impl Into<String>) -> Self {
        Self {
            client,
            host: host.into(),
        }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

#[async_trait]
impl ChatTransport for OllamaTransport {
    async fn send_turn(&self, request: &ChatRequest) -> Result<FragmentStream, TransportError> {
        let chat_url = construct_api_url(&self.host, "api/chat");
        debug!(
            url = %chat_url,
            model = %request.model,
            messages = request.messages.len(),
            "sending chat request"
        );

        let response = self
            .client
            .post(chat_url)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(TransportError::Status {
                status,
                message: summarize_error_body(&error_text),
            });
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(TransportError::from));
        Ok(Box::pin(stream))
    }
}
