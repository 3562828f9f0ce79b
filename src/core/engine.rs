//! Orchestrates one chat turn at a time over a [`ConversationContext`].
//!
//! Per-turn state machine:
//!
//! ```text
//! Idle -> AwaitingFirstToken -> Streaming -> Finalizing -> Idle
//!              |                    |
//!              +--> Cancelling -----+--> Idle
//!              +--> Failing --------+--> Idle
//! ```
//!
//! A turn is committed only when it completes: the user message and the
//! assistant reply are appended together in `Finalizing`. Cancelled and
//! failed turns leave the history exactly as it was and keep the prompt
//! available for [`SessionEngine::retry`].

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::ChatRequest;
use crate::core::cancel::CancellationController;
use crate::core::chat_stream::{build_chat_request, ChatTransport};
use crate::core::context::ConversationContext;
use crate::core::decoder::{drive, GenerationStats, StreamDecoder, StreamEvent};
use crate::core::error::{FailureKind, SessionError};
use crate::core::message::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    AwaitingFirstToken,
    Streaming,
    Finalizing,
    Cancelling,
    Failing,
}

impl TurnState {
    pub fn as_str(self) -> &'static str {
        match self {
            TurnState::Idle => "idle",
            TurnState::AwaitingFirstToken => "awaiting_first_token",
            TurnState::Streaming => "streaming",
            TurnState::Finalizing => "finalizing",
            TurnState::Cancelling => "cancelling",
            TurnState::Failing => "failing",
        }
    }
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives a turn's events in the order they are produced.
pub trait EventSink {
    /// Called once per turn, after the request is accepted and before the
    /// server has produced anything.
    fn awaiting(&mut self) {}

    fn emit(&mut self, event: StreamEvent);
}

impl EventSink for Vec<StreamEvent> {
    fn emit(&mut self, event: StreamEvent) {
        self.push(event);
    }
}

impl EventSink for mpsc::UnboundedSender<StreamEvent> {
    fn emit(&mut self, event: StreamEvent) {
        let _ = self.send(event);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Completed,
    Cancelled,
    Failed(FailureKind),
}

#[derive(Debug, Clone)]
pub struct TurnReport {
    pub outcome: TurnOutcome,
    pub model: String,
    pub stats: Option<GenerationStats>,
    pub elapsed: Duration,
}

/// A turn that has been accepted but not yet sent.
#[derive(Debug)]
pub struct PendingTurn {
    request: ChatRequest,
    user_message: Message,
    cancel: CancellationToken,
}

impl PendingTurn {
    pub fn request(&self) -> &ChatRequest {
        &self.request
    }

    pub fn model(&self) -> &str {
        &self.request.model
    }
}

pub struct SessionEngine {
    transport: Arc<dyn ChatTransport>,
    context: ConversationContext,
    cancellation: CancellationController,
    state: TurnState,
    inline_thinking: bool,
    unanswered: Option<String>,
}

impl SessionEngine {
    pub fn new(transport: Arc<dyn ChatTransport>, context: ConversationContext) -> Self {
        Self {
            transport,
            context,
            cancellation: CancellationController::new(),
            state: TurnState::Idle,
            inline_thinking: true,
            unanswered: None,
        }
    }

    pub fn with_inline_thinking(mut self, enabled: bool) -> Self {
        self.inline_thinking = enabled;
        self
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn context(&self) -> &ConversationContext {
        &self.context
    }

    /// Handle for the interrupt source. Clones share the flag the engine
    /// re-arms at the start of every turn.
    pub fn cancellation(&self) -> CancellationController {
        self.cancellation.clone()
    }

    pub fn inline_thinking(&self) -> bool {
        self.inline_thinking
    }

    pub fn set_inline_thinking(&mut self, enabled: bool) {
        self.inline_thinking = enabled;
    }

    /// Prompt of the last turn that was cancelled or failed, if any.
    pub fn unanswered_prompt(&self) -> Option<&str> {
        self.unanswered.as_deref()
    }

    fn ensure_idle(&self) -> Result<(), SessionError> {
        match self.state {
            TurnState::Idle => Ok(()),
            state => Err(SessionError::Busy(state)),
        }
    }

    fn transition(&mut self, next: TurnState) {
        if self.state != next {
            debug!(from = %self.state, to = %next, "turn state");
            self.state = next;
        }
    }

    /// Accepts a user turn and builds its request from the current history.
    pub fn start_turn(&mut self, user_input: impl Into<String>) -> Result<PendingTurn, SessionError> {
        self.ensure_idle()?;
        let model = self
            .context
            .model()
            .ok_or(SessionError::NoModelSelected)?
            .to_string();

        let user_message = Message::user(user_input);
        let request = build_chat_request(&self.context.snapshot(), &model, &user_message);
        let cancel = self.cancellation.reset();

        info!(
            model = %model,
            history = self.context.len(),
            "starting turn"
        );
        self.transition(TurnState::AwaitingFirstToken);

        Ok(PendingTurn {
            request,
            user_message,
            cancel,
        })
    }

    /// Sends an accepted turn and streams its events into `sink`.
    pub async fn run_turn(&mut self, pending: PendingTurn, sink: &mut dyn EventSink) -> TurnReport {
        let started = Instant::now();
        let PendingTurn {
            request,
            user_message,
            cancel,
        } = pending;
        let mut decoder = StreamDecoder::new(self.inline_thinking);
        sink.awaiting();

        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            opened = self.transport.send_turn(&request) => Some(opened),
        };

        let mut terminal = None;
        match opened {
            None => {
                self.transition(TurnState::Cancelling);
                let event = decoder.cancel();
                terminal = Some(event.clone());
                sink.emit(event);
            }
            Some(Err(err)) => {
                self.transition(TurnState::Failing);
                let event = decoder.fail(err.into());
                terminal = Some(event.clone());
                sink.emit(event);
            }
            Some(Ok(fragments)) => {
                let state = &mut self.state;
                drive(&mut decoder, fragments, &cancel, |event| {
                    let next = match &event {
                        StreamEvent::ThinkingDelta(_) | StreamEvent::AnswerDelta(_) => {
                            TurnState::Streaming
                        }
                        StreamEvent::Done(_) => TurnState::Finalizing,
                        StreamEvent::Cancelled => TurnState::Cancelling,
                        StreamEvent::Failed(_) => TurnState::Failing,
                    };
                    if *state != next {
                        debug!(from = %state, to = %next, "turn state");
                        *state = next;
                    }
                    if event.is_terminal() {
                        terminal = Some(event.clone());
                    }
                    sink.emit(event);
                })
                .await;
            }
        }

        let outcome = match terminal {
            Some(StreamEvent::Done(reply)) => {
                self.context.append(user_message);
                self.context.append(reply);
                self.unanswered = None;
                TurnOutcome::Completed
            }
            Some(StreamEvent::Failed(kind)) => {
                warn!(error = %kind, "turn failed");
                self.unanswered = Some(user_message.content);
                TurnOutcome::Failed(kind)
            }
            _ => {
                info!("turn cancelled");
                self.unanswered = Some(user_message.content);
                TurnOutcome::Cancelled
            }
        };
        self.transition(TurnState::Idle);

        TurnReport {
            outcome,
            model: request.model,
            stats: decoder.stats().cloned(),
            elapsed: started.elapsed(),
        }
    }

    pub async fn send(
        &mut self,
        user_input: impl Into<String>,
        sink: &mut dyn EventSink,
    ) -> Result<TurnReport, SessionError> {
        let pending = self.start_turn(user_input)?;
        Ok(self.run_turn(pending, sink).await)
    }

    /// Re-sends the prompt of the last cancelled or failed turn.
    pub async fn retry(&mut self, sink: &mut dyn EventSink) -> Result<TurnReport, SessionError> {
        self.ensure_idle()?;
        let prompt = self.unanswered.clone().ok_or(SessionError::NothingToRetry)?;
        self.send(prompt, sink).await
    }

    /// Changes the active model. History is kept and replayed to the new
    /// model on the next turn.
    pub fn switch_model(&mut self, model: impl Into<String>) -> Result<(), SessionError> {
        self.ensure_idle()?;
        let model = model.into();
        info!(
            from = self.context.model().unwrap_or("<none>"),
            to = %model,
            "switching model"
        );
        self.context.set_model(model);
        Ok(())
    }

    pub fn set_temperature(&mut self, temperature: f32) -> Result<(), SessionError> {
        self.ensure_idle()?;
        self.context.set_temperature(temperature)
    }

    pub fn set_system_prompt(&mut self, prompt: Option<String>) -> Result<(), SessionError> {
        self.ensure_idle()?;
        self.context.set_system_prompt(prompt);
        Ok(())
    }

    /// Swaps in a whole new context, e.g. after loading a saved session.
    pub fn replace_context(&mut self, context: ConversationContext) -> Result<(), SessionError> {
        self.ensure_idle()?;
        self.context = context;
        self.unanswered = None;
        Ok(())
    }

    /// Returns to `Idle` after a driving future was dropped mid-turn.
    pub fn abort_in_flight(&mut self) {
        if self.state != TurnState::Idle {
            warn!(state = %self.state, "aborting in-flight turn");
            self.cancellation.request();
            self.transition(TurnState::Idle);
        }
    }
}
