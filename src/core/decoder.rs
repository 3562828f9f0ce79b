//! Turns raw `/api/chat` body fragments into an ordered [`StreamEvent`]
//! sequence.
//!
//! A turn always produces `ThinkingDelta* AnswerDelta*` followed by exactly
//! one terminal event (`Done`, `Cancelled` or `Failed`). The decoder enforces
//! that grammar itself: once an answer delta has gone out, later reasoning is
//! only folded into the final message, and once a terminal event exists every
//! further input is ignored.

use std::time::Duration;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use memchr::memchr;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::ChatChunk;
use crate::core::error::{FailureKind, TransportError};
use crate::core::message::Message;
use crate::core::think::{Segment, ThinkLexer};

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    ThinkingDelta(String),
    AnswerDelta(String),
    Done(Message),
    Cancelled,
    Failed(FailureKind),
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StreamEvent::Done(_) | StreamEvent::Cancelled | StreamEvent::Failed(_)
        )
    }
}

/// Counters reported on the final line of a completed generation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationStats {
    pub done_reason: Option<String>,
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
    pub total_duration: Option<Duration>,
    pub load_duration: Option<Duration>,
    pub eval_duration: Option<Duration>,
}

impl GenerationStats {
    fn from_chunk(chunk: &ChatChunk) -> Self {
        Self {
            done_reason: chunk.done_reason.clone(),
            prompt_tokens: chunk.prompt_eval_count,
            completion_tokens: chunk.eval_count,
            total_duration: chunk.total_duration.map(Duration::from_nanos),
            load_duration: chunk.load_duration.map(Duration::from_nanos),
            eval_duration: chunk.eval_duration.map(Duration::from_nanos),
        }
    }

    pub fn tokens_per_second(&self) -> Option<f64> {
        let tokens = self.completion_tokens?;
        let seconds = self.eval_duration?.as_secs_f64();
        (seconds > 0.0).then(|| tokens as f64 / seconds)
    }
}

#[derive(Debug)]
pub struct StreamDecoder {
    buffer: Vec<u8>,
    lexer: ThinkLexer,
    thinking: String,
    answer: String,
    thinking_started: bool,
    answer_started: bool,
    finished: bool,
    stats: Option<GenerationStats>,
}

impl StreamDecoder {
    /// `inline_thinking` enables `<think>` delimiter detection in content.
    pub fn new(inline_thinking: bool) -> Self {
        Self {
            buffer: Vec::new(),
            lexer: ThinkLexer::new(inline_thinking),
            thinking: String::new(),
            answer: String::new(),
            thinking_started: false,
            answer_started: false,
            finished: false,
            stats: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn stats(&self) -> Option<&GenerationStats> {
        self.stats.as_ref()
    }

    /// Consumes one raw fragment. Only complete lines are decoded; the tail
    /// of the fragment waits in the buffer for the next one.
    pub fn feed(&mut self, fragment: &[u8]) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        if self.finished {
            return events;
        }

        self.buffer.extend_from_slice(fragment);
        while let Some(newline_pos) = memchr(b'\n', &self.buffer) {
            let line: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            self.process_line(&line[..newline_pos], &mut events);
            if self.finished {
                self.buffer.clear();
                break;
            }
        }
        events
    }

    /// Called when the transport has no more fragments. A trailing line
    /// without a newline is still decoded; a body that never reported
    /// completion fails the turn.
    pub fn end_of_input(&mut self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        if self.finished {
            return events;
        }

        let rest = std::mem::take(&mut self.buffer);
        self.process_line(&rest, &mut events);
        if !self.finished {
            events.push(self.fail(FailureKind::MalformedStream(
                "stream ended before completion".to_string(),
            )));
        }
        events
    }

    /// Ends the turn as cancelled, discarding anything not yet emitted.
    pub fn cancel(&mut self) -> StreamEvent {
        self.buffer.clear();
        self.finished = true;
        StreamEvent::Cancelled
    }

    pub fn fail(&mut self, kind: FailureKind) -> StreamEvent {
        self.buffer.clear();
        self.finished = true;
        StreamEvent::Failed(kind)
    }

    fn process_line(&mut self, raw: &[u8], events: &mut Vec<StreamEvent>) {
        let raw = raw.trim_ascii();
        if raw.is_empty() {
            return;
        }

        let line = match std::str::from_utf8(raw) {
            Ok(line) => line,
            Err(err) => {
                events.push(self.fail(FailureKind::MalformedStream(format!(
                    "invalid UTF-8 in stream: {err}"
                ))));
                return;
            }
        };

        let chunk = match serde_json::from_str::<ChatChunk>(line) {
            Ok(chunk) => chunk,
            Err(err) => {
                warn!(error = %err, "undecodable stream line");
                events.push(self.fail(FailureKind::MalformedStream(format!(
                    "{err}: {}",
                    truncate_for_log(line)
                ))));
                return;
            }
        };

        if let Some(error) = chunk.error.as_deref() {
            events.push(self.fail(TransportError::Server(error.to_string()).into()));
            return;
        }

        if let Some(message) = &chunk.message {
            if let Some(thinking) = message.thinking.as_deref() {
                self.route_thinking(thinking, events);
            }
            for segment in self.lexer.push(&message.content) {
                self.route(segment, events);
            }
        }

        if chunk.done {
            for segment in self.lexer.finish() {
                self.route(segment, events);
            }
            self.stats = Some(GenerationStats::from_chunk(&chunk));
            self.finished = true;
            let thinking = std::mem::take(&mut self.thinking);
            let answer = std::mem::take(&mut self.answer);
            events.push(StreamEvent::Done(Message::assistant(
                answer,
                Some(thinking),
            )));
        }
    }

    fn route(&mut self, segment: Segment, events: &mut Vec<StreamEvent>) {
        match segment {
            Segment::Thinking(text) => self.route_thinking(&text, events),
            Segment::Answer(text) => self.route_answer(&text, events),
        }
    }

    fn route_thinking(&mut self, text: &str, events: &mut Vec<StreamEvent>) {
        if self.answer_started {
            debug!(len = text.len(), "reasoning after answer folded into final message");
            self.thinking.push_str(text);
            return;
        }

        let text = if self.thinking_started {
            text
        } else {
            text.trim_start()
        };
        if text.is_empty() {
            return;
        }
        self.thinking_started = true;
        self.thinking.push_str(text);
        events.push(StreamEvent::ThinkingDelta(text.to_string()));
    }

    fn route_answer(&mut self, text: &str, events: &mut Vec<StreamEvent>) {
        let text = if self.answer_started {
            text
        } else {
            text.trim_start()
        };
        if text.is_empty() {
            return;
        }
        self.answer_started = true;
        self.answer.push_str(text);
        events.push(StreamEvent::AnswerDelta(text.to_string()));
    }
}

fn truncate_for_log(line: &str) -> String {
    const LIMIT: usize = 120;
    match line.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}…", &line[..idx]),
        None => line.to_string(),
    }
}

/// Drives a decoder over a live fragment stream, handing each event to
/// `on_event` as soon as it is produced.
///
/// Cancellation is checked before every fragment, while waiting for the next
/// one, and before each event is handed over, so at most the events of the
/// fragment being processed can precede `Cancelled`. Exactly one terminal
/// event is delivered, and it is always the last.
pub async fn drive<S, F>(
    decoder: &mut StreamDecoder,
    mut fragments: S,
    cancel: &CancellationToken,
    mut on_event: F,
) where
    S: Stream<Item = Result<Bytes, TransportError>> + Unpin,
    F: FnMut(StreamEvent),
{
    loop {
        if cancel.is_cancelled() {
            on_event(decoder.cancel());
            return;
        }

        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                on_event(decoder.cancel());
                return;
            }
            next = fragments.next() => next,
        };

        let events = match next {
            Some(Ok(fragment)) => decoder.feed(&fragment),
            Some(Err(err)) => vec![decoder.fail(err.into())],
            None => decoder.end_of_input(),
        };

        for event in events {
            if cancel.is_cancelled() {
                on_event(decoder.cancel());
                return;
            }
            let terminal = event.is_terminal();
            on_event(event);
            if terminal {
                return;
            }
        }
    }
}

/// Decodes a complete, in-memory body. Useful for replaying captured
/// responses.
pub fn decode_all<'a, I>(fragments: I, inline_thinking: bool) -> Vec<StreamEvent>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut decoder = StreamDecoder::new(inline_thinking);
    let mut events = Vec::new();
    for fragment in fragments {
        events.extend(decoder.feed(fragment));
        if decoder.is_finished() {
            return events;
        }
    }
    events.extend(decoder.end_of_input());
    events
}
