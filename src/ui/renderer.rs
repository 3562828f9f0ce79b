//! Line-oriented terminal output for streamed turns.
//!
//! Reasoning is shown dimmed between a `Thinking...` banner and a
//! `...done thinking` trailer; answer text follows unstyled. Colour can be
//! switched off for pipes, in which case only the banners remain.

use std::io::{self, Write};

use ratatui::crossterm::queue;
use ratatui::crossterm::style::{
    Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor,
};

use crate::api::models::format_size;
use crate::api::ModelInfo;
use crate::core::app::{Notice, NoticeKind};
use crate::core::decoder::{GenerationStats, StreamEvent};
use crate::core::engine::{EventSink, TurnOutcome, TurnReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Waiting,
    Thinking,
    Answering,
}

pub struct TerminalRenderer<W: Write> {
    out: W,
    use_color: bool,
    show_waiting: bool,
    phase: Phase,
}

impl TerminalRenderer<io::Stdout> {
    pub fn stdout(use_color: bool) -> Self {
        Self::new(io::stdout(), use_color)
    }
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W, use_color: bool) -> Self {
        Self {
            out,
            use_color,
            show_waiting: true,
            phase: Phase::Idle,
        }
    }

    /// Skips the "Starting..." line, for output that is being captured.
    pub fn without_waiting_line(mut self) -> Self {
        self.show_waiting = false;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn styled(&mut self, text: &str, color: Option<Color>, dim: bool) -> io::Result<()> {
        if !self.use_color {
            return queue!(self.out, Print(text));
        }
        if let Some(color) = color {
            queue!(self.out, SetForegroundColor(color))?;
        }
        if dim {
            queue!(self.out, SetAttribute(Attribute::Dim))?;
        }
        queue!(
            self.out,
            Print(text),
            SetAttribute(Attribute::Reset),
            ResetColor
        )
    }

    fn line(&mut self, text: &str, color: Option<Color>) -> io::Result<()> {
        self.styled(text, color, false)?;
        queue!(self.out, Print("\n"))
    }

    /// Dim placeholder shown until the first token arrives; model loading
    /// can take a while.
    pub fn waiting(&mut self) -> io::Result<()> {
        self.phase = Phase::Waiting;
        if !self.show_waiting {
            return Ok(());
        }
        self.styled("Starting...\n", None, true)?;
        self.out.flush()
    }

    /// Whether a line of streamed text is still open.
    fn mid_line(&self) -> bool {
        matches!(self.phase, Phase::Thinking | Phase::Answering)
    }

    fn close_thinking(&mut self) -> io::Result<()> {
        if self.phase == Phase::Thinking {
            self.styled("\n...done thinking\n\n", None, true)?;
        }
        Ok(())
    }

    fn render(&mut self, event: StreamEvent) -> io::Result<()> {
        match event {
            StreamEvent::ThinkingDelta(text) => {
                if !self.mid_line() {
                    self.styled("Thinking...\n", None, true)?;
                    self.phase = Phase::Thinking;
                }
                self.styled(&text, None, true)?;
            }
            StreamEvent::AnswerDelta(text) => {
                self.close_thinking()?;
                self.phase = Phase::Answering;
                queue!(self.out, Print(text))?;
            }
            StreamEvent::Done(_) => {
                self.close_thinking()?;
                queue!(self.out, Print("\n"))?;
                self.phase = Phase::Idle;
            }
            StreamEvent::Cancelled => {
                if self.mid_line() {
                    queue!(self.out, Print("\n"))?;
                }
                self.line("Generation interrupted", Some(Color::Yellow))?;
                self.phase = Phase::Idle;
            }
            StreamEvent::Failed(kind) => {
                if self.mid_line() {
                    queue!(self.out, Print("\n"))?;
                }
                let hint = if kind.is_timeout() {
                    " (the server stopped responding; try `retry`)"
                } else {
                    ""
                };
                self.line(&format!("Error: {kind}{hint}"), Some(Color::Red))?;
                self.phase = Phase::Idle;
            }
        }
        self.out.flush()
    }

    pub fn notice(&mut self, notice: &Notice) -> io::Result<()> {
        let color = match notice.kind {
            NoticeKind::Info => None,
            NoticeKind::Warning => Some(Color::Yellow),
            NoticeKind::Error => Some(Color::Red),
        };
        self.line(&notice.text, color)?;
        self.out.flush()
    }

    pub fn notices(&mut self, notices: &[Notice]) -> io::Result<()> {
        for notice in notices {
            self.notice(notice)?;
        }
        Ok(())
    }

    /// Prints counters for a completed turn. Nothing is shown for turns that
    /// did not complete.
    pub fn report(&mut self, report: &TurnReport) -> io::Result<()> {
        if report.outcome != TurnOutcome::Completed {
            return Ok(());
        }
        let summary = match &report.stats {
            Some(stats) => format_stats(stats),
            None => format!("{:.2}s", report.elapsed.as_secs_f64()),
        };
        self.styled(&format!("[{} | {summary}]\n", report.model), None, true)?;
        self.out.flush()
    }

    /// Numbered model table; the numbers are what `run <n>` accepts.
    pub fn model_table(&mut self, models: &[ModelInfo], active: Option<&str>) -> io::Result<()> {
        if models.is_empty() {
            return self.line("No models found. Use `ollama pull <model>` to download one.", None);
        }

        let name_width = models
            .iter()
            .map(|model| model.name.chars().count() + 2)
            .max()
            .unwrap_or(4)
            .max(4);
        let params: Vec<String> = models.iter().map(|model| model.details.summary()).collect();
        let params_width = params
            .iter()
            .map(|text| text.chars().count())
            .max()
            .unwrap_or(0)
            .max(6);
        self.line(
            &format!(
                "{:>3}  {:<name_width$}  {:>9}  {:<params_width$}  Modified",
                "#", "Name", "Size", "Params"
            ),
            Some(Color::Cyan),
        )?;
        for (index, (model, params)) in models.iter().zip(&params).enumerate() {
            let marker = if Some(model.name.as_str()) == active {
                "→ "
            } else {
                "  "
            };
            let name = format!("{marker}{}", model.name);
            let row = format!(
                "{:>3}  {:<name_width$}  {:>9}  {:<params_width$}  {}",
                index + 1,
                name,
                format_size(model.size),
                params,
                format_modified(model.modified_at.as_deref()),
            );
            self.line(&row, None)?;
        }
        self.out.flush()
    }
}

impl<W: Write> EventSink for TerminalRenderer<W> {
    fn awaiting(&mut self) {
        if let Err(err) = self.waiting() {
            tracing::debug!(error = %err, "terminal write failed");
        }
    }

    fn emit(&mut self, event: StreamEvent) {
        if let Err(err) = self.render(event) {
            tracing::debug!(error = %err, "terminal write failed");
        }
    }
}

pub fn format_stats(stats: &GenerationStats) -> String {
    let mut parts = Vec::new();
    if let Some(tokens) = stats.prompt_tokens {
        parts.push(format!("prompt {tokens} tok"));
    }
    if let Some(tokens) = stats.completion_tokens {
        parts.push(format!("answer {tokens} tok"));
    }
    if let Some(rate) = stats.tokens_per_second() {
        parts.push(format!("{rate:.1} tok/s"));
    }
    if let Some(load) = stats.load_duration {
        parts.push(format!("load {:.2}s", load.as_secs_f64()));
    }
    if let Some(total) = stats.total_duration {
        parts.push(format!("total {:.2}s", total.as_secs_f64()));
    }
    if let Some(reason) = stats.done_reason.as_deref().filter(|r| *r != "stop") {
        parts.push(format!("stopped: {reason}"));
    }
    if parts.is_empty() {
        "no stats".to_string()
    } else {
        parts.join(", ")
    }
}

fn format_modified(modified_at: Option<&str>) -> String {
    let Some(raw) = modified_at else {
        return String::new();
    };
    match chrono::DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => parsed
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        Err(_) => raw.chars().take(16).collect(),
    }
}
