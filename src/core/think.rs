//! Splits streamed content into reasoning and answer regions using the
//! inline `<think>` / `</think>` delimiters.
//!
//! Delimiters can arrive split across any number of chunks, so the lexer
//! holds back a trailing fragment whenever it could still grow into a
//! delimiter. Held-back text is released as soon as it is disambiguated, or
//! by [`ThinkLexer::finish`] at end of stream.

use crate::core::constants::{THINK_CLOSE, THINK_OPEN};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Thinking(String),
    Answer(String),
}

#[derive(Debug, Clone)]
pub struct ThinkLexer {
    enabled: bool,
    in_thinking: bool,
    pending: String,
}

impl ThinkLexer {
    /// When `enabled` is false the delimiters are not interpreted and every
    /// chunk is answer text.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            in_thinking: false,
            pending: String::new(),
        }
    }

    pub fn push(&mut self, chunk: &str) -> Vec<Segment> {
        let mut segments = Vec::new();
        if !self.enabled {
            push_segment(&mut segments, false, chunk);
            return segments;
        }

        let mut buffer = std::mem::take(&mut self.pending);
        buffer.push_str(chunk);

        let mut rest = buffer.as_str();
        loop {
            let marker = if self.in_thinking {
                THINK_CLOSE
            } else {
                THINK_OPEN
            };
            if let Some(pos) = rest.find(marker) {
                push_segment(&mut segments, self.in_thinking, &rest[..pos]);
                self.in_thinking = !self.in_thinking;
                rest = &rest[pos + marker.len()..];
                continue;
            }

            let held = partial_marker_len(rest, marker);
            let (emit, keep) = rest.split_at(rest.len() - held);
            push_segment(&mut segments, self.in_thinking, emit);
            self.pending.push_str(keep);
            break;
        }

        segments
    }

    /// Releases any held-back text as literal content of the current region.
    pub fn finish(&mut self) -> Vec<Segment> {
        let mut segments = Vec::new();
        let pending = std::mem::take(&mut self.pending);
        push_segment(&mut segments, self.in_thinking, &pending);
        segments
    }
}

fn push_segment(segments: &mut Vec<Segment>, thinking: bool, text: &str) {
    if text.is_empty() {
        return;
    }
    let segment = if thinking {
        Segment::Thinking(text.to_string())
    } else {
        Segment::Answer(text.to_string())
    };
    segments.push(segment);
}

/// Length of the longest suffix of `text` that is a proper prefix of
/// `marker`. Markers are ASCII, so the split point is a char boundary.
fn partial_marker_len(text: &str, marker: &str) -> usize {
    (1..marker.len())
        .rev()
        .find(|&len| text.ends_with(&marker[..len]))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(lexer: &mut ThinkLexer, chunks: &[&str]) -> Vec<Segment> {
        let mut out = Vec::new();
        for chunk in chunks {
            out.extend(lexer.push(chunk));
        }
        out.extend(lexer.finish());
        out
    }

    fn joined(segments: &[Segment]) -> (String, String) {
        let mut thinking = String::new();
        let mut answer = String::new();
        for segment in segments {
            match segment {
                Segment::Thinking(text) => thinking.push_str(text),
                Segment::Answer(text) => answer.push_str(text),
            }
        }
        (thinking, answer)
    }

    #[test]
    fn text_without_markers_is_answer() {
        let mut lexer = ThinkLexer::new(true);
        let segments = collect(&mut lexer, &["Hello ", "world"]);
        assert_eq!(
            segments,
            vec![
                Segment::Answer("Hello ".to_string()),
                Segment::Answer("world".to_string())
            ]
        );
    }

    #[test]
    fn bracketed_text_is_thinking() {
        let mut lexer = ThinkLexer::new(true);
        let segments = collect(&mut lexer, &["<think>hmm</think>4"]);
        assert_eq!(
            segments,
            vec![
                Segment::Thinking("hmm".to_string()),
                Segment::Answer("4".to_string())
            ]
        );
    }

    #[test]
    fn markers_split_across_every_byte() {
        let source = "<think>checking arithmetic</think>The answer is 4";
        let chunks: Vec<String> = source.chars().map(|c| c.to_string()).collect();
        let chunk_refs: Vec<&str> = chunks.iter().map(String::as_str).collect();

        let mut lexer = ThinkLexer::new(true);
        let segments = collect(&mut lexer, &chunk_refs);
        let (thinking, answer) = joined(&segments);
        assert_eq!(thinking, "checking arithmetic");
        assert_eq!(answer, "The answer is 4");
    }

    #[test]
    fn partial_marker_is_held_until_disambiguated() {
        let mut lexer = ThinkLexer::new(true);
        assert_eq!(lexer.push("a <thi"), vec![Segment::Answer("a ".to_string())]);
        assert_eq!(
            lexer.push("s is not a tag"),
            vec![Segment::Answer("<this is not a tag".to_string())]
        );
    }

    #[test]
    fn unterminated_prefix_is_flushed_on_finish() {
        let mut lexer = ThinkLexer::new(true);
        assert_eq!(lexer.push("x <"), vec![Segment::Answer("x ".to_string())]);
        assert_eq!(lexer.finish(), vec![Segment::Answer("<".to_string())]);
    }

    #[test]
    fn disabled_lexer_passes_markers_through() {
        let mut lexer = ThinkLexer::new(false);
        let segments = collect(&mut lexer, &["<think>a</think>b"]);
        assert_eq!(
            segments,
            vec![Segment::Answer("<think>a</think>b".to_string())]
        );
    }

    #[test]
    fn multibyte_text_near_markers_is_preserved() {
        let mut lexer = ThinkLexer::new(true);
        let segments = collect(&mut lexer, &["<think>é", "ü</thi", "nk>ñ<"]);
        let (thinking, answer) = joined(&segments);
        assert_eq!(thinking, "éü");
        assert_eq!(answer, "ñ<");
    }
}
