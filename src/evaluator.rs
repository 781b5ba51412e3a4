//! Field evaluation against a single line of text.
//!
//! A field extracts its value either by regex (first capturing group), by a
//! fixed column slice (`token_start`/`token_end`), or by both: when offsets
//! and a pattern are given together, the line is sliced first and the regex
//! is applied to the slice. Column offsets are character positions, clamped
//! to the line length, since the upstream PDF-to-text converter guarantees
//! stable column alignment.

use crate::model::Field;
use log::warn;
use std::ops::Range;

/// Outcome of evaluating one field against one line.
///
/// `span` is the matched byte range within the evaluated line; it is present
/// whenever the field matched, even for boundary-only patterns that capture
/// no value. `(None, None)` means no match; the caller decides failure
/// policy from the field's `required` flag.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub value: Option<String>,
    pub span: Option<Range<usize>>,
}

impl Evaluation {
    pub fn no_match() -> Self {
        Self {
            value: None,
            span: None,
        }
    }

    pub fn matched(&self) -> bool {
        self.span.is_some()
    }
}

/// Evaluate `field` against `line`.
pub fn evaluate(line: &str, field: &Field) -> Evaluation {
    let (text, offset) = match field.token_start {
        Some(start) => {
            let range = char_slice(line, start, field.token_end);
            (&line[range.clone()], range.start)
        }
        None => (line, 0),
    };

    match &field.pattern {
        Some(pattern) => {
            let caps = match pattern.captures(text) {
                Ok(Some(caps)) => caps,
                Ok(None) => return Evaluation::no_match(),
                Err(e) => {
                    warn!("regex evaluation aborted for field '{}': {e}", field.name);
                    return Evaluation::no_match();
                }
            };
            let Some(whole) = caps.get(0) else {
                return Evaluation::no_match();
            };
            // The first capturing group is the value; a pattern without one
            // is boundary-only and validates row shape without recording.
            let value = if caps.len() > 1 {
                caps.get(1)
                    .map(|group| apply_lambda(field, group.as_str()))
            } else {
                None
            };
            Evaluation {
                value,
                span: Some(offset + whole.start()..offset + whole.end()),
            }
        }
        None => {
            // Slice-only field: a blank column renders as spaces (or is cut
            // off entirely), which counts as absent.
            if text.trim().is_empty() {
                return Evaluation::no_match();
            }
            Evaluation {
                value: Some(apply_lambda(field, text)),
                span: Some(offset..offset + text.len()),
            }
        }
    }
}

fn apply_lambda(field: &Field, raw: &str) -> String {
    match field.lambda {
        Some(lambda) => lambda.apply(raw),
        None => raw.to_string(),
    }
}

/// Convert a character-position window into a byte range, clamped to the
/// line length. `end` is exclusive; `None` runs to end of line.
fn char_slice(line: &str, start: usize, end: Option<usize>) -> Range<usize> {
    let byte_at = |pos: usize| {
        line.char_indices()
            .nth(pos)
            .map(|(idx, _)| idx)
            .unwrap_or(line.len())
    };
    let start_byte = byte_at(start);
    let end_byte = match end {
        Some(end) if end > start => byte_at(end),
        Some(_) => start_byte,
        None => line.len(),
    };
    start_byte..end_byte.max(start_byte)
}
