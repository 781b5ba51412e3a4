//! Row matching: applies a row's ordered fields to the lines it consumes.
//!
//! Fields are evaluated in definition order against a working copy of the
//! row text. A `pop_out` field that matches removes its matched span from
//! the working copy before the next field runs, so two fields can never
//! claim the same characters. A `pop_out: false` field evaluates against
//! the unmutated original line instead, which deliberately permits
//! overlapping windows for heuristic backward anchors.

use crate::evaluator;
use crate::model::Row;

/// Successful row match: ordered extracted pairs and lines consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct RowMatch {
    pub fields: Vec<(String, Option<String>)>,
    pub lines_consumed: usize,
}

/// Row matching is expected control flow, not a fault; failure carries no
/// payload and never consumes input.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Matched(RowMatch),
    Failed,
}

impl RowOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, RowOutcome::Matched(_))
    }
}

/// Attempt `row` at `cursor` within `page`.
///
/// Consumes exactly `row.row_span` lines on success. When the row spans
/// several lines the working text is their newline join, applied
/// consistently for both whole-row formats and per-field evaluation.
pub fn match_row(page: &[String], cursor: usize, row: &Row) -> RowOutcome {
    if cursor + row.row_span > page.len() {
        return RowOutcome::Failed;
    }
    let consumed = &page[cursor..cursor + row.row_span];
    let original = if row.row_span == 1 {
        consumed[0].clone()
    } else {
        consumed.join("\n")
    };

    if let Some(prefix) = &row.starts_with {
        if !consumed[0].starts_with(prefix.as_str()) {
            return RowOutcome::Failed;
        }
    }

    let mut outcome = if row.fields.is_empty() {
        match_whole_row(row, &original)
    } else {
        match_fields(row, &original)
    };

    if let RowOutcome::Matched(m) = &mut outcome {
        if row.skip_keys {
            m.fields.clear();
        }
        m.lines_consumed = row.row_span;
    }
    outcome
}

fn match_whole_row(row: &Row, text: &str) -> RowOutcome {
    let Some(pattern) = &row.format else {
        return RowOutcome::Failed;
    };
    match pattern.captures(text) {
        Ok(Some(caps)) => {
            let mut fields = Vec::new();
            if caps.len() > 1 {
                if let Some(group) = caps.get(1) {
                    fields.push((row.name.clone(), Some(group.as_str().to_string())));
                }
            }
            RowOutcome::Matched(RowMatch {
                fields,
                lines_consumed: 0,
            })
        }
        Ok(None) if row.optional_if_empty && text.trim().is_empty() => {
            RowOutcome::Matched(RowMatch {
                fields: Vec::new(),
                lines_consumed: 0,
            })
        }
        Ok(None) => RowOutcome::Failed,
        Err(e) => {
            log::warn!("regex evaluation aborted for row '{}': {e}", row.name);
            RowOutcome::Failed
        }
    }
}

fn match_fields(row: &Row, original: &str) -> RowOutcome {
    let mut working = original.to_string();
    let mut fields = Vec::with_capacity(row.fields.len());
    let mut any_matched = false;
    let mut missing_required = false;

    for field in &row.fields {
        let target = if field.pop_out {
            working.as_str()
        } else {
            original
        };
        let eval = evaluator::evaluate(target, field);

        if let Some(span) = &eval.span {
            any_matched = true;
            if field.pop_out {
                working.replace_range(span.clone(), "");
            }
            // Boundary-only matches validate shape without recording a key.
            if eval.value.is_some() {
                fields.push((field.name.clone(), eval.value));
            }
        } else {
            if field.required {
                missing_required = true;
            }
            fields.push((field.name.clone(), None));
        }
    }

    if missing_required {
        // A fully blank window still satisfies the row when tolerated;
        // sparse optional columns sometimes render as nothing at all.
        if row.optional_if_empty && !any_matched && original.trim().is_empty() {
            return RowOutcome::Matched(RowMatch {
                fields: row.fields.iter().map(|f| (f.name.clone(), None)).collect(),
                lines_consumed: 0,
            });
        }
        return RowOutcome::Failed;
    }

    RowOutcome::Matched(RowMatch {
        fields,
        lines_consumed: 0,
    })
}
