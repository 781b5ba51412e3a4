//! Document walking: drives the context matcher across every page of a
//! document and assembles the output tree.
//!
//! Each page gets a full pass over the format's top-level attempt slots in
//! definition order, threading the row cursor through the page; result
//! sheets repeat their header block on every page, so the sequence applies
//! page after page. An `eop` slot ends the current page's processing and
//! the walk resumes on the following page.

use crate::dao::DocumentDao;
use crate::error::{EngineError, Result};
use crate::matcher::{self, SlotOutcome};
use crate::model::FormatDefinition;
use log::warn;

/// Parse a whole document (pages of lines) with an already-selected format.
///
/// # Errors
/// Once a format is selected there is no partial success mode: a required
/// non-`eop` context that fails partway through is a gap in format
/// coverage and surfaces as [`EngineError::ContextError`]. The one soft
/// spot is a required `eop` context whose end-of-page marker is missing:
/// pagination markers are heuristic, so the page boundary is accepted
/// anyway and the document is flagged for review.
pub fn parse(pages: &[Vec<String>], format: &FormatDefinition) -> Result<DocumentDao> {
    let mut doc = DocumentDao::new(format.name());

    for (page_index, page) in pages.iter().enumerate() {
        if page.is_empty() {
            continue;
        }
        let mut cursor = 0;
        for &slot in format.top_level() {
            let ctx = format.context(slot);
            match matcher::match_slot(format, slot, page, page_index, cursor) {
                SlotOutcome::Matched { daos, cursor: next } => {
                    doc.contexts.extend(daos);
                    cursor = next;
                    if ctx.eop {
                        break;
                    }
                }
                SlotOutcome::Failed if !ctx.required => {}
                SlotOutcome::Failed if ctx.eop => {
                    warn!(
                        "end-of-page marker '{}' not found on page {page_index}; \
                         accepting the boundary and flagging for review",
                        ctx.name
                    );
                    doc.review_needed = true;
                    break;
                }
                SlotOutcome::Failed => {
                    return Err(EngineError::ContextError(format!(
                        "context '{}' did not match on page {page_index} at row {cursor}",
                        ctx.name
                    )));
                }
            }
        }
    }

    Ok(doc)
}
