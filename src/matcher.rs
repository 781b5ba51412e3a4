//! Context matching: the engine core.
//!
//! One *attempt slot* covers a context plus its registered alternatives:
//! the primary is tried first and, only when it fails at the same cursor,
//! each alternative is tried in definition order. At most one of them
//! produces a DAO per attempt, so a slot's output is always mutually
//! exclusive. A successful slot with `repeat` keeps attempting further
//! instances until one attempt fails; the failed attempt never moves the
//! cursor and the DAOs collected so far are kept.
//!
//! A failed optional context is a normal shape variation, never an error:
//! the cursor stays put and the caller moves on to the next sibling.

use crate::dao::ContextDao;
use crate::extractor::{self, RowOutcome};
use crate::model::{ContextId, FormatDefinition};
use log::debug;

/// Result of one attempt slot (a context plus its alternatives, with
/// repetition applied).
#[derive(Debug, Clone, PartialEq)]
pub enum SlotOutcome {
    /// One DAO per successful attempt; `cursor` is the row after the last
    /// consumed line.
    Matched {
        daos: Vec<ContextDao>,
        cursor: usize,
    },
    /// Nothing matched; the caller's cursor is unchanged.
    Failed,
}

impl SlotOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, SlotOutcome::Matched { .. })
    }
}

/// Attempt the slot anchored at `primary` against one page.
pub fn match_slot(
    fmt: &FormatDefinition,
    primary: ContextId,
    page: &[String],
    page_index: usize,
    cursor: usize,
) -> SlotOutcome {
    let mut daos: Vec<ContextDao> = Vec::new();
    let mut cur = cursor;

    loop {
        let Some((dao, new_cursor, matched)) =
            attempt_with_alternatives(fmt, primary, page, page_index, cur)
        else {
            break;
        };
        let advanced = new_cursor > cur;
        cur = new_cursor;
        daos.push(dao);
        // A zero-width match cannot repeat; without this the loop would
        // never leave the cursor.
        if !fmt.context(matched).repeat || !advanced || cur >= page.len() {
            break;
        }
    }

    if daos.is_empty() {
        SlotOutcome::Failed
    } else {
        SlotOutcome::Matched { daos, cursor: cur }
    }
}

/// Try the primary, then each alternative at the same cursor. Returns the
/// DAO, the caller's new cursor, and which context actually matched.
fn attempt_with_alternatives(
    fmt: &FormatDefinition,
    primary: ContextId,
    page: &[String],
    page_index: usize,
    cursor: usize,
) -> Option<(ContextDao, usize, ContextId)> {
    if let Some((dao, next)) = attempt_context(fmt, primary, page, page_index, cursor) {
        return Some((dao, next, primary));
    }
    for &alt in &fmt.context(primary).alternatives {
        if let Some((dao, next)) = attempt_context(fmt, alt, page, page_index, cursor) {
            debug!(
                "context '{}' failed at row {cursor}, alternative '{}' matched",
                fmt.context(primary).name,
                fmt.context(alt).name
            );
            return Some((dao, next, alt));
        }
    }
    None
}

/// One attempt of a single context: window admission, `starts_with` fast
/// fail, row sequencing, then recursive children. Failure leaves the
/// caller's cursor untouched.
fn attempt_context(
    fmt: &FormatDefinition,
    ctx_id: ContextId,
    page: &[String],
    page_index: usize,
    cursor: usize,
) -> Option<(ContextDao, usize)> {
    let ctx = fmt.context(ctx_id);

    let start = if ctx.eop {
        // Anchored to the page tail, independent of the forward cursor.
        page.len().saturating_sub(ctx.row_span)
    } else {
        if let Some(fixed) = ctx.at_fixed_row {
            if cursor != fixed {
                return None;
            }
        }
        if let Some(first) = ctx.starts_at_row {
            if cursor < first {
                return None;
            }
        }
        if let Some(last) = ctx.ends_at_row {
            if cursor > last {
                return None;
            }
        }
        cursor
    };

    if let Some(prefix) = &ctx.starts_with {
        match page.get(start) {
            Some(line) if line.starts_with(prefix.as_str()) => {}
            _ => return None,
        }
    }

    let mut dao = ContextDao::new(&ctx.name, page_index, start);
    let mut local = start;
    for row in &ctx.rows {
        match extractor::match_row(page, local, row) {
            RowOutcome::Matched(m) => {
                dao.fields.extend(m.fields);
                local += m.lines_consumed;
            }
            RowOutcome::Failed if row.required => return None,
            RowOutcome::Failed => {} // optional row: skip without consuming
        }
    }
    dao.line_range = (start, local);

    for &child in &ctx.children {
        match match_slot(fmt, child, page, page_index, local) {
            SlotOutcome::Matched { daos, cursor } => {
                dao.children.extend(daos);
                local = cursor;
            }
            SlotOutcome::Failed => {
                // A required child's absence fails this whole attempt; an
                // optional child is simply not there.
                if fmt.context(child).required {
                    return None;
                }
            }
        }
    }

    let next = if ctx.eop { page.len() } else { local };
    Some((dao, next))
}

/// Validate-only probe: does every required top-level slot (transitively,
/// through its required children) match this page at least once?
pub fn validate_page(fmt: &FormatDefinition, page: &[String]) -> bool {
    let mut cursor = 0;
    for &slot in fmt.top_level() {
        match match_slot(fmt, slot, page, 0, cursor) {
            SlotOutcome::Matched { cursor: next, .. } => cursor = next,
            SlotOutcome::Failed => {
                if fmt.context(slot).required {
                    debug!(
                        "format '{}' rejected: required context '{}' did not match",
                        fmt.name(),
                        fmt.context(slot).name
                    );
                    return false;
                }
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FormatDefinition;

    fn page(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    fn fmt(yaml: &str) -> FormatDefinition {
        FormatDefinition::from_yaml(yaml).unwrap()
    }

    #[test]
    fn test_header_two_rows() {
        let fmt = fmt(r#"
sample:
  - name: header
    rows:
      - name: title
        fields:
          - name: edition
            format: '^\s*(\d+)'
          - name: meeting_name
            format: '\s*(.+)$'
      - name: subtitle
        fields:
          - name: meeting_place
            format: '^\s*([^,]+),'
          - name: meeting_date
            format: '\s*(\d{2}/\d{2}/\d{4})'
"#);
        let page = page(&["   1 Meeting Name 2021", "  City, 10/05/2021"]);
        let SlotOutcome::Matched { daos, cursor } = match_slot(&fmt, 0, &page, 0, 0) else {
            panic!("header should match");
        };
        assert_eq!(cursor, 2);
        assert_eq!(daos.len(), 1);
        let dao = &daos[0];
        assert_eq!(dao.field("edition"), Some("1"));
        assert_eq!(dao.field("meeting_name"), Some("Meeting Name 2021"));
        assert_eq!(dao.field("meeting_place"), Some("City"));
        assert_eq!(dao.field("meeting_date"), Some("10/05/2021"));
        assert_eq!(dao.line_range, (0, 2));
    }

    #[test]
    fn test_repeat_stops_at_separator() {
        let fmt = fmt(r#"
sample:
  - name: results
    repeat: true
    fields:
      - name: rank
        format: '^\s*(\d+)'
      - name: swimmer
        format: '\s([A-Z]+)'
"#);
        let page = page(&[
            " 1 ROSSI",
            " 2 BIANCHI",
            " 3 VERDI",
            " 4 NERI",
            " 5 GIALLI",
            "",
            " 6 IGNORED",
        ]);
        let SlotOutcome::Matched { daos, cursor } = match_slot(&fmt, 0, &page, 0, 0) else {
            panic!("results should match");
        };
        // repetition stops at the separator without failing the context
        assert_eq!(daos.len(), 5);
        assert_eq!(cursor, 5);
        assert_eq!(daos[4].field("swimmer"), Some("GIALLI"));
    }

    #[test]
    fn test_optional_context_leaves_cursor_for_sibling() {
        let fmt = fmt(r#"
sample:
  - name: relay
    required: false
    format: '^Relay\s+(\w+)'
  - name: individual
    format: '^\s*(\d+)\s+\w+'
"#);
        let page = page(&[" 1 ROSSI"]);
        let SlotOutcome::Failed = match_slot(&fmt, 0, &page, 0, 0) else {
            panic!("relay should not match");
        };
        // sibling matches the very same line
        let SlotOutcome::Matched { cursor, .. } = match_slot(&fmt, 1, &page, 0, 0) else {
            panic!("individual should match");
        };
        assert_eq!(cursor, 1);
    }

    #[test]
    fn test_alternative_mutual_exclusivity() {
        let fmt = fmt(r#"
sample:
  - name: result
    format: '^\s*(\d+)\s+\w+'
  - name: result-dsq
    alternative_of: result
    required: false
    format: '^\s*(DSQ|DNS)\s+\w+'
"#);
        // primary wins when it matches
        let p1 = page(&[" 4 ROSSI"]);
        let SlotOutcome::Matched { daos, .. } = match_slot(&fmt, 0, &p1, 0, 0) else {
            panic!("slot should match");
        };
        assert_eq!(daos.len(), 1);
        assert_eq!(daos[0].context, "result");

        // alternative stands in only after the primary fails
        let p2 = page(&[" DSQ ROSSI"]);
        let SlotOutcome::Matched { daos, .. } = match_slot(&fmt, 0, &p2, 0, 0) else {
            panic!("slot should match via alternative");
        };
        assert_eq!(daos.len(), 1);
        assert_eq!(daos[0].context, "result-dsq");
    }

    #[test]
    fn test_repeat_interleaves_primary_and_alternative() {
        let fmt = fmt(r#"
sample:
  - name: result
    repeat: true
    format: '^\s*(\d+)\s+\w+'
  - name: result-dsq
    alternative_of: result
    required: false
    repeat: true
    format: '^\s*(DSQ)\s+\w+'
"#);
        let page = page(&[" 1 ROSSI", " DSQ BIANCHI", " 2 VERDI"]);
        let SlotOutcome::Matched { daos, cursor } = match_slot(&fmt, 0, &page, 0, 0) else {
            panic!("slot should match");
        };
        assert_eq!(cursor, 3);
        let names: Vec<&str> = daos.iter().map(|d| d.context.as_str()).collect();
        assert_eq!(names, vec!["result", "result-dsq", "result"]);
    }

    #[test]
    fn test_at_fixed_row_mismatch_fails() {
        let fmt = fmt(r#"
sample:
  - name: header
    at_fixed_row: 0
    format: '^(.+)$'
"#);
        let page = page(&["line a", "line b"]);
        assert!(match_slot(&fmt, 0, &page, 0, 0).is_match());
        assert_eq!(match_slot(&fmt, 0, &page, 0, 1), SlotOutcome::Failed);
    }

    #[test]
    fn test_row_window_admission() {
        let fmt = fmt(r#"
sample:
  - name: category
    starts_at_row: 2
    ends_at_row: 4
    format: '^Cat\s+(\w+)'
"#);
        let page = page(&["Cat A", "x", "Cat B", "x", "x", "Cat C"]);
        assert_eq!(match_slot(&fmt, 0, &page, 0, 0), SlotOutcome::Failed);
        assert!(match_slot(&fmt, 0, &page, 0, 2).is_match());
        assert_eq!(match_slot(&fmt, 0, &page, 0, 5), SlotOutcome::Failed);
    }

    #[test]
    fn test_eop_anchors_to_page_tail() {
        let fmt = fmt(r#"
sample:
  - name: footer
    eop: true
    row_span: 2
    rows:
      - name: line1
        format: '^Results by'
      - name: line2
        format: 'Page\s+(\d+)'
"#);
        let tail = page(&["data", "data", "Results by sheetparse", "      Page 1"]);
        let SlotOutcome::Matched { daos, cursor } = match_slot(&fmt, 0, &tail, 0, 0) else {
            panic!("footer should match at page tail");
        };
        assert_eq!(cursor, tail.len());
        assert_eq!(daos[0].line_range, (2, 4));

        // same text mid-page: the anchor window no longer covers it
        let mid = page(&["Results by sheetparse", "      Page 1", "data", "data"]);
        assert_eq!(match_slot(&fmt, 0, &mid, 0, 0), SlotOutcome::Failed);
    }

    #[test]
    fn test_starts_with_fast_fail() {
        let fmt = fmt(r#"
sample:
  - name: event
    starts_with: 'Event'
    format: '(\d+)'
"#);
        let page = page(&["Heat 12"]);
        assert_eq!(match_slot(&fmt, 0, &page, 0, 0), SlotOutcome::Failed);
    }

    #[test]
    fn test_children_nest_and_required_child_propagates() {
        let fmt = fmt(r#"
sample:
  - name: event
    format: '^Event\s+(\d+)'
  - name: results
    parent: event
    repeat: true
    format: '^\s*(\d+)\s+[A-Z]+'
"#);
        let ok = page(&["Event 3", " 1 ROSSI", " 2 BIANCHI"]);
        let SlotOutcome::Matched { daos, cursor } = match_slot(&fmt, 0, &ok, 0, 0) else {
            panic!("event should match");
        };
        assert_eq!(cursor, 3);
        assert_eq!(daos[0].children.len(), 2);
        assert_eq!(daos[0].children[0].context, "results");

        // no result rows at all: required child fails the parent, cursor
        // untouched for the caller
        let bad = page(&["Event 3", "no results here"]);
        assert_eq!(match_slot(&fmt, 0, &bad, 0, 0), SlotOutcome::Failed);
    }

    #[test]
    fn test_optional_child_absence_is_fine() {
        let fmt = fmt(r#"
sample:
  - name: event
    format: '^Event\s+(\d+)'
  - name: category
    parent: event
    required: false
    format: '^Category\s+(\w+)'
"#);
        let page = page(&["Event 3", "something else"]);
        let SlotOutcome::Matched { daos, .. } = match_slot(&fmt, 0, &page, 0, 0) else {
            panic!("event should match without its optional child");
        };
        assert!(daos[0].children.is_empty());
    }

    #[test]
    fn test_validate_page() {
        let fmt = fmt(r#"
sample:
  - name: header
    at_fixed_row: 0
    format: '^MEETING\s+(.+)$'
  - name: notes
    required: false
    format: '^notes:'
  - name: results
    repeat: true
    format: '^\s*(\d+)\s+[A-Z]+'
"#);
        let good = page(&["MEETING spring cup", " 1 ROSSI", " 2 BIANCHI"]);
        assert!(validate_page(&fmt, &good));

        let missing_header = page(&[" 1 ROSSI", " 2 BIANCHI"]);
        assert!(!validate_page(&fmt, &missing_header));
    }

    #[test]
    fn test_deterministic_matching() {
        let fmt = fmt(r#"
sample:
  - name: results
    repeat: true
    format: '^\s*(\d+)'
"#);
        let page = page(&[" 1", " 2", " 3"]);
        let first = match_slot(&fmt, 0, &page, 0, 0);
        let second = match_slot(&fmt, 0, &page, 0, 0);
        assert_eq!(first, second);
    }
}
