//! # sheetparse
//!
//! A context-tree matching engine for turning plain-text renderings of
//! fixed-layout result sheets into structured records.
//!
//! Layout *formats* are declarative YAML definitions: a tree of named
//! contexts (header, event, category, results, footer, ...), each made of
//! rows, each row made of fields with regexes, fixed-column offsets and
//! transform rules. The engine loads many such definitions into a
//! priority-ordered registry, auto-detects which one fits a document's
//! first page, and walks the whole document to assemble a nested output
//! tree.
//!
//! ## Quick Start
//!
//! ```rust
//! use sheetparse::{Engine, FormatRegistry};
//!
//! let mut registry = FormatRegistry::new();
//! registry.register_yaml(r#"
//! 1-sample:
//!   - name: header
//!     at_fixed_row: 0
//!     fields:
//!       - name: meeting_name
//!         format: '^MEETING\s+(.+)$'
//!   - name: results
//!     repeat: true
//!     fields:
//!       - name: rank
//!         format: '^\s*(\d+)'
//!       - name: swimmer
//!         format: '\s([A-Z]+)$'
//! "#)?;
//!
//! let engine = Engine::new(registry);
//! let pages = vec![vec![
//!     "MEETING spring cup".to_string(),
//!     " 1 ROSSI".to_string(),
//!     " 2 BIANCHI".to_string(),
//! ]];
//!
//! let document = engine.parse_document(&pages)?;
//! assert_eq!(document.format, "1-sample");
//! assert_eq!(document.contexts_named("results").count(), 2);
//! # Ok::<(), sheetparse::EngineError>(())
//! ```
//!
//! ## Matching protocol
//!
//! - Contexts are tried in definition order; `required: false` contexts
//!   that do not match are a normal shape variation, never an error.
//! - A context with `repeat: true` keeps matching further instances until
//!   one attempt fails; the collected instances are kept.
//! - `alternative_of` declares a mutually exclusive stand-in, tried only
//!   after its primary fails at the same cursor.
//! - Fields are evaluated in order against a working copy of the row text;
//!   a `pop_out` field removes its matched span before the next field runs.
//! - `eop: true` anchors a context to the final lines of its page instead
//!   of the forward cursor.
//!
//! The regex engine is backtracking-capable ([`fancy_regex`]); the
//! definition corpus relies on atomic groups and lookaround.

pub mod dao;
pub mod detector;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod extractor;
pub mod matcher;
pub mod model;
pub mod registry;
pub mod schema;
pub mod walker;

// Primary engine interface
pub use engine::{Document, Engine};

// Core types and errors
pub use dao::{ContextDao, DocumentDao};
pub use error::{EngineError, Result};
pub use model::{Context, ContextId, Field, FormatDefinition, Lambda, Row};
pub use registry::FormatRegistry;

// Lower-level matching surface (for layout authoring tools and tests)
pub use detector::detect;
pub use evaluator::{evaluate, Evaluation};
pub use extractor::{match_row, RowMatch, RowOutcome};
pub use matcher::{match_slot, validate_page, SlotOutcome};
pub use walker::parse;
