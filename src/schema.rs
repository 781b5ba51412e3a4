//! Serde model of the persisted format-definition files.
//!
//! Each YAML file yields exactly one top-level named entry containing a list
//! of context records. The key names in these structs are the on-disk
//! contract and must stay bit-exact for compatibility with the existing
//! corpus of hand-authored definitions.

use crate::error::{EngineError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;

/// One context record, as written in a definition file.
#[derive(Debug, Clone, Deserialize)]
pub struct ContextSpec {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default)]
    pub repeat: bool,
    #[serde(default)]
    pub at_fixed_row: Option<usize>,
    #[serde(default)]
    pub starts_at_row: Option<usize>,
    #[serde(default)]
    pub ends_at_row: Option<usize>,
    #[serde(default)]
    pub row_span: Option<usize>,
    #[serde(default)]
    pub eop: bool,
    #[serde(default)]
    pub alternative_of: Option<String>,
    #[serde(default)]
    pub starts_with: Option<String>,
    #[serde(default)]
    pub rows: Option<Vec<RowSpec>>,
    // Sugar: a context with `fields`/`format` directly is a single implicit row.
    #[serde(default)]
    pub fields: Option<Vec<FieldSpec>>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub keys: Option<String>,
    #[serde(default)]
    pub optional_if_empty: bool,
}

/// One row record within a context.
#[derive(Debug, Clone, Deserialize)]
pub struct RowSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default)]
    pub row_span: Option<usize>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub fields: Option<Vec<FieldSpec>>,
    #[serde(default)]
    pub optional_if_empty: bool,
    #[serde(default)]
    pub starts_with: Option<String>,
    #[serde(default)]
    pub keys: Option<String>,
}

/// One field record within a row.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub token_start: Option<usize>,
    #[serde(default)]
    pub token_end: Option<usize>,
    #[serde(default = "default_true")]
    pub pop_out: bool,
    #[serde(default)]
    pub lambda: Option<String>,
    #[serde(default = "default_true")]
    pub required: bool,
}

fn default_true() -> bool {
    true
}

/// A whole definition file: `(format name, context list)`.
pub type FormatSpec = (String, Vec<ContextSpec>);

/// Parse one definition file body.
///
/// # Errors
/// Returns [`EngineError::YamlError`] on malformed YAML and
/// [`EngineError::ConfigError`] when the file does not hold exactly one
/// named format entry.
pub fn parse_format_spec(yaml: &str) -> Result<FormatSpec> {
    let doc: BTreeMap<String, Vec<ContextSpec>> = serde_yaml::from_str(yaml)?;
    if doc.len() != 1 {
        return Err(EngineError::ConfigError(format!(
            "expected exactly one named format entry per file, found {}",
            doc.len()
        )));
    }
    // len() == 1 checked above
    let (name, contexts) = doc.into_iter().next().ok_or_else(|| {
        EngineError::ConfigError("expected exactly one named format entry per file".to_string())
    })?;
    Ok((name, contexts))
}
