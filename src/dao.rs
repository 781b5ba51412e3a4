//! Output tree assembled from successful context matches.
//!
//! A [`ContextDao`] is the runtime record of one matched context instance;
//! nesting mirrors the context tree and repeated contexts become ordered
//! lists. The assembled [`DocumentDao`] is the engine's complete output and
//! is handed to an external domain mapper, typically as JSON.

use serde_json::{json, Value};

/// One successful context match: ordered field values, child matches, and
/// the line range consumed on its page.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextDao {
    pub context: String,
    /// Field name -> extracted value, in extraction order. A `None` value
    /// records an optional field that did not match.
    pub fields: Vec<(String, Option<String>)>,
    pub children: Vec<ContextDao>,
    pub page: usize,
    /// Consumed rows on `page`, start inclusive, end exclusive.
    pub line_range: (usize, usize),
}

impl ContextDao {
    pub fn new(context: &str, page: usize, start_row: usize) -> Self {
        Self {
            context: context.to_string(),
            fields: Vec::new(),
            children: Vec::new(),
            page,
            line_range: (start_row, start_row),
        }
    }

    /// Look up a field value by name.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Child DAOs produced by a given nested context.
    pub fn children_named<'a>(&'a self, context: &'a str) -> impl Iterator<Item = &'a ContextDao> {
        self.children.iter().filter(move |c| c.context == context)
    }

    pub fn lines_consumed(&self) -> usize {
        self.line_range.1 - self.line_range.0
    }

    pub fn to_json(&self) -> Value {
        let fields: serde_json::Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, value)| {
                let v = match value {
                    Some(s) => Value::String(s.clone()),
                    None => Value::Null,
                };
                (name.clone(), v)
            })
            .collect();
        json!({
            "name": self.context,
            "fields": fields,
            "rows": self.children.iter().map(ContextDao::to_json).collect::<Vec<_>>(),
        })
    }
}

/// The engine's complete output for one document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentDao {
    pub format: String,
    pub contexts: Vec<ContextDao>,
    /// Set when a page boundary had to be accepted best-effort because an
    /// end-of-page marker was not found; the document should be reviewed.
    pub review_needed: bool,
}

impl DocumentDao {
    pub fn new(format: &str) -> Self {
        Self {
            format: format.to_string(),
            contexts: Vec::new(),
            review_needed: false,
        }
    }

    /// Top-level DAOs produced by a given context.
    pub fn contexts_named<'a>(&'a self, context: &'a str) -> impl Iterator<Item = &'a ContextDao> {
        self.contexts.iter().filter(move |c| c.context == context)
    }

    pub fn to_json(&self) -> Value {
        json!({
            "format": self.format,
            "review_needed": self.review_needed,
            "contexts": self.contexts.iter().map(ContextDao::to_json).collect::<Vec<_>>(),
        })
    }
}
