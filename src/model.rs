//! Resolved, compiled representation of a format definition.
//!
//! The raw [`crate::schema`] records are turned into a [`FormatDefinition`]:
//! name references (`parent`, `alternative_of`) become direct [`ContextId`]
//! links, field and row regexes are compiled once, implicit single-row sugar
//! is normalized into an explicit row, and every context's `row_span` is
//! derived when omitted. A `FormatDefinition` is immutable after this point
//! and safe to share across threads.

use crate::error::{EngineError, Result};
use crate::schema::{self, ContextSpec, FieldSpec, RowSpec};
use fancy_regex::Regex;

/// Index of a context within its owning [`FormatDefinition`].
pub type ContextId = usize;

/// Named post-processing transform applied to a raw extracted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lambda {
    /// Trim leading and trailing whitespace.
    Strip,
    /// Collapse internal whitespace runs to single spaces, then trim.
    Squeeze,
}

impl Lambda {
    fn from_name(name: &str) -> Result<Self> {
        match name {
            "strip" => Ok(Lambda::Strip),
            "squeeze" => Ok(Lambda::Squeeze),
            other => Err(EngineError::ConfigError(format!(
                "unknown lambda '{other}'"
            ))),
        }
    }

    pub fn apply(&self, raw: &str) -> String {
        match self {
            Lambda::Strip => raw.trim().to_string(),
            Lambda::Squeeze => raw.split_whitespace().collect::<Vec<_>>().join(" "),
        }
    }
}

/// Compiled field: one regex or column-offset rule yielding at most one value.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub pattern: Option<Regex>,
    pub token_start: Option<usize>,
    pub token_end: Option<usize>,
    pub pop_out: bool,
    pub lambda: Option<Lambda>,
    pub required: bool,
}

/// Compiled row: one or more consumed source lines holding ordered fields.
#[derive(Debug, Clone)]
pub struct Row {
    pub name: String,
    pub required: bool,
    pub row_span: usize,
    pub format: Option<Regex>,
    pub fields: Vec<Field>,
    pub optional_if_empty: bool,
    pub starts_with: Option<String>,
    /// `keys: skip_me` — the row validates shape but its captured values are
    /// excluded from the output key set.
    pub skip_keys: bool,
}

/// Compiled context: a named, tree-positioned unit of the layout grammar.
#[derive(Debug, Clone)]
pub struct Context {
    pub name: String,
    pub parent: Option<ContextId>,
    pub required: bool,
    pub repeat: bool,
    pub at_fixed_row: Option<usize>,
    pub starts_at_row: Option<usize>,
    pub ends_at_row: Option<usize>,
    pub eop: bool,
    /// Expected number of lines consumed; derived from the rows when omitted.
    pub row_span: usize,
    pub alternative_of: Option<ContextId>,
    pub starts_with: Option<String>,
    pub rows: Vec<Row>,
    /// Nested contexts, in definition order.
    pub children: Vec<ContextId>,
    /// Contexts that stand in for this one when it fails, in definition order.
    pub alternatives: Vec<ContextId>,
}

/// A compiled, immutable format definition.
#[derive(Debug, Clone)]
pub struct FormatDefinition {
    name: String,
    contexts: Vec<Context>,
    top_level: Vec<ContextId>,
}

impl FormatDefinition {
    /// Compile a definition from one YAML file body.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let (name, specs) = schema::parse_format_spec(yaml)?;
        Self::from_spec(name, specs)
    }

    /// Compile a definition from already-deserialized context records.
    ///
    /// # Errors
    /// Returns [`EngineError::ConfigError`] for duplicate context names,
    /// dangling `parent`/`alternative_of` references, parent cycles, unknown
    /// lambdas, or contexts with no rows, and
    /// [`EngineError::InvalidRegex`] when a pattern fails to compile.
    pub fn from_spec(name: String, specs: Vec<ContextSpec>) -> Result<Self> {
        if specs.is_empty() {
            return Err(EngineError::ConfigError(format!(
                "format '{name}' defines no contexts"
            )));
        }

        let mut ids = std::collections::HashMap::with_capacity(specs.len());
        for (id, spec) in specs.iter().enumerate() {
            if ids.insert(spec.name.clone(), id).is_some() {
                return Err(EngineError::ConfigError(format!(
                    "format '{name}' declares context '{}' twice",
                    spec.name
                )));
            }
        }

        let mut contexts = Vec::with_capacity(specs.len());
        for spec in &specs {
            let parent = match &spec.parent {
                Some(p) => Some(*ids.get(p).ok_or_else(|| {
                    EngineError::ConfigError(format!(
                        "format '{name}': context '{}' references unknown parent '{p}'",
                        spec.name
                    ))
                })?),
                None => None,
            };
            let alternative_of = match &spec.alternative_of {
                Some(a) => Some(*ids.get(a).ok_or_else(|| {
                    EngineError::ConfigError(format!(
                        "format '{name}': context '{}' is alternative_of unknown '{a}'",
                        spec.name
                    ))
                })?),
                None => None,
            };

            let rows = compile_rows(&name, spec)?;
            let row_span = spec
                .row_span
                .unwrap_or_else(|| rows.iter().map(|r| r.row_span).sum());

            contexts.push(Context {
                name: spec.name.clone(),
                parent,
                required: spec.required,
                repeat: spec.repeat,
                at_fixed_row: spec.at_fixed_row,
                starts_at_row: spec.starts_at_row,
                ends_at_row: spec.ends_at_row,
                eop: spec.eop,
                row_span,
                alternative_of,
                starts_with: spec.starts_with.clone(),
                rows,
                children: Vec::new(),
                alternatives: Vec::new(),
            });
        }

        check_parent_cycles(&name, &contexts)?;

        // Attach each context to its attempt slot: alternatives hang off
        // their primary, everything else off its parent or the root.
        let mut top_level = Vec::new();
        for id in 0..contexts.len() {
            if let Some(primary) = contexts[id].alternative_of {
                if primary == id {
                    return Err(EngineError::ConfigError(format!(
                        "format '{name}': context '{}' is alternative_of itself",
                        contexts[id].name
                    )));
                }
                contexts[primary].alternatives.push(id);
            } else if let Some(parent) = contexts[id].parent {
                contexts[parent].children.push(id);
            } else {
                top_level.push(id);
            }
        }

        if top_level.is_empty() {
            return Err(EngineError::ConfigError(format!(
                "format '{name}' has no top-level context"
            )));
        }

        Ok(Self {
            name,
            contexts,
            top_level,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contexts(&self) -> &[Context] {
        &self.contexts
    }

    pub fn context(&self, id: ContextId) -> &Context {
        &self.contexts[id]
    }

    /// Top-level attempt slots (contexts with no parent that are not
    /// themselves alternatives), in definition order.
    pub fn top_level(&self) -> &[ContextId] {
        &self.top_level
    }

    pub fn context_id(&self, name: &str) -> Option<ContextId> {
        self.contexts.iter().position(|c| c.name == name)
    }

    /// Validate-only probe against a single page; see
    /// [`crate::detector::detect`] for how registries use this.
    pub fn validates(&self, page: &[String]) -> bool {
        crate::matcher::validate_page(self, page)
    }
}

fn compile_regex(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| EngineError::InvalidRegex(format!("{pattern}: {e}")))
}

fn compile_field(spec: &FieldSpec) -> Result<Field> {
    let pattern = match &spec.format {
        Some(p) => Some(compile_regex(p)?),
        None => None,
    };
    if pattern.is_none() && spec.token_start.is_none() {
        return Err(EngineError::ConfigError(format!(
            "field '{}' has neither a format nor token offsets",
            spec.name
        )));
    }
    let lambda = match &spec.lambda {
        Some(l) => Some(Lambda::from_name(l)?),
        None => None,
    };
    Ok(Field {
        name: spec.name.clone(),
        pattern,
        token_start: spec.token_start,
        token_end: spec.token_end,
        pop_out: spec.pop_out,
        lambda,
        required: spec.required,
    })
}

fn compile_row(row: &RowSpec, fallback_name: &str, index: usize) -> Result<Row> {
    let format = match &row.format {
        Some(p) => Some(compile_regex(p)?),
        None => None,
    };
    let fields = match &row.fields {
        Some(fs) => fs.iter().map(compile_field).collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };
    if format.is_none() && fields.is_empty() {
        return Err(EngineError::ConfigError(format!(
            "row '{}' has neither a format nor fields",
            row.name.as_deref().unwrap_or(fallback_name)
        )));
    }
    Ok(Row {
        name: row
            .name
            .clone()
            .unwrap_or_else(|| format!("{fallback_name}.{index}")),
        required: row.required,
        row_span: row.row_span.unwrap_or(1),
        format,
        fields,
        optional_if_empty: row.optional_if_empty,
        starts_with: row.starts_with.clone(),
        skip_keys: row.keys.as_deref() == Some("skip_me"),
    })
}

fn compile_rows(format_name: &str, spec: &ContextSpec) -> Result<Vec<Row>> {
    match &spec.rows {
        Some(rows) => rows
            .iter()
            .enumerate()
            .map(|(i, r)| compile_row(r, &spec.name, i))
            .collect(),
        None => {
            // Sugar: `fields`/`format` directly on the context is a single
            // implicit row carrying the context's own name.
            if spec.fields.is_none() && spec.format.is_none() {
                return Err(EngineError::ConfigError(format!(
                    "format '{format_name}': context '{}' has no rows, fields or format",
                    spec.name
                )));
            }
            let implicit = RowSpec {
                name: Some(spec.name.clone()),
                required: true,
                row_span: spec.row_span,
                format: spec.format.clone(),
                fields: spec.fields.clone(),
                optional_if_empty: spec.optional_if_empty,
                starts_with: None,
                keys: spec.keys.clone(),
            };
            Ok(vec![compile_row(&implicit, &spec.name, 0)?])
        }
    }
}

fn check_parent_cycles(format_name: &str, contexts: &[Context]) -> Result<()> {
    for (id, ctx) in contexts.iter().enumerate() {
        let mut seen = 0;
        let mut cur = ctx.parent;
        while let Some(p) = cur {
            if p == id || seen > contexts.len() {
                return Err(EngineError::ConfigError(format!(
                    "format '{format_name}': parent cycle through context '{}'",
                    ctx.name
                )));
            }
            seen += 1;
            cur = contexts[p].parent;
        }
    }
    Ok(())
}
