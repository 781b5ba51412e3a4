//! High-level engine: a format registry plus detect-then-parse.

use crate::dao::DocumentDao;
use crate::detector;
use crate::error::{EngineError, Result};
use crate::registry::FormatRegistry;
use crate::walker;
use rayon::prelude::*;
use std::path::Path;

/// A document handed to the engine: ordered pages, each an ordered list of
/// plain-text lines produced by the upstream PDF-to-text converter.
pub type Document = Vec<Vec<String>>;

/// Detect-then-parse facade over a read-only [`FormatRegistry`].
///
/// The registry is built once and never mutated afterwards, so one engine
/// can serve any number of concurrently processed documents without locks.
#[derive(Debug, Clone)]
pub struct Engine {
    registry: FormatRegistry,
}

impl Engine {
    pub fn new(registry: FormatRegistry) -> Self {
        Self { registry }
    }

    /// Build an engine from a directory of definition files; see
    /// [`FormatRegistry::load_dir`] for the ordering and exclusion rules.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let mut registry = FormatRegistry::new();
        registry.load_dir(dir)?;
        Ok(Self::new(registry))
    }

    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    /// Auto-detect the format from the first page, then walk the whole
    /// document.
    ///
    /// # Errors
    /// [`EngineError::NoMatchingFormat`] when the document is empty or no
    /// registered format validates its first page;
    /// [`EngineError::ContextError`] when a required context fails after
    /// format selection.
    pub fn parse_document(&self, pages: &[Vec<String>]) -> Result<DocumentDao> {
        let first_page = pages.first().ok_or(EngineError::NoMatchingFormat)?;
        let format = detector::detect(&self.registry, first_page)?;
        walker::parse(pages, format)
    }

    /// Parse many documents in parallel. Each document is an independent
    /// sequential walk over the shared registry; outcomes keep input order.
    pub fn parse_batch(&self, documents: &[Document]) -> Vec<Result<DocumentDao>> {
        documents
            .par_iter()
            .map(|pages| self.parse_document(pages))
            .collect()
    }
}
