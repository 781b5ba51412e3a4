//! Read-only registry of compiled format definitions.
//!
//! Registration order is a deliberate priority ranking: narrower formats
//! must be registered ahead of permissive generic fallbacks, and the
//! auto-detector picks the first one that validates. When loading from a
//! directory the corpus encodes this ranking in filename prefixes
//! (`1-…`, `2-…`), so files are taken in lexicographic order.

use crate::error::{EngineError, Result};
use crate::model::FormatDefinition;
use log::{debug, warn};
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct FormatRegistry {
    formats: Vec<FormatDefinition>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a compiled definition.
    ///
    /// # Errors
    /// Returns [`EngineError::ConfigError`] when a definition with the same
    /// name is already registered.
    pub fn register(&mut self, format: FormatDefinition) -> Result<()> {
        if self.get(format.name()).is_some() {
            return Err(EngineError::ConfigError(format!(
                "format '{}' is already registered",
                format.name()
            )));
        }
        debug!("registered format '{}'", format.name());
        self.formats.push(format);
        Ok(())
    }

    /// Compile and append one definition file body.
    pub fn register_yaml(&mut self, yaml: &str) -> Result<()> {
        self.register(FormatDefinition::from_yaml(yaml)?)
    }

    /// Load every `.yml`/`.yaml` file in `dir`, in lexicographic filename
    /// order. A definition that fails to compile or resolve is excluded
    /// and logged; loading continues. Returns the number registered.
    ///
    /// # Errors
    /// Only filesystem errors abort the load.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize> {
        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .collect::<std::io::Result<Vec<_>>>()?
            .into_iter()
            .map(|entry| entry.path())
            .filter(|path| {
                matches!(
                    path.extension().and_then(|e| e.to_str()),
                    Some("yml") | Some("yaml")
                )
            })
            .collect();
        paths.sort();

        let mut loaded = 0;
        for path in paths {
            let yaml = std::fs::read_to_string(&path)?;
            match self.register_yaml(&yaml) {
                Ok(()) => loaded += 1,
                Err(e) => warn!("excluding format definition {}: {e}", path.display()),
            }
        }
        Ok(loaded)
    }

    /// Registered definitions, in priority order.
    pub fn formats(&self) -> &[FormatDefinition] {
        &self.formats
    }

    pub fn get(&self, name: &str) -> Option<&FormatDefinition> {
        self.formats.iter().find(|f| f.name() == name)
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}
