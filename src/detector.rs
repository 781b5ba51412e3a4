//! First-page format auto-detection.

use crate::error::{EngineError, Result};
use crate::matcher;
use crate::model::FormatDefinition;
use crate::registry::FormatRegistry;
use log::debug;

/// Select the first registered format whose required contexts all validate
/// against the document's first page.
///
/// Candidates are probed in registration order; the order is a deliberate
/// priority ranking, so the first validating definition wins regardless of
/// how many lines any other candidate would match.
///
/// # Errors
/// Returns [`EngineError::NoMatchingFormat`] when no candidate validates.
pub fn detect<'a>(
    registry: &'a FormatRegistry,
    first_page: &[String],
) -> Result<&'a FormatDefinition> {
    for format in registry.formats() {
        if matcher::validate_page(format, first_page) {
            debug!("auto-detected format '{}'", format.name());
            return Ok(format);
        }
    }
    Err(EngineError::NoMatchingFormat)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    fn registry() -> FormatRegistry {
        let mut registry = FormatRegistry::new();
        registry
            .register_yaml(
                r#"
1-narrow:
  - name: header
    at_fixed_row: 0
    format: '^FEDERATION CHAMPIONSHIP\s+(.+)$'
  - name: results
    repeat: true
    format: '^\s*(\d+)\s+[A-Z]+'
"#,
            )
            .unwrap();
        registry
            .register_yaml(
                r#"
2-generic:
  - name: header
    at_fixed_row: 0
    format: '^\S.*(.)$'
  - name: results
    repeat: true
    format: '^\s*(\d+)\s+[A-Z]+'
"#,
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_first_validating_format_wins() {
        let registry = registry();
        // both candidates validate; registration order decides
        let page = page(&["FEDERATION CHAMPIONSHIP 2021", " 1 ROSSI"]);
        let format = detect(&registry, &page).unwrap();
        assert_eq!(format.name(), "1-narrow");
    }

    #[test]
    fn test_fallback_to_later_format() {
        let registry = registry();
        let page = page(&["Some other meeting title", " 1 ROSSI"]);
        let format = detect(&registry, &page).unwrap();
        assert_eq!(format.name(), "2-generic");
    }

    #[test]
    fn test_no_matching_format() {
        let registry = registry();
        let page = page(&["", ""]);
        let err = detect(&registry, &page).unwrap_err();
        assert_eq!(err, EngineError::NoMatchingFormat);
    }

    #[test]
    fn test_empty_registry() {
        let registry = FormatRegistry::new();
        let page = page(&["anything"]);
        assert_eq!(
            detect(&registry, &page).unwrap_err(),
            EngineError::NoMatchingFormat
        );
    }
}
