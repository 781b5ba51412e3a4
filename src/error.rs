//! Error types for the sheetparse crate.

use std::fmt;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// A format definition failed to load or resolve (dangling `parent` or
    /// `alternative_of` reference, unknown lambda, malformed structure).
    /// The offending definition is excluded from the registry.
    ConfigError(String),
    /// No registered format validates against the document's first page.
    NoMatchingFormat,
    /// A required context was absent partway through a document after a
    /// format had already been selected. This indicates a gap in format
    /// coverage, not a recoverable runtime condition.
    ContextError(String),
    InvalidRegex(String),
    YamlError(String),
    IoError(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::ConfigError(msg) => write!(f, "Format definition error: {msg}"),
            EngineError::NoMatchingFormat => {
                write!(f, "No registered format matches the document's first page")
            }
            EngineError::ContextError(msg) => {
                write!(f, "Required context failed mid-document: {msg}")
            }
            EngineError::InvalidRegex(pattern) => write!(f, "Invalid regex pattern: {pattern}"),
            EngineError::YamlError(msg) => write!(f, "YAML parsing error: {msg}"),
            EngineError::IoError(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::IoError(err.to_string())
    }
}

impl From<serde_yaml::Error> for EngineError {
    fn from(err: serde_yaml::Error) -> Self {
        EngineError::YamlError(err.to_string())
    }
}
