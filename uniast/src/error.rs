//! Error types for conversion operations

use thiserror::Error;

/// Errors that can occur while parsing, rendering or serializing a UniAst tree
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// Format not found in registry
    #[error("Format '{0}' not found")]
    FormatNotFound(String),
    /// Error during parsing
    #[error("Parse error: {0}")]
    ParseError(String),
    /// Error during serialization
    #[error("Serialization error: {0}")]
    SerializationError(String),
    /// Format does not support the requested direction
    #[error("Operation not supported: {0}")]
    NotSupported(String),
    /// A node kind the target cannot represent (e.g. a macro inside HTML output)
    #[error("Unsupported node '{node}': {reason}")]
    UnsupportedNode { node: &'static str, reason: String },
    /// A caller broke the contract of a renderer (editable area slot misuse)
    #[error("Contract violation: {0}")]
    ContractViolation(String),
    /// A reference whose serialization is mandatory could not be resolved
    #[error("Unresolved reference '{0}'")]
    UnresolvedReference(String),
    /// The remote link lookup failed
    #[error("Link lookup failed for '{reference}': {message}")]
    LinkLookup { reference: String, message: String },
    /// Persisted JSON did not match the UniAst schema
    #[error("Invalid UniAst JSON: {0}")]
    InvalidJson(String),
}

impl From<serde_json::Error> for ConversionError {
    fn from(err: serde_json::Error) -> Self {
        ConversionError::InvalidJson(err.to_string())
    }
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, ConversionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            ConversionError::FormatNotFound("pdf".into()).to_string(),
            "Format 'pdf' not found"
        );
        assert_eq!(
            ConversionError::UnsupportedNode {
                node: "macroBlock",
                reason: "nested macros are not supported yet".into(),
            }
            .to_string(),
            "Unsupported node 'macroBlock': nested macros are not supported yet"
        );
    }

    #[test]
    fn test_from_serde_json() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let converted: ConversionError = err.into();
        assert!(matches!(converted, ConversionError::InvalidJson(_)));
    }
}
