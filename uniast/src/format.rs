//! Format trait definition
//!
//! Every surface syntax the engine reads or writes implements [`Format`], so callers
//! (the CLI, the registry) handle them uniformly. Serialization is async because the
//! Markdown link strategies may look references up over the network.

use crate::error::{ConversionError, Result};
use crate::ir::nodes::UniAst;
use async_trait::async_trait;

/// Trait for document formats
///
/// # Examples
///
/// ```ignore
/// struct MyFormat;
///
/// #[async_trait]
/// impl Format for MyFormat {
///     fn name(&self) -> &str {
///         "my-format"
///     }
///
///     fn supports_serialization(&self) -> bool {
///         true
///     }
///
///     async fn serialize(&self, ast: &UniAst) -> Result<String> {
///         Ok(format!("{} blocks", ast.blocks.len()))
///     }
/// }
/// ```
#[async_trait]
pub trait Format: Send + Sync {
    /// The name of this format (e.g., "markdown", "html")
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// File extensions without the leading dot, used for detection from filenames.
    fn file_extensions(&self) -> &[&str] {
        &[]
    }

    fn supports_parsing(&self) -> bool {
        false
    }

    fn supports_serialization(&self) -> bool {
        false
    }

    /// Parse source text into a tree. Defaults to `NotSupported`.
    fn parse(&self, _source: &str) -> Result<UniAst> {
        Err(ConversionError::NotSupported(format!(
            "Format '{}' does not support parsing",
            self.name()
        )))
    }

    /// Serialize a tree into source text. Defaults to `NotSupported`.
    async fn serialize(&self, _ast: &UniAst) -> Result<String> {
        Err(ConversionError::NotSupported(format!(
            "Format '{}' does not support serialization",
            self.name()
        )))
    }
}
