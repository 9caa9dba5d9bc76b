//! Format registry for format discovery and selection
//!
//! Formats are registered under their name and looked up by name or by file extension.

use crate::error::{ConversionError, Result};
use crate::format::Format;
use crate::formats::{HtmlFormat, JsonFormat, MarkdownFormat, UiTreeFormat};
use crate::ir::nodes::UniAst;
use crate::reference::ReferenceContext;
use std::collections::HashMap;

/// Registry of document formats
///
/// # Examples
///
/// ```ignore
/// let registry = FormatRegistry::with_defaults();
/// let ast = registry.parse("# Title", "markdown")?;
/// let html = registry.serialize(&ast, "html").await?;
/// ```
pub struct FormatRegistry {
    formats: HashMap<String, Box<dyn Format>>,
}

impl FormatRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        FormatRegistry {
            formats: HashMap::new(),
        }
    }

    /// Register a format, replacing any format with the same name.
    pub fn register<F: Format + 'static>(&mut self, format: F) {
        self.formats
            .insert(format.name().to_string(), Box::new(format));
    }

    pub fn get(&self, name: &str) -> Result<&dyn Format> {
        self.formats
            .get(name)
            .map(|f| f.as_ref())
            .ok_or_else(|| ConversionError::FormatNotFound(name.to_string()))
    }

    pub fn has(&self, name: &str) -> bool {
        self.formats.contains_key(name)
    }

    /// List all available format names (sorted)
    pub fn list_formats(&self) -> Vec<String> {
        let mut names: Vec<_> = self.formats.keys().cloned().collect();
        names.sort();
        names
    }

    /// Name of the format claiming the extension of `filename`, if any.
    pub fn detect_format_from_filename(&self, filename: &str) -> Option<String> {
        let extension = std::path::Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())?;

        self.formats
            .values()
            .find(|format| format.file_extensions().contains(&extension))
            .map(|format| format.name().to_string())
    }

    /// Parse source text using the specified format
    pub fn parse(&self, source: &str, format: &str) -> Result<UniAst> {
        let fmt = self.get(format)?;
        if !fmt.supports_parsing() {
            return Err(ConversionError::NotSupported(format!(
                "Format '{format}' does not support parsing"
            )));
        }
        fmt.parse(source)
    }

    /// Serialize a document using the specified format
    pub async fn serialize(&self, ast: &UniAst, format: &str) -> Result<String> {
        let fmt = self.get(format)?;
        if !fmt.supports_serialization() {
            return Err(ConversionError::NotSupported(format!(
                "Format '{format}' does not support serialization"
            )));
        }
        fmt.serialize(ast).await
    }

    /// Built-in formats sharing one reference context.
    pub fn with_context(ctx: ReferenceContext, markdown: MarkdownFormat) -> Self {
        let mut registry = Self::new();
        registry.register(markdown);
        registry.register(JsonFormat);
        registry.register(HtmlFormat::new(ctx.clone()));
        registry.register(UiTreeFormat::new(ctx));
        registry
    }

    /// Create a registry with default formats
    pub fn with_defaults() -> Self {
        Self::with_context(ReferenceContext::default(), MarkdownFormat::default())
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
