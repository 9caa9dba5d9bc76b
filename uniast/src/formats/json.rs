//! Persisted UniAst JSON
//!
//! The storage format: the tree serialized as is, with macros in their persisted form.
//! Parsing deserializes without wrapping, so macros reach the other formats as the
//! calls they are. Serializing runs [`save`](crate::transforms::save), which restores
//! any wrapper left by an editor [`load`](crate::transforms::load); a JSON → JSON
//! conversion is byte-stable.

use crate::error::{ConversionError, Result};
use crate::format::Format;
use crate::ir::nodes::UniAst;
use crate::transforms;
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

#[async_trait]
impl Format for JsonFormat {
    fn name(&self) -> &str {
        "json"
    }

    fn description(&self) -> &str {
        "Persisted UniAst JSON"
    }

    fn file_extensions(&self) -> &[&str] {
        &["json"]
    }

    fn supports_parsing(&self) -> bool {
        true
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn parse(&self, source: &str) -> Result<UniAst> {
        serde_json::from_str(source)
            .map_err(ConversionError::from)
            .inspect_err(|err| tracing::error!(error = %err, "json parsing failed"))
    }

    async fn serialize(&self, ast: &UniAst) -> Result<String> {
        transforms::save(ast)
    }
}
