//! Format implementations
//!
//! Each submodule converts between UniAst and one surface syntax or renders it for a
//! consumer.

pub mod html;
pub mod json;
pub mod markdown;
pub mod ui_tree;

pub use html::HtmlFormat;
pub use json::JsonFormat;
pub use markdown::MarkdownFormat;
pub use ui_tree::UiTreeFormat;

use crate::ir::nodes::LinkTarget;
use crate::reference::{EntityType, ReferenceContext};

/// URL of a link or image target. Internal targets go through the reference context and
/// fall back to the raw reference.
pub(crate) fn target_url(
    ctx: &ReferenceContext,
    target: &LinkTarget,
    entity_type: EntityType,
) -> String {
    match target {
        LinkTarget::External { url } => url.clone(),
        LinkTarget::Internal {
            raw_reference,
            parsed_reference,
        } => parsed_reference
            .as_ref()
            .and_then(|reference| ctx.get_url_from_reference(reference))
            .or_else(|| ctx.url_for_raw(raw_reference, entity_type))
            .unwrap_or_else(|| {
                tracing::debug!(%raw_reference, "no url for internal target");
                raw_reference.clone()
            }),
    }
}
