//! Shared fixtures: a path reference context rooted at a fixed base URL.

use uniast::formats::markdown::{parse_markdown, serialize_markdown, InternalLinkSerializer};
use uniast::ir::nodes::{Block, InlineContent, UniAst};
use uniast::reference::PathReferenceService;
use uniast::ReferenceContext;

pub const BASE_URL: &str = "https://wiki.example.com";

pub fn context() -> ReferenceContext {
    ReferenceContext::from_service(PathReferenceService::new(BASE_URL))
}

pub fn parse(source: &str) -> UniAst {
    parse_markdown(source, &context()).expect("markdown to parse")
}

pub async fn to_markdown(ast: &UniAst, links: &dyn InternalLinkSerializer) -> String {
    serialize_markdown(ast, links)
        .await
        .expect("markdown to serialize")
}

/// Inline content of the paragraph at `index`.
pub fn paragraph_at(ast: &UniAst, index: usize) -> &[InlineContent] {
    match &ast.blocks[index] {
        Block::Paragraph(paragraph) => &paragraph.content,
        other => panic!("expected a paragraph, got {}", other.kind()),
    }
}
