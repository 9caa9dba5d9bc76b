//! Export tests for HTML format (UniAst → HTML)

use crate::common::{context, parse};
use insta::assert_snapshot;
use uniast::formats::html::{blocks_to_html, inline_contents_to_html};
use uniast::formats::HtmlFormat;
use uniast::ir::nodes::Block;
use uniast::{ConversionError, Format, FormatRegistry};

#[test]
fn test_document_fragment() {
    let ast = parse("# Guide\n\nSee [[Docs/Setup]] and **bold** text.\n\n- one\n- [x] done\n");
    let html = blocks_to_html(&ast.blocks, &context()).unwrap();
    assert_snapshot!(html, @r#"<h1>Guide</h1><p>See <a href="https://wiki.example.com/Docs/Setup">Docs/Setup</a> and <strong>bold</strong> text.</p><ul><li>one</li><li><input type="checkbox" disabled="" checked="">done</li></ul>"#);
}

#[test]
fn test_internal_image_uses_attachment_url() {
    let ast = parse("![[chart|attach:Docs/Guide@flow.png]]\n");
    let html = blocks_to_html(&ast.blocks, &context()).unwrap();
    assert_eq!(
        html,
        r#"<p><img src="https://wiki.example.com/Docs/Guide/attachments/flow.png" alt="chart"></p>"#
    );
}

#[test]
fn test_text_is_escaped() {
    let ast = parse("a < b & c\n");
    let Block::Paragraph(paragraph) = &ast.blocks[0] else {
        panic!("expected a paragraph");
    };
    let html = inline_contents_to_html(&paragraph.content, &context()).unwrap();
    assert_eq!(html, "a &lt; b &amp; c");
}

#[test]
fn test_macros_fail_the_conversion() {
    let ast = parse("Hello {{user /}}\n");
    let result = blocks_to_html(&ast.blocks, &context());
    assert!(matches!(
        result,
        Err(ConversionError::UnsupportedNode { node: "inlineMacro", reason })
            if reason == "nested macros are not supported yet"
    ));
}

#[tokio::test]
async fn test_registry_converts_markdown_to_html() {
    let registry = FormatRegistry::with_context(
        context(),
        uniast::formats::MarkdownFormat::default(),
    );
    let ast = registry.parse("> quote\n\n---\n", "markdown").unwrap();
    let html = registry.serialize(&ast, "html").await.unwrap();
    assert_eq!(html, "<blockquote><p>quote</p></blockquote><hr>");

    let direct = HtmlFormat::new(context()).serialize(&ast).await.unwrap();
    assert_eq!(direct, html);
    assert!(!HtmlFormat::default().supports_parsing());
    assert!(registry.parse("<p>x</p>", "html").is_err());
}
