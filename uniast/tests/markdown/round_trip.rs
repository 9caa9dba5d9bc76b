//! Markdown → UniAst → Markdown → UniAst keeps the tree.

use crate::common::{paragraph_at, parse, to_markdown};
use uniast::formats::markdown::WikiLinkSerializer;
use uniast::ir::nodes::{Block, InlineContent, MacroBody, MacroInvocation, MacroNode, UniAst};

async fn assert_round_trip(source: &str) {
    let first = parse(source);
    let markdown = to_markdown(&first, &WikiLinkSerializer).await;
    let second = parse(&markdown);
    assert_eq!(first, second, "markdown written was:\n{markdown}");
}

async fn assert_tree_round_trip(ast: UniAst) {
    let markdown = to_markdown(&ast, &WikiLinkSerializer).await;
    assert_eq!(parse(&markdown), ast, "markdown written was:\n{markdown}");
}

#[tokio::test]
async fn test_inline_styles() {
    assert_round_trip("Some **bold**, *italic*, ~~struck~~, <u>under</u> and `code`.\n").await;
}

#[tokio::test]
async fn test_wiki_links_and_images() {
    assert_round_trip(
        "See [[Docs/Setup]], [[the **guide**|Docs/Guide]] and ![[chart|attach:Docs/Guide@flow.png]].\n",
    )
    .await;
}

#[tokio::test]
async fn test_backend_urls_become_wiki_links() {
    assert_round_trip("[setup](https://wiki.example.com/Docs/Setup) and [site](https://example.org)\n")
        .await;
}

#[tokio::test]
async fn test_lists() {
    assert_round_trip("- one\n  - nested\n- two\n\nBetween\n\n1. first\n2. second\n\n- [ ] open\n- [x] closed\n")
        .await;
}

#[tokio::test]
async fn test_blocks() {
    assert_round_trip(
        "# Title\n\n> quoted **text**\n\n```rust\nfn main() {}\n```\n\n---\n\n| a | b |\n|---|---|\n| 1 | [[Docs/Setup]] |\n",
    )
    .await;
}

#[tokio::test]
async fn test_macros() {
    assert_round_trip(
        "{{toc depth=\"2\" /}}\n\nHello {{user id=\"7\" /}}!\n\n{{info title=\"Note\"}}\n\nBody **text**\n\n{{/info}}\n",
    )
    .await;
}

#[tokio::test]
async fn test_macro_syntax_in_text_stays_text() {
    assert_tree_round_trip(UniAst::new(vec![
        Block::paragraph(vec![InlineContent::text("{{info /}}")]),
        Block::paragraph(vec![InlineContent::text("a {{user id=\"7\" /}} b {{{ c")]),
    ]))
    .await;
}

#[tokio::test]
async fn test_raw_bodies() {
    let raw = |id: &str, content: &str| {
        Block::MacroBlock(MacroNode::new(
            MacroInvocation::new(id)
                .with_param("t", "x y")
                .with_body(MacroBody::Raw {
                    content: content.into(),
                }),
        ))
    };
    assert_tree_round_trip(UniAst::new(vec![
        raw("code", "l1\n\nl2"),
        raw("code", "one line"),
        raw("sql", "select 1;\n```\nend\n"),
    ]))
    .await;
}

#[tokio::test]
async fn test_block_image_reads_back_as_paragraph() {
    let written = parse("![[chart|attach:Docs/Guide@flow.png]]\n");
    let InlineContent::Image(image) = paragraph_at(&written, 0)[0].clone() else {
        panic!("expected an inline image");
    };

    let block = UniAst::new(vec![Block::Image(image)]);
    let markdown = to_markdown(&block, &WikiLinkSerializer).await;
    assert_eq!(markdown, "![[chart|attach:Docs/Guide@flow.png]]\n");
    assert_eq!(parse(&markdown), written);
}
