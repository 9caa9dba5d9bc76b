//! Import tests for Markdown format (Markdown → UniAst)

use crate::common::{context, paragraph_at, parse};
use proptest::prelude::*;
use uniast::formats::markdown::{parse_markdown_with, MarkdownParserOptions};
use uniast::ir::nodes::{Block, InlineContent, LinkTarget, MacroBody, Text, TextStyles};
use uniast::reference::{AttachmentReference, DocumentReference, EntityReference};

fn link_raw(inline: &InlineContent) -> Option<&str> {
    match inline {
        InlineContent::Link(link) => match &link.target {
            LinkTarget::Internal { raw_reference, .. } => Some(raw_reference),
            LinkTarget::External { .. } => None,
        },
        _ => None,
    }
}

#[test]
fn test_internal_link_without_caption() {
    let ast = parse("See [[Docs/Setup]].\n");
    let content = paragraph_at(&ast, 0);

    assert_eq!(content.len(), 3);
    assert_eq!(content[0], InlineContent::text("See "));
    let InlineContent::Link(link) = &content[1] else {
        panic!("expected a link, got {}", content[1].kind());
    };
    assert_eq!(
        link.target,
        LinkTarget::internal(
            "Docs/Setup",
            Some(EntityReference::Document(DocumentReference::new(
                ["Docs"],
                "Setup"
            )))
        )
    );
    assert_eq!(link.content, vec![Text::plain("Docs/Setup")]);
    assert_eq!(content[2], InlineContent::text("."));
}

#[test]
fn test_caption_keeps_styles() {
    let ast = parse("[[**Bold** words|Docs/Setup]]\n");
    let content = paragraph_at(&ast, 0);

    let InlineContent::Link(link) = &content[0] else {
        panic!("expected a link");
    };
    let bold = TextStyles {
        bold: true,
        ..Default::default()
    };
    assert_eq!(
        link.content,
        vec![
            Text {
                content: "Bold".into(),
                styles: bold
            },
            Text::plain(" words"),
        ]
    );
}

#[test]
fn test_caption_split_on_last_bar() {
    let ast = parse("[[a|b|Docs/Setup]]\n");
    let InlineContent::Link(link) = &paragraph_at(&ast, 0)[0] else {
        panic!("expected a link");
    };
    assert_eq!(link.content, vec![Text::plain("a|b")]);
    assert_eq!(link_raw(&paragraph_at(&ast, 0)[0]), Some("Docs/Setup"));
}

#[test]
fn test_image_rule_runs_before_link_rule() {
    let ast = parse("![[flow chart|attach:Docs/Guide@flow.png]]\n");
    let content = paragraph_at(&ast, 0);

    assert_eq!(content.len(), 1);
    let InlineContent::Image(image) = &content[0] else {
        panic!("expected an image, got {}", content[0].kind());
    };
    assert_eq!(image.alt.as_deref(), Some("flow chart"));
    assert_eq!(
        image.target,
        LinkTarget::internal(
            "attach:Docs/Guide@flow.png",
            Some(EntityReference::Attachment(AttachmentReference {
                document: DocumentReference::new(["Docs"], "Guide"),
                name: "flow.png".into(),
            }))
        )
    );
}

#[test]
fn test_image_without_caption_has_no_alt() {
    let ast = parse("![[Docs/Guide@flow.png]]\n");
    let InlineContent::Image(image) = &paragraph_at(&ast, 0)[0] else {
        panic!("expected an image");
    };
    assert_eq!(image.alt, None);
    assert!(matches!(
        &image.target,
        LinkTarget::Internal {
            parsed_reference: Some(EntityReference::Attachment(_)),
            ..
        }
    ));
}

#[test]
fn test_nested_brackets_match_whole() {
    let ast = parse("[[a[[b]]c]]\n");
    let content = paragraph_at(&ast, 0);
    assert_eq!(content.len(), 1);
    assert_eq!(link_raw(&content[0]), Some("a[[b]]c"));
}

#[test]
fn test_nested_matching_can_be_disabled() {
    let options = MarkdownParserOptions {
        nested_internal_links: false,
    };
    let ast = parse_markdown_with("[[a[[b]]c]]\n", &context(), options).unwrap();
    let content = paragraph_at(&ast, 0);

    assert_eq!(link_raw(&content[0]), Some("a[[b"));
    assert_eq!(content[1], InlineContent::text("c]]"));
}

#[test]
fn test_escaped_brackets_stay_text() {
    let ast = parse("\\[[Docs/Setup]]\n");
    assert_eq!(
        paragraph_at(&ast, 0),
        &[InlineContent::text("[[Docs/Setup]]")]
    );
}

#[test]
fn test_brackets_in_code_spans_never_count() {
    let ast = parse("[[a `]]` b]]\n");
    let content = paragraph_at(&ast, 0);
    assert!(
        content.iter().all(|inline| link_raw(inline).is_none()),
        "{content:?}"
    );
}

#[test]
fn test_unclosed_link_stays_literal() {
    let ast = parse("an [[open link\n");
    assert_eq!(
        paragraph_at(&ast, 0),
        &[InlineContent::text("an [[open link")]
    );
}

#[test]
fn test_standard_links_resolve_through_urls() {
    let ast = parse(
        "[setup](https://wiki.example.com/Docs/Setup) and [site](https://example.org)\n",
    );
    let content = paragraph_at(&ast, 0);

    assert_eq!(link_raw(&content[0]), Some("Docs/Setup"));
    let InlineContent::Link(external) = &content[2] else {
        panic!("expected a link");
    };
    assert_eq!(external.target, LinkTarget::external("https://example.org"));
    assert_eq!(external.content, vec![Text::plain("site")]);
}

#[test]
fn test_standard_image_to_attachment_url_is_internal() {
    let ast = parse("![logo](https://wiki.example.com/Docs/Guide/attachments/logo.png)\n");
    let InlineContent::Image(image) = &paragraph_at(&ast, 0)[0] else {
        panic!("expected an image");
    };
    assert_eq!(image.alt.as_deref(), Some("logo"));
    assert!(matches!(
        &image.target,
        LinkTarget::Internal { raw_reference, .. } if raw_reference == "attach:Docs/Guide@logo.png"
    ));
}

#[test]
fn test_macros_block_and_inline() {
    let ast = parse("{{toc depth=\"2\" /}}\n\nHello {{user id=\"7\" /}}!\n");

    let Block::MacroBlock(block) = &ast.blocks[0] else {
        panic!("expected a block macro, got {}", ast.blocks[0].kind());
    };
    assert_eq!(block.call.id, "toc");
    assert_eq!(block.call.params["depth"], "2");
    assert_eq!(block.call.body, MacroBody::None);

    let content = paragraph_at(&ast, 1);
    assert_eq!(content[0], InlineContent::text("Hello "));
    let InlineContent::InlineMacro(inline) = &content[1] else {
        panic!("expected an inline macro");
    };
    assert_eq!(inline.call.id, "user");
    assert_eq!(inline.call.params["id"], "7");
    assert_eq!(content[2], InlineContent::text("!"));
}

#[test]
fn test_macro_spanning_blocks_gets_wysiwyg_body() {
    let ast = parse("{{info title=\"Note\"}}\n\nBody [[Docs/Setup]]\n\n- item\n\n{{/info}}\n\nAfter\n");

    assert_eq!(ast.blocks.len(), 2);
    let Block::MacroBlock(node) = &ast.blocks[0] else {
        panic!("expected a block macro");
    };
    let MacroBody::Wysiwyg { content } = &node.call.body else {
        panic!("expected a wysiwyg body");
    };
    assert_eq!(content.len(), 2);
    assert_eq!(content[1].kind(), "bulletListItem");
    assert_eq!(paragraph_at(&ast, 1), &[InlineContent::text("After")]);
}

#[test]
fn test_underline_and_breaks() {
    let ast = parse("<u>under</u>\nnext\n");
    let underline = TextStyles {
        underline: true,
        ..Default::default()
    };
    assert_eq!(
        paragraph_at(&ast, 0),
        &[
            InlineContent::styled("under", underline),
            InlineContent::text("\nnext"),
        ]
    );
}

#[test]
fn test_table_header_and_rows() {
    let ast = parse("| h1 | h2 |\n|----|----|\n| a | [[Docs/Setup]] |\n");
    let Block::Table(table) = &ast.blocks[0] else {
        panic!("expected a table");
    };
    assert_eq!(table.columns.len(), 2);
    assert_eq!(
        table.columns[0].header_cell.as_ref().map(|cell| cell.content.clone()),
        Some(vec![InlineContent::text("h1")])
    );
    assert_eq!(table.rows.len(), 1);
    assert_eq!(link_raw(&table.rows[0][1].content[0]), Some("Docs/Setup"));
}

proptest! {
    #[test]
    fn closed_brackets_always_link(prefix in "[a-z]{0,10}", reference in "[A-Za-z0-9][A-Za-z0-9/]{0,15}") {
        let ast = parse(&format!("{prefix}[[{reference}]]\n"));
        let content = paragraph_at(&ast, 0);
        prop_assert_eq!(link_raw(&content[content.len() - 1]), Some(reference.as_str()));
    }

    #[test]
    fn unclosed_brackets_stay_text(reference in "[A-Za-z0-9][A-Za-z0-9/ ]{0,15}[A-Za-z0-9]") {
        let source = format!("[[{reference}");
        let ast = parse(&format!("{source}\n"));
        prop_assert_eq!(paragraph_at(&ast, 0), &[InlineContent::text(source)]);
    }
}
