//! Export tests for Markdown format (UniAst → Markdown)
//!
//! Internal links go through a strategy; these tests cover each strategy over whole
//! documents, including the order remote lookups happen in.

use crate::common::{context, parse, to_markdown};
use async_trait::async_trait;
use insta::assert_snapshot;
use std::sync::{Arc, Mutex};
use uniast::formats::markdown::{
    serialize_markdown, FileSystemLinkSerializer, MetadataClient, RemoteLinkSerializer,
    WikiLinkSerializer,
};
use uniast::ir::nodes::{
    Alignment, Block, BlockStyles, InlineContent, Link, LinkTarget, Paragraph, Text, TextStyles,
    UniAst,
};
use uniast::reference::DocumentReference;
use uniast::ConversionError;

const PAGE: &str = "# Guide\n\nSee [[Docs/Setup]] and **bold** text.\n\n- one\n- [x] done\n";

#[tokio::test]
async fn test_wiki_document() {
    let markdown = to_markdown(&parse(PAGE), &WikiLinkSerializer).await;
    assert_snapshot!(markdown, @r"
    # Guide

    See [[Docs/Setup]] and **bold** text.

    - one
    - [x] done
    ");
}

#[tokio::test]
async fn test_filesystem_document() {
    let links = FileSystemLinkSerializer::new(context(), DocumentReference::new(["Docs"], "Guide"));
    let ast = parse(
        "[[Docs/Setup]] and [[guide|Other Space/Page]]\n\n![[chart|attach:Docs/Guide@flow.png]]\n",
    );
    let markdown = to_markdown(&ast, &links).await;

    assert!(markdown.contains("[Docs/Setup](../Setup)"), "{markdown}");
    assert!(markdown.contains("[guide](../../Other%20Space/Page)"), "{markdown}");
    assert!(markdown.contains("![chart](attachments/flow.png)"), "{markdown}");
}

#[tokio::test]
async fn test_filesystem_rejects_unresolvable_reference() {
    let links = FileSystemLinkSerializer::new(context(), DocumentReference::new(["Docs"], "Guide"));
    let ast = UniAst::new(vec![Block::paragraph(vec![InlineContent::Link(Link {
        target: LinkTarget::internal("bad|ref", None),
        content: vec![Text::plain("bad")],
    })])]);

    let result = serialize_markdown(&ast, &links).await;
    assert_eq!(
        result,
        Err(ConversionError::UnresolvedReference("bad|ref".into()))
    );
}

#[derive(Clone, Default)]
struct RecordingClient {
    calls: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl MetadataClient for RecordingClient {
    async fn document_id(&self, document: &DocumentReference) -> uniast::Result<String> {
        let path = document.segments().collect::<Vec<_>>().join("/");
        self.calls.lock().unwrap().push(path.clone());
        if document.name == "Missing" {
            return Err(ConversionError::LinkLookup {
                reference: path,
                message: "server answered 404 Not Found".into(),
            });
        }
        Ok(format!("id-{}", document.name))
    }
}

#[tokio::test]
async fn test_remote_lookups_follow_document_order() {
    let client = RecordingClient::default();
    let links = RemoteLinkSerializer::new(context(), client.clone(), "https://site/view/");
    let ast = parse(
        "[[Docs/Setup]] then [[caption|Docs/Other]]\n\n![[attach:Docs/Guide@flow.png]]\n",
    );
    let markdown = to_markdown(&ast, &links).await;

    assert!(
        markdown.contains(
            "[Docs/Setup](https://site/view/id-Setup) then [caption](https://site/view/id-Other)"
        ),
        "{markdown}"
    );
    assert!(
        markdown.contains("![](https://site/view/id-Guide/attachments/flow.png)"),
        "{markdown}"
    );
    assert_eq!(
        *client.calls.lock().unwrap(),
        vec!["Docs/Setup", "Docs/Other", "Docs/Guide"]
    );
}

#[tokio::test]
async fn test_remote_lookup_failure_fails_the_conversion() {
    let client = RecordingClient::default();
    let links = RemoteLinkSerializer::new(context(), client.clone(), "https://site/view");
    let ast = parse("[[Docs/Missing]] and [[Docs/Setup]]\n");

    let result = serialize_markdown(&ast, &links).await;
    assert!(matches!(
        result,
        Err(ConversionError::LinkLookup { reference, .. }) if reference == "Docs/Missing"
    ));
    assert_eq!(*client.calls.lock().unwrap(), vec!["Docs/Missing"]);
}

#[tokio::test]
async fn test_colors_and_alignment_are_dropped() {
    let colored = TextStyles {
        text_color: Some("red".into()),
        background_color: Some("yellow".into()),
        ..Default::default()
    };
    let ast = UniAst::new(vec![Block::Paragraph(Paragraph {
        content: vec![InlineContent::styled("centered", colored)],
        styles: BlockStyles {
            text_alignment: Some(Alignment::Center),
            ..Default::default()
        },
    })]);

    assert_eq!(to_markdown(&ast, &WikiLinkSerializer).await, "centered\n");
}
