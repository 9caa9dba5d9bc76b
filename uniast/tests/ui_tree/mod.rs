//! UI tree format tests
//!
//! Markdown and persisted JSON rendered to the editor node tree.

use crate::common::{context, parse};
use serde_json::{json, Value};
use std::collections::HashSet;
use uniast::formats::ui_tree::{
    render, render_macro_output, EditableAreaRef, MacroOutput, MacroRenderMode, UiNode,
};
use uniast::formats::UiTreeFormat;
use uniast::Format;

fn collect_keys(node: &UiNode, keys: &mut Vec<String>) {
    keys.push(node.key.clone());
    for child in &node.children {
        collect_keys(child, keys);
    }
}

#[test]
fn test_keys_are_unique_and_share_the_root_hash() {
    let ast = parse("# Title\n\n- one\n  - two\n\n| a |\n|---|\n| b |\n");
    let tree = render(&ast, &context()).unwrap();

    let mut keys = Vec::new();
    collect_keys(&tree, &mut keys);
    let unique: HashSet<&String> = keys.iter().collect();
    assert_eq!(unique.len(), keys.len());
    assert_eq!(tree.key.len(), 8);
    assert!(keys[1..]
        .iter()
        .all(|key| key.starts_with(&format!("{}-", tree.key))));
}

#[tokio::test]
async fn test_format_dumps_json() {
    let ast = parse("See [[Docs/Setup]] and {{status level=\"3\" done=\"false\" /}}\n\n{{toc /}}\n");
    let json: Value = serde_json::from_str(&UiTreeFormat::new(context()).serialize(&ast).await.unwrap())
        .unwrap();

    assert_eq!(json["type"], "document");
    let paragraph = &json["children"][0];
    assert_eq!(paragraph["type"], "paragraph");
    assert_eq!(paragraph["children"][1]["type"], "link");
    assert_eq!(
        paragraph["children"][1]["href"],
        "https://wiki.example.com/Docs/Setup"
    );
    assert_eq!(paragraph["children"][1]["internal"], true);

    let status = &paragraph["children"][3];
    assert_eq!(status["type"], "inlineMacro");
    assert_eq!(status["props"]["level"].as_f64(), Some(3.0));
    assert_eq!(status["props"]["done"], json!(false));

    assert_eq!(json["children"][1]["type"], "macro");
    assert_eq!(json["children"][1]["name"], "toc");
}

#[test]
fn test_macro_output_with_editable_area() {
    let cached = json!([
        {"type": "heading", "level": 3, "content": [{"type": "text", "content": "Note", "styles": {}}]},
        {"type": "macroBlockEditableArea"}
    ]);
    let output = MacroOutput::from_value(cached, MacroRenderMode::Block).unwrap();
    let mut slot = EditableAreaRef::block();

    let nodes =
        render_macro_output(&output, MacroRenderMode::Block, Some(&mut slot), &context()).unwrap();

    assert_eq!(nodes.len(), 2);
    let mount = slot.mount_point().expect("area mounted");
    assert_eq!(mount.key, nodes[1].key);
    assert!(nodes[1].key.ends_with("-1"));
}

#[test]
fn test_inline_output_rejects_block_slot() {
    let output = MacroOutput::from_value(
        json!([{"type": "inlineMacroEditableArea"}]),
        MacroRenderMode::Inline,
    )
    .unwrap();
    let mut slot = EditableAreaRef::block();

    let result =
        render_macro_output(&output, MacroRenderMode::Inline, Some(&mut slot), &context());
    assert!(matches!(
        result,
        Err(uniast::ConversionError::ContractViolation(_))
    ));
    assert!(slot.mount_point().is_none());
}
