//! Macro load/save tests
//!
//! Persisted documents go through load (wrap) and save (unwrap) unchanged.

use proptest::collection::{btree_map, vec};
use proptest::option;
use proptest::prelude::*;
use serde_json::json;
use uniast::ir::nodes::{Block, InlineContent, MacroBody, MacroInvocation, MacroNode, UniAst};
use uniast::transforms::{self, WRAPPER_BLOCK, WRAPPER_INLINE};

fn call() -> impl Strategy<Value = MacroInvocation> {
    ("[a-z]{1,8}", btree_map("[a-z]{1,6}", "[ -~]{0,12}", 0..3)).prop_map(|(id, params)| {
        MacroInvocation {
            id,
            params,
            body: MacroBody::None,
        }
    })
}

fn output() -> impl Strategy<Value = Option<serde_json::Value>> {
    option::of(prop_oneof![
        Just(json!([{"type": "break"}])),
        "[a-z ]{0,10}".prop_map(|text| json!([{"type": "text", "content": text, "styles": {}}])),
    ])
}

fn block() -> impl Strategy<Value = Block> {
    prop_oneof![
        (call(), output()).prop_map(|(call, output)| Block::MacroBlock(MacroNode { call, output })),
        (call(), output(), "[a-z]{0,8}").prop_map(|(call, output, text)| {
            Block::paragraph(vec![
                InlineContent::text(text),
                InlineContent::InlineMacro(MacroNode { call, output }),
            ])
        }),
        (call(), call()).prop_map(|(outer, inner)| {
            Block::MacroBlock(MacroNode::new(outer.with_body(MacroBody::Wysiwyg {
                content: vec![Block::MacroBlock(MacroNode::new(inner))],
            })))
        }),
        Just(Block::Break),
    ]
}

proptest! {
    #[test]
    fn save_restores_loaded_documents(blocks in vec(block(), 0..5)) {
        let persisted = serde_json::to_string(&UniAst::new(blocks)).unwrap();
        let loaded = transforms::load(&persisted).unwrap();
        prop_assert_eq!(transforms::save(&loaded).unwrap(), persisted);
    }
}

#[test]
fn test_load_wraps_every_macro() {
    let ast = UniAst::new(vec![
        Block::MacroBlock(MacroNode {
            call: MacroInvocation::new("toc").with_param("depth", "2"),
            output: Some(json!([{"type": "break"}])),
        }),
        Block::paragraph(vec![InlineContent::InlineMacro(MacroNode::new(
            MacroInvocation::new("user"),
        ))]),
    ]);
    let loaded = transforms::load(&serde_json::to_string(&ast).unwrap()).unwrap();

    let Block::MacroBlock(wrapper) = &loaded.blocks[0] else {
        panic!("expected a macro block");
    };
    assert_eq!(wrapper.call.id, WRAPPER_BLOCK);
    assert_eq!(wrapper.output, None);
    assert_eq!(
        wrapper.call.params["call"],
        r#"{"id":"toc","params":{"depth":"2"},"body":{"type":"none"}}"#
    );
    assert_eq!(wrapper.call.params["output"], r#"[{"type":"break"}]"#);

    let Block::Paragraph(paragraph) = &loaded.blocks[1] else {
        panic!("expected a paragraph");
    };
    let InlineContent::InlineMacro(inline) = &paragraph.content[0] else {
        panic!("expected an inline macro");
    };
    assert_eq!(inline.call.id, WRAPPER_INLINE);
    assert!(!inline.call.params.contains_key("output"));
}

#[test]
fn test_nested_macros_travel_with_their_parent() {
    let ast = UniAst::new(vec![Block::MacroBlock(MacroNode::new(
        MacroInvocation::new("info").with_body(MacroBody::Wysiwyg {
            content: vec![Block::MacroBlock(MacroNode::new(MacroInvocation::new("toc")))],
        }),
    ))]);
    let loaded = transforms::load(&serde_json::to_string(&ast).unwrap()).unwrap();

    let Block::MacroBlock(wrapper) = &loaded.blocks[0] else {
        panic!("expected a macro block");
    };
    assert_eq!(wrapper.call.body, MacroBody::None);
    assert!(wrapper.call.params["call"].contains(r#"{"id":"toc""#));
}

#[test]
fn test_invalid_json_is_rejected() {
    let err = transforms::load(r#"{"blocks": [{"type": "nope"}]}"#).unwrap_err();
    assert!(err.to_string().starts_with("Invalid UniAst JSON"));
}
