//! Macro round trip for persisted documents
//!
//! ```text
//!     Stored documents carry every macro with the call that produced it and the output it
//!     rendered last time. An editor loading such a document must not run the macros again,
//!     yet it has to move them around like any other node. [`load`] therefore swaps each
//!     macro call for a synthetic wrapper call whose two parameters hold the original call
//!     and output as JSON strings; [`save`] swaps them back.
//!
//!         {"id": "toc", "params": {"depth": "2"}, "body": {"type": "none"}}    + output [..]
//!             ⇅
//!         {"id": "wrapperBlock", "params": {"call": "{\"id\":\"toc\",...}", "output": "[..]"},
//!          "body": {"type": "none"}}
//!
//!     Only these two functions know the encoding. A wysiwyg body is encoded with its call,
//!     so macros nested in it are restored together with their parent.
//! ```

use crate::error::{ConversionError, Result};
use crate::ir::nodes::{Block, InlineContent, MacroInvocation, MacroNode, UniAst};
use crate::ir::walk::{iterate_mut, NodeMut};

/// Id of the wrapper standing in for a block macro.
pub const WRAPPER_BLOCK: &str = "wrapperBlock";
/// Id of the wrapper standing in for an inline macro.
pub const WRAPPER_INLINE: &str = "wrapperInline";

const CALL_PARAM: &str = "call";
const OUTPUT_PARAM: &str = "output";

/// Parse persisted JSON and wrap every macro.
#[tracing::instrument(skip_all, fields(bytes = json.len()))]
pub fn load(json: &str) -> Result<UniAst> {
    let loaded = serde_json::from_str::<UniAst>(json)
        .map_err(ConversionError::from)
        .and_then(|mut ast| {
            wrap_macros(&mut ast)?;
            Ok(ast)
        });
    loaded.inspect_err(|err| tracing::error!(error = %err, "macro load failed"))
}

/// Restore every wrapped macro and write the persisted JSON.
#[tracing::instrument(skip_all, fields(blocks = ast.blocks.len()))]
pub fn save(ast: &UniAst) -> Result<String> {
    let mut ast = ast.clone();
    let saved = unwrap_macros(&mut ast)
        .and_then(|()| serde_json::to_string(&ast).map_err(ConversionError::from));
    saved.inspect_err(|err| tracing::error!(error = %err, "macro save failed"))
}

/// Replace each macro call with its wrapper, in place.
pub fn wrap_macros(ast: &mut UniAst) -> Result<()> {
    let mut failure = None;
    iterate_mut(ast, &mut |node: NodeMut<'_>| {
        if failure.is_some() {
            return true;
        }
        let (macro_node, wrapper_id) = match node {
            NodeMut::Block(Block::MacroBlock(macro_node)) => (macro_node, WRAPPER_BLOCK),
            NodeMut::Inline(InlineContent::InlineMacro(macro_node)) => {
                (macro_node, WRAPPER_INLINE)
            }
            _ => return false,
        };
        if let Err(err) = wrap(macro_node, wrapper_id) {
            failure = Some(err);
        }
        true
    });
    failure.map_or(Ok(()), Err)
}

/// Replace each wrapper with the call it carries, in place.
pub fn unwrap_macros(ast: &mut UniAst) -> Result<()> {
    let mut failure = None;
    iterate_mut(ast, &mut |node: NodeMut<'_>| {
        if failure.is_some() {
            return true;
        }
        let macro_node = match node {
            NodeMut::Block(Block::MacroBlock(macro_node))
            | NodeMut::Inline(InlineContent::InlineMacro(macro_node)) => macro_node,
            _ => return false,
        };
        if !is_wrapper(&macro_node.call) {
            return false;
        }
        if let Err(err) = unwrap(macro_node) {
            failure = Some(err);
        }
        // the restored body went through the round trip as part of its call
        true
    });
    failure.map_or(Ok(()), Err)
}

pub fn is_wrapper(call: &MacroInvocation) -> bool {
    call.id == WRAPPER_BLOCK || call.id == WRAPPER_INLINE
}

fn wrap(node: &mut MacroNode, wrapper_id: &str) -> Result<()> {
    if is_wrapper(&node.call) {
        tracing::debug!(id = %node.call.id, "macro already wrapped");
        return Ok(());
    }
    let mut wrapper =
        MacroInvocation::new(wrapper_id).with_param(CALL_PARAM, serde_json::to_string(&node.call)?);
    if let Some(output) = node.output.take() {
        wrapper = wrapper.with_param(OUTPUT_PARAM, serde_json::to_string(&output)?);
    }
    node.call = wrapper;
    Ok(())
}

fn unwrap(node: &mut MacroNode) -> Result<()> {
    let call = node.call.params.get(CALL_PARAM).ok_or_else(|| {
        ConversionError::InvalidJson(format!("{} is missing its '{CALL_PARAM}' parameter", node.call.id))
    })?;
    let call: MacroInvocation = serde_json::from_str(call)?;
    let output = node.call.params.get(OUTPUT_PARAM).map(|raw| {
        serde_json::from_str(raw).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "cached macro output is not JSON, keeping it as text");
            serde_json::Value::String(raw.clone())
        })
    });
    node.call = call;
    node.output = output;
    Ok(())
}
