//! UI-tree rendering (UniAst → editor node tree)
//!
//! The editor diffs successive renders by node key. The tree has no natural ids, so every
//! key is a short hash of the whole rendered input followed by the node's index path
//! (`3f2a9c10-0.2.1`). Any edit changes the hash and with it every key of the render:
//! the editor re-mounts more than it strictly needs to, but never confuses two nodes.
//!
//! Macro output is rendered through [`render_macro_output`], which also wires the
//! output's editable-area placeholder to the slot the host editor passes in.

mod node;

pub use node::{MountPoint, PropValue, UiKind, UiNode, UiStyle};

use crate::error::{ConversionError, Result};
use crate::format::Format;
use crate::formats::target_url;
use crate::ir::nodes::{
    Block, BlockStyles, Image, InlineContent, LinkTarget, ListItem, MacroNode, Table, TableCell,
    Text, TextStyles, UniAst,
};
use crate::reference::{EntityType, ReferenceContext};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Whether a macro renders as blocks or inside running text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MacroRenderMode {
    Block,
    Inline,
}

impl fmt::Display for MacroRenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacroRenderMode::Block => f.write_str("block"),
            MacroRenderMode::Inline => f.write_str("inline"),
        }
    }
}

/// Slot the host editor hands in to learn where a macro's editable content mounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditableAreaRef {
    Block(Option<MountPoint>),
    Inline(Option<MountPoint>),
}

impl EditableAreaRef {
    pub fn block() -> Self {
        EditableAreaRef::Block(None)
    }

    pub fn inline() -> Self {
        EditableAreaRef::Inline(None)
    }

    pub fn mode(&self) -> MacroRenderMode {
        match self {
            EditableAreaRef::Block(_) => MacroRenderMode::Block,
            EditableAreaRef::Inline(_) => MacroRenderMode::Inline,
        }
    }

    pub fn mount_point(&self) -> Option<&MountPoint> {
        match self {
            EditableAreaRef::Block(mount) | EditableAreaRef::Inline(mount) => mount.as_ref(),
        }
    }

    fn slot_mut(&mut self) -> &mut Option<MountPoint> {
        match self {
            EditableAreaRef::Block(mount) | EditableAreaRef::Inline(mount) => mount,
        }
    }
}

/// What a macro produced when it ran.
#[derive(Debug, Clone, PartialEq)]
pub enum MacroOutput {
    Blocks(Vec<Block>),
    Inline(Vec<InlineContent>),
}

impl MacroOutput {
    /// Decode a cached output of a macro rendered in `mode`.
    pub fn from_value(value: serde_json::Value, mode: MacroRenderMode) -> Result<Self> {
        Ok(match mode {
            MacroRenderMode::Block => MacroOutput::Blocks(serde_json::from_value(value)?),
            MacroRenderMode::Inline => MacroOutput::Inline(serde_json::from_value(value)?),
        })
    }

    pub fn mode(&self) -> MacroRenderMode {
        match self {
            MacroOutput::Blocks(_) => MacroRenderMode::Block,
            MacroOutput::Inline(_) => MacroRenderMode::Inline,
        }
    }
}

/// Render a document. Editable-area placeholders are refused here; they only make
/// sense inside a macro's output.
#[tracing::instrument(skip_all, fields(blocks = ast.blocks.len()))]
pub fn render(ast: &UniAst, ctx: &ReferenceContext) -> Result<UiNode> {
    render_document(ast, ctx)
        .inspect_err(|err| tracing::error!(error = %err, "ui tree rendering failed"))
}

/// Render the output of a macro declared with `mode`. The editable-area placeholder of
/// that shape, if any, is mounted into `slot`.
#[tracing::instrument(skip_all, fields(%mode))]
pub fn render_macro_output(
    output: &MacroOutput,
    mode: MacroRenderMode,
    slot: Option<&mut EditableAreaRef>,
    ctx: &ReferenceContext,
) -> Result<Vec<UiNode>> {
    render_output(output, mode, slot, ctx)
        .inspect_err(|err| tracing::error!(error = %err, "macro output rendering failed"))
}

fn render_document(ast: &UniAst, ctx: &ReferenceContext) -> Result<UiNode> {
    let hash = structural_hash(ast)?;
    let mut builder = UiBuilder::new(ctx, None, None);
    let children = builder.blocks(&ast.blocks)?;
    let mut root = UiNode::new(UiKind::Document, children);
    assign_keys(&mut root, &hash, &mut Vec::new());
    Ok(root)
}

fn render_output(
    output: &MacroOutput,
    mode: MacroRenderMode,
    mut slot: Option<&mut EditableAreaRef>,
    ctx: &ReferenceContext,
) -> Result<Vec<UiNode>> {
    if let Some(slot) = slot.as_deref_mut() {
        if slot.mode() != mode {
            return Err(ConversionError::ContractViolation(format!(
                "{} editable area slot given to a {mode} macro",
                slot.mode()
            )));
        }
        // keys change on every render, a previous mount point is stale
        *slot.slot_mut() = None;
    }
    if output.mode() != mode {
        return Err(ConversionError::ContractViolation(format!(
            "{} output produced by a {mode} macro",
            output.mode()
        )));
    }

    let hash = structural_hash(output_json(output))?;
    let mut builder = UiBuilder::new(ctx, Some(mode), slot);
    let mut nodes = match output {
        MacroOutput::Blocks(blocks) => builder.blocks(blocks)?,
        MacroOutput::Inline(content) => builder.inlines(content)?,
    };
    for (index, node) in nodes.iter_mut().enumerate() {
        assign_keys(node, &hash, &mut vec![index]);
    }
    builder.mount(&nodes);
    Ok(nodes)
}

enum OutputJson<'a> {
    Blocks(&'a [Block]),
    Inline(&'a [InlineContent]),
}

impl Serialize for OutputJson<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            OutputJson::Blocks(blocks) => blocks.serialize(serializer),
            OutputJson::Inline(content) => content.serialize(serializer),
        }
    }
}

fn output_json(output: &MacroOutput) -> OutputJson<'_> {
    match output {
        MacroOutput::Blocks(blocks) => OutputJson::Blocks(blocks),
        MacroOutput::Inline(content) => OutputJson::Inline(content),
    }
}

/// Eight hex digits identifying the rendered input.
fn structural_hash<T: Serialize>(root: T) -> Result<String> {
    let json = serde_json::to_string(&root)?;
    let mut hasher = DefaultHasher::new();
    json.hash(&mut hasher);
    Ok(format!("{:08x}", hasher.finish() as u32))
}

fn assign_keys(node: &mut UiNode, hash: &str, path: &mut Vec<usize>) {
    node.key = if path.is_empty() {
        hash.to_string()
    } else {
        let indices: Vec<String> = path.iter().map(usize::to_string).collect();
        format!("{hash}-{}", indices.join("."))
    };
    for (index, child) in node.children.iter_mut().enumerate() {
        path.push(index);
        assign_keys(child, hash, path);
        path.pop();
    }
}

fn find_editable(nodes: &[UiNode]) -> Option<&UiNode> {
    nodes.iter().find_map(|node| match node.kind {
        UiKind::EditableArea { .. } => Some(node),
        _ => find_editable(&node.children),
    })
}

fn block_style(styles: &BlockStyles) -> UiStyle {
    UiStyle {
        color: styles.text_color.clone(),
        background_color: styles.background_color.clone(),
        text_align: styles.text_alignment,
        ..Default::default()
    }
}

fn text_style(styles: &TextStyles) -> UiStyle {
    UiStyle {
        bold: styles.bold,
        italic: styles.italic,
        strikethrough: styles.strikethrough,
        underline: styles.underline,
        code: styles.code,
        color: styles.text_color.clone(),
        background_color: styles.background_color.clone(),
        text_align: None,
    }
}

struct UiBuilder<'c, 's> {
    ctx: &'c ReferenceContext,
    /// `None` outside of a macro output
    mode: Option<MacroRenderMode>,
    slot: Option<&'s mut EditableAreaRef>,
    mounted: bool,
}

impl<'c, 's> UiBuilder<'c, 's> {
    fn new(
        ctx: &'c ReferenceContext,
        mode: Option<MacroRenderMode>,
        slot: Option<&'s mut EditableAreaRef>,
    ) -> Self {
        Self {
            ctx,
            mode,
            slot,
            mounted: false,
        }
    }

    /// Write the key of the placeholder, known only once keys are assigned, into the slot.
    fn mount(&mut self, nodes: &[UiNode]) {
        if let (Some(slot), Some(area)) = (self.slot.as_deref_mut(), find_editable(nodes)) {
            *slot.slot_mut() = Some(MountPoint {
                key: area.key.clone(),
            });
        }
    }

    fn editable_area(&mut self, shape: MacroRenderMode) -> Result<UiNode> {
        let Some(mode) = self.mode else {
            return Err(ConversionError::ContractViolation(
                "editable area outside of a macro output".to_string(),
            ));
        };
        if mode != shape {
            return Err(ConversionError::ContractViolation(format!(
                "{shape} editable area in the output of a {mode} macro"
            )));
        }
        if self.slot.is_none() {
            return Err(ConversionError::ContractViolation(
                "macro output has an editable area but no slot was provided".to_string(),
            ));
        }
        if self.mounted {
            return Err(ConversionError::ContractViolation(
                "macro output has more than one editable area".to_string(),
            ));
        }
        self.mounted = true;
        Ok(UiNode::leaf(UiKind::EditableArea { mode: shape }))
    }

    fn blocks(&mut self, blocks: &[Block]) -> Result<Vec<UiNode>> {
        let mut nodes = Vec::with_capacity(blocks.len());
        let mut i = 0;
        while i < blocks.len() {
            if let Some(first) = blocks[i].as_list_item() {
                let ordered = first.is_ordered();
                let mut items = vec![first];
                i += 1;
                while let Some(next) = blocks.get(i).and_then(Block::as_list_item) {
                    if next.is_ordered() != ordered {
                        break;
                    }
                    items.push(next);
                    i += 1;
                }
                nodes.push(self.list(&items)?);
                continue;
            }
            nodes.push(self.block(&blocks[i])?);
            i += 1;
        }
        Ok(nodes)
    }

    fn block(&mut self, block: &Block) -> Result<UiNode> {
        Ok(match block {
            Block::Paragraph(p) => {
                UiNode::new(UiKind::Paragraph, self.inlines(&p.content)?).styled(block_style(&p.styles))
            }
            Block::Heading(h) => UiNode::new(
                UiKind::Heading {
                    level: h.level.clamp(1, 6),
                },
                self.inlines(&h.content)?,
            )
            .styled(block_style(&h.styles)),
            Block::BulletListItem(_) | Block::NumberedListItem(_) | Block::CheckedListItem(_) => {
                let items: Vec<ListItem> = block.as_list_item().into_iter().collect();
                self.list(&items)?
            }
            Block::BlockQuote(quote) => UiNode::new(UiKind::BlockQuote, self.blocks(&quote.content)?)
                .styled(block_style(&quote.styles)),
            Block::CodeBlock(code) => UiNode::leaf(UiKind::CodeBlock {
                language: code.language.clone(),
                content: code.content.clone(),
            }),
            Block::Table(table) => self.table(table)?,
            Block::Image(image) => {
                let mut node = self.image(image);
                node.style.text_align = image.styles.alignment;
                node
            }
            Block::Break => UiNode::leaf(UiKind::Break),
            Block::MacroBlock(node) => UiNode::leaf(UiKind::Macro {
                name: node.call.id.clone(),
                props: props(node),
            }),
            Block::MacroBlockEditableArea => self.editable_area(MacroRenderMode::Block)?,
        })
    }

    fn list(&mut self, items: &[ListItem]) -> Result<UiNode> {
        let kind = match items.first() {
            Some(ListItem::NumberedListItem(item)) => UiKind::NumberedList {
                start: item.number.unwrap_or(1),
            },
            _ => UiKind::BulletList,
        };
        let mut children = Vec::with_capacity(items.len());
        for item in items {
            let checked = match item {
                ListItem::CheckedListItem(i) => Some(i.checked),
                ListItem::BulletListItem(_) | ListItem::NumberedListItem(_) => None,
            };
            let mut item_children = self.inlines(item.content())?;
            let mut rest = item.sub_items();
            while let Some(head) = rest.first() {
                let ordered = head.is_ordered();
                let len = rest
                    .iter()
                    .take_while(|sub| sub.is_ordered() == ordered)
                    .count();
                item_children.push(self.list(&rest[..len])?);
                rest = &rest[len..];
            }
            children
                .push(UiNode::new(UiKind::ListItem { checked }, item_children).styled(block_style(item.styles())));
        }
        Ok(UiNode::new(kind, children))
    }

    fn table(&mut self, table: &Table) -> Result<UiNode> {
        let mut rows = Vec::with_capacity(table.rows.len() + 1);
        if table.columns.iter().any(|column| column.header_cell.is_some()) {
            let empty = TableCell::default();
            let mut cells = Vec::with_capacity(table.columns.len());
            for column in &table.columns {
                cells.push(self.cell(column.header_cell.as_ref().unwrap_or(&empty), true)?);
            }
            rows.push(UiNode::new(UiKind::TableRow { header: true }, cells));
        }
        for row in &table.rows {
            let mut cells = Vec::with_capacity(row.len());
            for cell in row {
                cells.push(self.cell(cell, false)?);
            }
            rows.push(UiNode::new(UiKind::TableRow { header: false }, cells));
        }
        Ok(UiNode::new(
            UiKind::Table {
                column_widths: table.columns.iter().map(|column| column.width_px).collect(),
            },
            rows,
        )
        .styled(block_style(&table.styles)))
    }

    fn cell(&mut self, cell: &TableCell, header: bool) -> Result<UiNode> {
        Ok(UiNode::new(
            UiKind::TableCell {
                header,
                row_span: cell.row_span,
                col_span: cell.col_span,
            },
            self.inlines(&cell.content)?,
        )
        .styled(block_style(&cell.styles)))
    }

    fn inlines(&mut self, content: &[InlineContent]) -> Result<Vec<UiNode>> {
        let mut nodes = Vec::with_capacity(content.len());
        for inline in content {
            nodes.push(match inline {
                InlineContent::Text(text) => text_node(text),
                InlineContent::Link(link) => UiNode::new(
                    UiKind::Link {
                        href: target_url(self.ctx, &link.target, EntityType::Document),
                        internal: matches!(link.target, LinkTarget::Internal { .. }),
                    },
                    link.content.iter().map(text_node).collect(),
                ),
                InlineContent::Image(image) => self.image(image),
                InlineContent::InlineMacro(node) => UiNode::leaf(UiKind::InlineMacro {
                    name: node.call.id.clone(),
                    props: props(node),
                }),
                InlineContent::InlineMacroEditableArea => {
                    self.editable_area(MacroRenderMode::Inline)?
                }
            });
        }
        Ok(nodes)
    }

    fn image(&self, image: &Image) -> UiNode {
        UiNode::leaf(UiKind::Image {
            src: target_url(self.ctx, &image.target, EntityType::Attachment),
            alt: image.alt.clone().unwrap_or_default(),
            caption: image.caption.clone(),
            width: image.width_px,
            height: image.height_px,
        })
    }
}

fn text_node(text: &Text) -> UiNode {
    UiNode::leaf(UiKind::Text {
        content: text.content.clone(),
    })
    .styled(text_style(&text.styles))
}

fn props(node: &MacroNode) -> std::collections::BTreeMap<String, PropValue> {
    node.call
        .params
        .iter()
        .map(|(key, value)| (key.clone(), PropValue::coerce(value)))
        .collect()
}

/// Format wrapper dumping the UI tree as JSON.
#[derive(Debug, Clone, Default)]
pub struct UiTreeFormat {
    ctx: ReferenceContext,
}

impl UiTreeFormat {
    pub fn new(ctx: ReferenceContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Format for UiTreeFormat {
    fn name(&self) -> &str {
        "ui-tree"
    }

    fn description(&self) -> &str {
        "Editor node tree as JSON"
    }

    fn file_extensions(&self) -> &[&str] {
        &["uitree"]
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    async fn serialize(&self, ast: &UniAst) -> Result<String> {
        let tree = render(ast, &self.ctx)?;
        serde_json::to_string_pretty(&tree)
            .map_err(|e| ConversionError::SerializationError(e.to_string()))
    }
}
