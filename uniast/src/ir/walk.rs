//! Depth-first traversal of a UniAst tree.
//!
//! Nodes are handed to the visitor in document order, parents before children.
//! List items nested under another item and table cells are not blocks, so the
//! walk synthesizes dedicated node kinds for them. Returning `true` from
//! [`Visitor::visit`] prunes the subtree below the node just visited.
//!
//! The matches below have no wildcard arms: adding a node kind to `ir::nodes`
//! fails to compile here until the walk handles it.

use super::nodes::{
    Block, InlineContent, ListItem, MacroBody, MacroNode, TableCell, Text, UniAst,
};

/// A borrowed node of any kind.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Block(&'a Block),
    ListItem(&'a ListItem),
    TableCell(&'a TableCell),
    Inline(&'a InlineContent),
    /// A text run inside a link
    LinkText(&'a Text),
}

impl Node<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Block(block) => block.kind(),
            Node::ListItem(ListItem::BulletListItem(_)) => "bulletListItem",
            Node::ListItem(ListItem::NumberedListItem(_)) => "numberedListItem",
            Node::ListItem(ListItem::CheckedListItem(_)) => "checkedListItem",
            Node::TableCell(_) => "tableCell",
            Node::Inline(inline) => inline.kind(),
            Node::LinkText(_) => "text",
        }
    }
}

/// A mutably borrowed node of any kind.
#[derive(Debug)]
pub enum NodeMut<'a> {
    Block(&'a mut Block),
    ListItem(&'a mut ListItem),
    TableCell(&'a mut TableCell),
    Inline(&'a mut InlineContent),
    LinkText(&'a mut Text),
}

pub trait Visitor {
    /// Return `true` to skip the children of `node`.
    fn visit(&mut self, node: Node<'_>) -> bool;
}

impl<F> Visitor for F
where
    F: FnMut(Node<'_>) -> bool,
{
    fn visit(&mut self, node: Node<'_>) -> bool {
        self(node)
    }
}

pub trait VisitorMut {
    /// Return `true` to skip the children of `node`. Mutations happen in place.
    fn visit(&mut self, node: NodeMut<'_>) -> bool;
}

impl<F> VisitorMut for F
where
    F: FnMut(NodeMut<'_>) -> bool,
{
    fn visit(&mut self, node: NodeMut<'_>) -> bool {
        self(node)
    }
}

/// Walk every node of `ast` in document order.
pub fn iterate<V: Visitor + ?Sized>(ast: &UniAst, visitor: &mut V) {
    iterate_blocks(&ast.blocks, visitor);
}

pub fn iterate_blocks<V: Visitor + ?Sized>(blocks: &[Block], visitor: &mut V) {
    for block in blocks {
        walk_block(block, visitor);
    }
}

pub fn iterate_inlines<V: Visitor + ?Sized>(content: &[InlineContent], visitor: &mut V) {
    for inline in content {
        walk_inline(inline, visitor);
    }
}

fn walk_block<V: Visitor + ?Sized>(block: &Block, visitor: &mut V) {
    if visitor.visit(Node::Block(block)) {
        return;
    }
    match block {
        Block::Paragraph(p) => iterate_inlines(&p.content, visitor),
        Block::Heading(h) => iterate_inlines(&h.content, visitor),
        Block::BulletListItem(item) => {
            iterate_inlines(&item.content, visitor);
            walk_sub_items(&item.sub_items, visitor);
        }
        Block::NumberedListItem(item) => {
            iterate_inlines(&item.content, visitor);
            walk_sub_items(&item.sub_items, visitor);
        }
        Block::CheckedListItem(item) => {
            iterate_inlines(&item.content, visitor);
            walk_sub_items(&item.sub_items, visitor);
        }
        Block::BlockQuote(quote) => iterate_blocks(&quote.content, visitor),
        Block::Table(table) => {
            for cell in table.columns.iter().filter_map(|c| c.header_cell.as_ref()) {
                walk_cell(cell, visitor);
            }
            for cell in table.rows.iter().flatten() {
                walk_cell(cell, visitor);
            }
        }
        Block::MacroBlock(node) => walk_macro(node, visitor),
        Block::CodeBlock(_) | Block::Image(_) | Block::Break | Block::MacroBlockEditableArea => {}
    }
}

fn walk_sub_items<V: Visitor + ?Sized>(items: &[ListItem], visitor: &mut V) {
    for item in items {
        if visitor.visit(Node::ListItem(item)) {
            continue;
        }
        iterate_inlines(item.content(), visitor);
        walk_sub_items(item.sub_items(), visitor);
    }
}

fn walk_cell<V: Visitor + ?Sized>(cell: &TableCell, visitor: &mut V) {
    if visitor.visit(Node::TableCell(cell)) {
        return;
    }
    iterate_inlines(&cell.content, visitor);
}

fn walk_macro<V: Visitor + ?Sized>(node: &MacroNode, visitor: &mut V) {
    match &node.call.body {
        MacroBody::Wysiwyg { content } => iterate_blocks(content, visitor),
        MacroBody::None | MacroBody::Raw { .. } => {}
    }
}

fn walk_inline<V: Visitor + ?Sized>(inline: &InlineContent, visitor: &mut V) {
    if visitor.visit(Node::Inline(inline)) {
        return;
    }
    match inline {
        InlineContent::Link(link) => {
            for text in &link.content {
                visitor.visit(Node::LinkText(text));
            }
        }
        InlineContent::InlineMacro(node) => walk_macro(node, visitor),
        InlineContent::Text(_) | InlineContent::Image(_) | InlineContent::InlineMacroEditableArea => {}
    }
}

/// Walk every node of `ast` in document order, handing out mutable references.
pub fn iterate_mut<V: VisitorMut + ?Sized>(ast: &mut UniAst, visitor: &mut V) {
    iterate_blocks_mut(&mut ast.blocks, visitor);
}

pub fn iterate_blocks_mut<V: VisitorMut + ?Sized>(blocks: &mut [Block], visitor: &mut V) {
    for block in blocks {
        walk_block_mut(block, visitor);
    }
}

fn iterate_inlines_mut<V: VisitorMut + ?Sized>(content: &mut [InlineContent], visitor: &mut V) {
    for inline in content {
        walk_inline_mut(inline, visitor);
    }
}

fn walk_block_mut<V: VisitorMut + ?Sized>(block: &mut Block, visitor: &mut V) {
    if visitor.visit(NodeMut::Block(&mut *block)) {
        return;
    }
    match block {
        Block::Paragraph(p) => iterate_inlines_mut(&mut p.content, visitor),
        Block::Heading(h) => iterate_inlines_mut(&mut h.content, visitor),
        Block::BulletListItem(item) => {
            iterate_inlines_mut(&mut item.content, visitor);
            walk_sub_items_mut(&mut item.sub_items, visitor);
        }
        Block::NumberedListItem(item) => {
            iterate_inlines_mut(&mut item.content, visitor);
            walk_sub_items_mut(&mut item.sub_items, visitor);
        }
        Block::CheckedListItem(item) => {
            iterate_inlines_mut(&mut item.content, visitor);
            walk_sub_items_mut(&mut item.sub_items, visitor);
        }
        Block::BlockQuote(quote) => iterate_blocks_mut(&mut quote.content, visitor),
        Block::Table(table) => {
            for cell in table
                .columns
                .iter_mut()
                .filter_map(|c| c.header_cell.as_mut())
            {
                walk_cell_mut(cell, visitor);
            }
            for cell in table.rows.iter_mut().flatten() {
                walk_cell_mut(cell, visitor);
            }
        }
        Block::MacroBlock(node) => walk_macro_mut(node, visitor),
        Block::CodeBlock(_) | Block::Image(_) | Block::Break | Block::MacroBlockEditableArea => {}
    }
}

fn walk_sub_items_mut<V: VisitorMut + ?Sized>(items: &mut [ListItem], visitor: &mut V) {
    for item in items {
        if visitor.visit(NodeMut::ListItem(&mut *item)) {
            continue;
        }
        let (content, sub_items) = match item {
            ListItem::BulletListItem(i) => (&mut i.content, &mut i.sub_items),
            ListItem::NumberedListItem(i) => (&mut i.content, &mut i.sub_items),
            ListItem::CheckedListItem(i) => (&mut i.content, &mut i.sub_items),
        };
        iterate_inlines_mut(content, visitor);
        walk_sub_items_mut(sub_items, visitor);
    }
}

fn walk_cell_mut<V: VisitorMut + ?Sized>(cell: &mut TableCell, visitor: &mut V) {
    if visitor.visit(NodeMut::TableCell(&mut *cell)) {
        return;
    }
    iterate_inlines_mut(&mut cell.content, visitor);
}

fn walk_macro_mut<V: VisitorMut + ?Sized>(node: &mut MacroNode, visitor: &mut V) {
    match &mut node.call.body {
        MacroBody::Wysiwyg { content } => iterate_blocks_mut(content, visitor),
        MacroBody::None | MacroBody::Raw { .. } => {}
    }
}

fn walk_inline_mut<V: VisitorMut + ?Sized>(inline: &mut InlineContent, visitor: &mut V) {
    if visitor.visit(NodeMut::Inline(&mut *inline)) {
        return;
    }
    match inline {
        InlineContent::Link(link) => {
            for text in &mut link.content {
                visitor.visit(NodeMut::LinkText(&mut *text));
            }
        }
        InlineContent::InlineMacro(node) => walk_macro_mut(node, visitor),
        InlineContent::Text(_) | InlineContent::Image(_) | InlineContent::InlineMacroEditableArea => {}
    }
}
