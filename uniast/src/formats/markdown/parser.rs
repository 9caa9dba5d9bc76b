//! Markdown parsing (Markdown → UniAst)
//!
//! Pipeline: Markdown string → comrak AST → blocks, with each inline container
//! flattened to atoms and run through the custom inline rules.

use super::{comrak_options, RAW_MACRO_BODY};
use super::inline::{self, as_text, collect_atoms, Atom};
use super::rules::{InlineRule, InlineRuleSet};
use crate::common::macro_syntax::{self, MacroSyntax};
use crate::error::Result;
use crate::ir::nodes::{
    Block, BlockQuote, BulletListItem, CheckedListItem, CodeBlock, InlineContent, ListItem,
    MacroBody, MacroInvocation, MacroNode, NumberedListItem, Table, TableCell, TableColumn, Text,
    UniAst,
};
use crate::reference::ReferenceContext;
use comrak::nodes::{AstNode, ListType, NodeList, NodeValue};
use comrak::{parse_document, Arena};

/// Switches for the custom syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkdownParserOptions {
    /// Let `[[` inside an internal link open a nested level. Off, the first `]]` closes.
    pub nested_internal_links: bool,
}

impl Default for MarkdownParserOptions {
    fn default() -> Self {
        Self {
            nested_internal_links: true,
        }
    }
}

/// Markdown → UniAst parser bound to a reference context.
#[derive(Debug, Clone)]
pub struct MarkdownParser {
    ctx: ReferenceContext,
    rules: InlineRuleSet,
}

impl MarkdownParser {
    pub fn new(ctx: ReferenceContext) -> Self {
        Self::with_options(ctx, MarkdownParserOptions::default())
    }

    pub fn with_options(ctx: ReferenceContext, options: MarkdownParserOptions) -> Self {
        Self {
            ctx,
            rules: InlineRuleSet::standard(options.nested_internal_links),
        }
    }

    /// Add a custom inline rule; its priority decides where it runs.
    pub fn register_rule<R: InlineRule + 'static>(&mut self, rule: R) {
        self.rules.register(rule);
    }

    pub fn rules(&self) -> &InlineRuleSet {
        &self.rules
    }

    #[tracing::instrument(skip_all, fields(bytes = source.len()))]
    pub fn parse(&self, source: &str) -> Result<UniAst> {
        let arena = Arena::new();
        let options = comrak_options();
        let root = parse_document(&arena, source, &options);
        let children: Vec<_> = root.children().collect();
        let blocks = self.blocks(&children);
        tracing::debug!(blocks = blocks.len(), "parsed markdown");
        Ok(UniAst::new(blocks))
    }

    fn blocks<'a>(&self, nodes: &[&'a AstNode<'a>]) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut i = 0;
        while i < nodes.len() {
            if let Some(call) = opening_macro(nodes[i]) {
                if let Some(content) = raw_body(nodes, i + 1, &call.id) {
                    let call = call.with_body(MacroBody::Raw { content });
                    blocks.push(Block::MacroBlock(MacroNode::new(call)));
                    i += 3;
                    continue;
                }
                if let Some(end) = find_macro_end(nodes, i + 1, &call.id) {
                    let content = self.blocks(&nodes[i + 1..end]);
                    let call = call.with_body(MacroBody::Wysiwyg { content });
                    blocks.push(Block::MacroBlock(MacroNode::new(call)));
                    i = end + 1;
                    continue;
                }
            }
            self.block(nodes[i], &mut blocks);
            i += 1;
        }
        blocks
    }

    fn block<'a>(&self, node: &'a AstNode<'a>, out: &mut Vec<Block>) {
        match &node.data.borrow().value {
            NodeValue::Paragraph => out.push(self.paragraph(node)),
            NodeValue::Heading(heading) => {
                out.push(Block::heading(heading.level, self.inlines(node)));
            }
            NodeValue::List(list) => {
                out.extend(self.list_items(node, list).into_iter().map(Block::from));
            }
            NodeValue::BlockQuote => {
                let children: Vec<_> = node.children().collect();
                out.push(Block::BlockQuote(BlockQuote {
                    content: self.blocks(&children),
                    ..Default::default()
                }));
            }
            NodeValue::CodeBlock(code) => {
                let content = code.literal.strip_suffix('\n').unwrap_or(&code.literal);
                let language = code.info.split_whitespace().next().map(str::to_string);
                out.push(Block::CodeBlock(CodeBlock {
                    content: content.to_string(),
                    language,
                }));
            }
            NodeValue::HtmlBlock(html) => {
                out.push(Block::paragraph(vec![InlineContent::text(html.literal.trim_end())]));
            }
            NodeValue::ThematicBreak => out.push(Block::Break),
            NodeValue::Table(_) => out.push(self.table(node)),
            other => tracing::debug!(node = ?other, "skipping markdown block"),
        }
    }

    /// A paragraph, or a block macro when the paragraph holds exactly one macro.
    fn paragraph<'a>(&self, node: &'a AstNode<'a>) -> Block {
        let atoms = atoms_of(node);
        if let Some(MacroSyntax::Complete(call)) =
            macro_text(&atoms).and_then(|text| macro_syntax::parse_exact(&text))
        {
            return Block::MacroBlock(MacroNode::new(call));
        }
        Block::paragraph(self.convert(&atoms))
    }

    fn inlines<'a>(&self, node: &'a AstNode<'a>) -> Vec<InlineContent> {
        self.convert(&atoms_of(node))
    }

    fn convert(&self, atoms: &[Atom]) -> Vec<InlineContent> {
        inline::convert(atoms, &self.ctx, &self.rules)
    }

    fn list_items<'a>(&self, node: &'a AstNode<'a>, list: &NodeList) -> Vec<ListItem> {
        let ordered = matches!(list.list_type, ListType::Ordered);
        let mut items = Vec::new();
        for (index, item) in node.children().enumerate() {
            let checked = match &item.data.borrow().value {
                NodeValue::TaskItem(symbol) => Some(symbol.is_some()),
                _ => None,
            };
            let (content, sub_items) = self.item_parts(item);
            let item = match checked {
                Some(checked) => ListItem::CheckedListItem(CheckedListItem {
                    checked,
                    content,
                    sub_items,
                    ..Default::default()
                }),
                None if ordered => ListItem::NumberedListItem(NumberedListItem {
                    number: u32::try_from(list.start + index).ok(),
                    content,
                    sub_items,
                    ..Default::default()
                }),
                None => ListItem::BulletListItem(BulletListItem {
                    content,
                    sub_items,
                    ..Default::default()
                }),
            };
            items.push(item);
        }
        items
    }

    /// Inline content of an item and its nested list items. Extra paragraphs join the
    /// first one on a new line.
    fn item_parts<'a>(&self, item: &'a AstNode<'a>) -> (Vec<InlineContent>, Vec<ListItem>) {
        let mut content = Vec::new();
        let mut sub_items = Vec::new();
        for child in item.children() {
            match &child.data.borrow().value {
                NodeValue::Paragraph => {
                    if !content.is_empty() {
                        inline::push_text(&mut content, Text::plain("\n"));
                    }
                    for node in self.inlines(child) {
                        match node {
                            InlineContent::Text(text) => inline::push_text(&mut content, text),
                            other => content.push(other),
                        }
                    }
                }
                NodeValue::List(list) => sub_items.extend(self.list_items(child, list)),
                other => tracing::warn!(node = ?other, "list items only hold text and lists"),
            }
        }
        (content, sub_items)
    }

    fn table<'a>(&self, node: &'a AstNode<'a>) -> Block {
        let mut columns = Vec::new();
        let mut rows = Vec::new();
        for row in node.children() {
            let header = matches!(row.data.borrow().value, NodeValue::TableRow(true));
            let cells: Vec<TableCell> = row
                .children()
                .map(|cell| TableCell::new(self.inlines(cell)))
                .collect();
            if header {
                let empty = cells.iter().all(|cell| cell.content.is_empty());
                columns = cells
                    .into_iter()
                    .map(|cell| TableColumn {
                        header_cell: (!empty).then_some(cell),
                        width_px: None,
                    })
                    .collect();
            } else {
                rows.push(cells);
            }
        }
        Block::Table(Table {
            columns,
            rows,
            ..Default::default()
        })
    }
}

fn atoms_of<'a>(node: &'a AstNode<'a>) -> Vec<Atom> {
    let mut atoms = Vec::new();
    collect_atoms(node, &mut atoms);
    atoms
}

/// Text of atoms opening with a literal `{{`. An escaped brace never starts a macro.
fn macro_text(atoms: &[Atom]) -> Option<String> {
    if !matches!(atoms, [Atom::Char('{'), Atom::Char('{'), ..]) {
        return None;
    }
    as_text(atoms)
}

fn paragraph_text<'a>(node: &'a AstNode<'a>) -> Option<String> {
    if !matches!(node.data.borrow().value, NodeValue::Paragraph) {
        return None;
    }
    macro_text(&atoms_of(node))
}

/// A `macro-raw` fenced block at `start` followed by the closing tag of `id`.
fn raw_body<'a>(nodes: &[&'a AstNode<'a>], start: usize, id: &str) -> Option<String> {
    let close = paragraph_text(nodes.get(start + 1)?)?;
    if macro_syntax::parse_close(&close) != Some(id) {
        return None;
    }
    match &nodes.get(start)?.data.borrow().value {
        NodeValue::CodeBlock(code) if code.fenced && code.info.trim() == RAW_MACRO_BODY => {
            Some(code.literal.strip_suffix('\n').unwrap_or(&code.literal).to_string())
        }
        _ => None,
    }
}

/// A paragraph holding only `{{id ...}}`, the start of a macro spanning blocks.
fn opening_macro<'a>(node: &'a AstNode<'a>) -> Option<MacroInvocation> {
    match macro_syntax::parse_exact(&paragraph_text(node)?)? {
        MacroSyntax::Open(call) => Some(call),
        MacroSyntax::Complete(_) => None,
    }
}

/// Index of the paragraph closing macro `id`, skipping nested macros with the same id.
fn find_macro_end<'a>(nodes: &[&'a AstNode<'a>], start: usize, id: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (index, &node) in nodes.iter().enumerate().skip(start) {
        let Some(text) = paragraph_text(node) else {
            continue;
        };
        if macro_syntax::parse_close(&text) == Some(id) {
            if depth == 0 {
                return Some(index);
            }
            depth -= 1;
        } else if matches!(macro_syntax::parse_exact(&text), Some(MacroSyntax::Open(call)) if call.id == id)
        {
            depth += 1;
        }
    }
    None
}

/// Parse Markdown with the default rules.
pub fn parse_markdown(source: &str, ctx: &ReferenceContext) -> Result<UniAst> {
    MarkdownParser::new(ctx.clone()).parse(source)
}

/// Parse Markdown with explicit options.
pub fn parse_markdown_with(
    source: &str,
    ctx: &ReferenceContext,
    options: MarkdownParserOptions,
) -> Result<UniAst> {
    MarkdownParser::with_options(ctx.clone(), options).parse(source)
}
