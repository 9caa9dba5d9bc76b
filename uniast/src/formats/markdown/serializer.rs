//! Markdown serialization (UniAst → Markdown)
//!
//! Two passes. The first walks the tree and awaits the link strategy once per
//! internal link or image, in document order. The second builds a comrak AST
//! synchronously, splicing the resolved strings in as raw inline HTML so comrak
//! leaves them untouched, and lets comrak write the Markdown.
//!
//! Lossy: text and background colors, alignment, image dimensions and captions,
//! table spans and column widths have no Markdown form and are dropped. A block
//! image is written as a paragraph holding the image.

use super::{comrak_options, RAW_MACRO_BODY};
use super::links::{InternalLinkSerializer, InternalTarget};
use crate::common::macro_syntax;
use crate::error::{ConversionError, Result};
use crate::ir::nodes::{
    Block, Image, InlineContent, LinkTarget, ListItem, MacroBody, MacroNode, Table, TableCell,
    Text, UniAst,
};
use crate::ir::walk::{iterate, Node};
use comrak::nodes::{
    Ast, AstNode, ListDelimType, ListType, NodeCode, NodeCodeBlock, NodeHeading, NodeHtmlBlock,
    NodeLink, NodeList, NodeTable, NodeValue, TableAlignment,
};
use comrak::{format_commonmark, Arena};
use std::cell::RefCell;
use std::collections::VecDeque;

/// Serialize a document, resolving internal links through `links`.
#[tracing::instrument(skip_all, fields(blocks = ast.blocks.len()))]
pub async fn serialize_markdown(ast: &UniAst, links: &dyn InternalLinkSerializer) -> Result<String> {
    let resolved = resolve_internal_links(ast, links).await.inspect_err(|err| {
        tracing::error!(error = %err, "internal link resolution failed");
    })?;

    let arena = Arena::new();
    let mut builder = Builder::new(&arena, resolved);
    let markdown = builder.document(&ast.blocks)?;
    if !builder.resolved.is_empty() {
        return Err(ConversionError::SerializationError(
            "resolved links left over after serialization".to_string(),
        ));
    }
    Ok(markdown)
}

enum PendingLink {
    Link { content: Vec<Text>, target: LinkTarget },
    Image { target: LinkTarget, alt: Option<String> },
}

fn is_internal(target: &LinkTarget) -> bool {
    matches!(target, LinkTarget::Internal { .. })
}

async fn resolve_internal_links(
    ast: &UniAst,
    links: &dyn InternalLinkSerializer,
) -> Result<VecDeque<String>> {
    let mut pending = Vec::new();
    iterate(ast, &mut |node: Node<'_>| {
        match node {
            Node::Inline(InlineContent::Link(link)) if is_internal(&link.target) => {
                pending.push(PendingLink::Link {
                    content: link.content.clone(),
                    target: link.target.clone(),
                });
            }
            Node::Inline(InlineContent::Image(image)) | Node::Block(Block::Image(image))
                if is_internal(&image.target) =>
            {
                pending.push(PendingLink::Image {
                    target: image.target.clone(),
                    alt: image.alt.clone(),
                });
            }
            _ => {}
        }
        false
    });

    let converter = InlineMarkdown;
    let mut resolved = VecDeque::with_capacity(pending.len());
    for item in &pending {
        let markdown = match item {
            PendingLink::Link { content, target } => {
                let target = internal_target(target)?;
                links.serialize(content, target, &converter).await?
            }
            PendingLink::Image { target, alt } => {
                let target = internal_target(target)?;
                links.serialize_image(target, alt.as_deref()).await?
            }
        };
        resolved.push_back(markdown);
    }
    tracing::debug!(count = resolved.len(), "resolved internal links");
    Ok(resolved)
}

fn internal_target(target: &LinkTarget) -> Result<InternalTarget<'_>> {
    InternalTarget::from_link_target(target).ok_or_else(|| {
        ConversionError::SerializationError("expected an internal link target".to_string())
    })
}

/// Writes text runs as Markdown; handed to link strategies for captions.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineMarkdown;

impl InlineMarkdown {
    pub fn convert_texts(&self, texts: &[Text]) -> Result<String> {
        let arena = Arena::new();
        let mut builder = Builder::new(&arena, VecDeque::new());
        let paragraph = builder.node(NodeValue::Paragraph);
        let refs: Vec<&Text> = texts.iter().collect();
        builder.styled_runs(paragraph, &refs, 0, false);
        let document = builder.node(NodeValue::Document);
        document.append(paragraph);
        Ok(render(document)?.trim_end().to_string())
    }
}

/// Backslash-escape what comrak would otherwise read as Markdown inside macro syntax.
fn escape_macro_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(
            c,
            '\\' | '`' | '*' | '_' | '[' | ']' | '<' | '>' | '&' | '~' | '!' | '|' | '#'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn render<'a>(document: &'a AstNode<'a>) -> Result<String> {
    let mut output = Vec::new();
    format_commonmark(document, &comrak_options(), &mut output).map_err(|e| {
        ConversionError::SerializationError(format!("Comrak serialization failed: {e}"))
    })?;
    let markdown = String::from_utf8(output)
        .map_err(|e| ConversionError::SerializationError(format!("UTF-8 conversion failed: {e}")))?;
    // comrak separates adjacent lists with this marker
    Ok(markdown.replace("<!-- end list -->\n\n", ""))
}

/// Nesting order of text styles, outermost first.
#[derive(Clone, Copy)]
enum Wrapper {
    Strikethrough,
    Bold,
    Italic,
    Underline,
}

const WRAPPERS: [Wrapper; 4] = [
    Wrapper::Strikethrough,
    Wrapper::Bold,
    Wrapper::Italic,
    Wrapper::Underline,
];

impl Wrapper {
    fn applies(&self, text: &Text) -> bool {
        match self {
            Wrapper::Strikethrough => text.styles.strikethrough,
            Wrapper::Bold => text.styles.bold,
            Wrapper::Italic => text.styles.italic,
            Wrapper::Underline => text.styles.underline,
        }
    }
}

#[derive(Clone, Copy)]
enum ItemKind {
    Bullet,
    Numbered(Option<u32>),
    Checked(bool),
}

struct ItemView<'b> {
    kind: ItemKind,
    content: &'b [InlineContent],
    sub_items: &'b [ListItem],
}

impl ItemView<'_> {
    fn is_ordered(&self) -> bool {
        matches!(self.kind, ItemKind::Numbered(_))
    }
}

fn block_item(block: &Block) -> Option<ItemView<'_>> {
    match block {
        Block::BulletListItem(item) => Some(ItemView {
            kind: ItemKind::Bullet,
            content: &item.content,
            sub_items: &item.sub_items,
        }),
        Block::NumberedListItem(item) => Some(ItemView {
            kind: ItemKind::Numbered(item.number),
            content: &item.content,
            sub_items: &item.sub_items,
        }),
        Block::CheckedListItem(item) => Some(ItemView {
            kind: ItemKind::Checked(item.checked),
            content: &item.content,
            sub_items: &item.sub_items,
        }),
        _ => None,
    }
}

fn sub_item(item: &ListItem) -> ItemView<'_> {
    let kind = match item {
        ListItem::BulletListItem(_) => ItemKind::Bullet,
        ListItem::NumberedListItem(i) => ItemKind::Numbered(i.number),
        ListItem::CheckedListItem(i) => ItemKind::Checked(i.checked),
    };
    ItemView {
        kind,
        content: item.content(),
        sub_items: item.sub_items(),
    }
}

struct Builder<'a> {
    arena: &'a Arena<AstNode<'a>>,
    resolved: VecDeque<String>,
}

impl<'a> Builder<'a> {
    fn new(arena: &'a Arena<AstNode<'a>>, resolved: VecDeque<String>) -> Self {
        Self { arena, resolved }
    }

    fn node(&self, value: NodeValue) -> &'a AstNode<'a> {
        self.arena
            .alloc(AstNode::new(RefCell::new(Ast::new(value, (0, 0).into()))))
    }

    fn append(&self, parent: &'a AstNode<'a>, value: NodeValue) -> &'a AstNode<'a> {
        let node = self.node(value);
        parent.append(node);
        node
    }

    fn raw_inline(&self, parent: &'a AstNode<'a>, raw: String) {
        self.append(parent, NodeValue::HtmlInline(raw));
    }

    fn raw_block(&self, parent: &'a AstNode<'a>, raw: String) {
        self.append(
            parent,
            NodeValue::HtmlBlock(NodeHtmlBlock {
                block_type: 0,
                literal: raw,
            }),
        );
    }

    fn next_resolved(&mut self) -> Result<String> {
        self.resolved.pop_front().ok_or_else(|| {
            ConversionError::SerializationError(
                "internal link missing from the resolved set".to_string(),
            )
        })
    }

    fn document(&mut self, blocks: &[Block]) -> Result<String> {
        let document = self.node(NodeValue::Document);
        self.blocks(document, blocks)?;
        render(document)
    }

    fn blocks(&mut self, parent: &'a AstNode<'a>, blocks: &[Block]) -> Result<()> {
        let mut i = 0;
        while i < blocks.len() {
            if let Some(first) = block_item(&blocks[i]) {
                let ordered = first.is_ordered();
                let mut items = vec![first];
                i += 1;
                while let Some(next) = blocks.get(i).and_then(block_item) {
                    if next.is_ordered() != ordered {
                        break;
                    }
                    items.push(next);
                    i += 1;
                }
                self.list(parent, &items)?;
                continue;
            }
            self.block(parent, &blocks[i])?;
            i += 1;
        }
        Ok(())
    }

    fn block(&mut self, parent: &'a AstNode<'a>, block: &Block) -> Result<()> {
        match block {
            Block::Paragraph(p) => {
                let node = self.append(parent, NodeValue::Paragraph);
                self.inlines(node, &p.content, true)?;
            }
            Block::Heading(h) => {
                let node = self.append(
                    parent,
                    NodeValue::Heading(NodeHeading {
                        level: h.level.clamp(1, 6),
                        setext: false,
                    }),
                );
                self.inlines(node, &h.content, false)?;
            }
            Block::BulletListItem(_) | Block::NumberedListItem(_) | Block::CheckedListItem(_) => {
                if let Some(item) = block_item(block) {
                    self.list(parent, &[item])?;
                }
            }
            Block::BlockQuote(quote) => {
                let node = self.append(parent, NodeValue::BlockQuote);
                self.blocks(node, &quote.content)?;
            }
            Block::CodeBlock(code) => {
                let mut literal = code.content.clone();
                if !literal.ends_with('\n') {
                    literal.push('\n');
                }
                self.append(
                    parent,
                    NodeValue::CodeBlock(NodeCodeBlock {
                        fenced: true,
                        fence_char: b'`',
                        fence_length: 3,
                        fence_offset: 0,
                        info: code.language.clone().unwrap_or_default(),
                        literal,
                    }),
                );
            }
            Block::Table(table) => self.table(parent, table)?,
            Block::Image(image) => {
                let node = self.append(parent, NodeValue::Paragraph);
                self.image(node, image)?;
            }
            Block::Break => {
                self.append(parent, NodeValue::ThematicBreak);
            }
            Block::MacroBlock(node) => self.macro_block(parent, node)?,
            Block::MacroBlockEditableArea => {
                tracing::debug!("editable area placeholder has no markdown form");
            }
        }
        Ok(())
    }

    fn macro_block(&mut self, parent: &'a AstNode<'a>, node: &MacroNode) -> Result<()> {
        let call = &node.call;
        match &call.body {
            MacroBody::None => {
                self.raw_block(parent, escape_macro_text(&macro_syntax::format_self_closing(call)));
            }
            MacroBody::Raw { content } if content.contains('\n') => {
                self.raw_block(parent, escape_macro_text(&macro_syntax::format_open(call)));
                self.append(
                    parent,
                    NodeValue::CodeBlock(NodeCodeBlock {
                        fenced: true,
                        fence_char: b'`',
                        fence_length: 3,
                        fence_offset: 0,
                        info: RAW_MACRO_BODY.to_string(),
                        literal: format!("{content}\n"),
                    }),
                );
                self.raw_block(parent, escape_macro_text(&macro_syntax::format_close(&call.id)));
            }
            MacroBody::Raw { content } => {
                let text = format!(
                    "{}{content}{}",
                    macro_syntax::format_open(call),
                    macro_syntax::format_close(&call.id)
                );
                self.raw_block(parent, escape_macro_text(&text));
            }
            MacroBody::Wysiwyg { content } => {
                self.raw_block(parent, escape_macro_text(&macro_syntax::format_open(call)));
                self.blocks(parent, content)?;
                self.raw_block(parent, escape_macro_text(&macro_syntax::format_close(&call.id)));
            }
        }
        Ok(())
    }

    fn inline_macro(&mut self, parent: &'a AstNode<'a>, node: &MacroNode) -> Result<()> {
        let call = &node.call;
        let text = match &call.body {
            MacroBody::None => escape_macro_text(&macro_syntax::format_self_closing(call)),
            MacroBody::Raw { content } => escape_macro_text(&format!(
                "{}{content}{}",
                macro_syntax::format_open(call),
                macro_syntax::format_close(&call.id)
            )),
            MacroBody::Wysiwyg { content } => {
                let document = self.node(NodeValue::Document);
                self.blocks(document, content)?;
                let body = render(document)?;
                format!(
                    "{}{}{}",
                    escape_macro_text(&macro_syntax::format_open(call)),
                    body.trim(),
                    escape_macro_text(&macro_syntax::format_close(&call.id))
                )
            }
        };
        self.raw_inline(parent, text);
        Ok(())
    }

    fn list(&mut self, parent: &'a AstNode<'a>, items: &[ItemView<'_>]) -> Result<()> {
        let Some(first) = items.first() else {
            return Ok(());
        };
        let ordered = first.is_ordered();
        let start = match first.kind {
            ItemKind::Numbered(Some(number)) => number as usize,
            _ => 1,
        };
        let list = NodeList {
            list_type: if ordered {
                ListType::Ordered
            } else {
                ListType::Bullet
            },
            marker_offset: 0,
            padding: 0,
            start,
            delimiter: ListDelimType::Period,
            bullet_char: b'-',
            tight: true,
        };
        let list_node = self.append(parent, NodeValue::List(list));

        for item in items {
            let item_node = self.append(list_node, NodeValue::Item(list));
            let paragraph = self.append(item_node, NodeValue::Paragraph);
            match item.kind {
                ItemKind::Checked(true) => self.raw_inline(paragraph, "[x] ".to_string()),
                ItemKind::Checked(false) => self.raw_inline(paragraph, "[ ] ".to_string()),
                ItemKind::Bullet | ItemKind::Numbered(_) => {}
            }
            self.inlines(paragraph, item.content, true)?;

            let mut rest = item.sub_items;
            while let Some(head) = rest.first() {
                let ordered = head.is_ordered();
                let len = rest
                    .iter()
                    .take_while(|sub| sub.is_ordered() == ordered)
                    .count();
                let group: Vec<ItemView<'_>> = rest[..len].iter().map(sub_item).collect();
                self.list(item_node, &group)?;
                rest = &rest[len..];
            }
        }
        Ok(())
    }

    fn table(&mut self, parent: &'a AstNode<'a>, table: &Table) -> Result<()> {
        let width = table
            .rows
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or(0)
            .max(table.columns.len())
            .max(1);
        let table_node = self.append(
            parent,
            NodeValue::Table(NodeTable {
                alignments: vec![TableAlignment::None; width],
                num_columns: width,
                num_rows: table.rows.len() + 1,
                num_nonempty_cells: 0,
            }),
        );

        let empty = TableCell::default();
        let header_row = self.append(table_node, NodeValue::TableRow(true));
        for index in 0..width {
            let cell = table
                .columns
                .get(index)
                .and_then(|column| column.header_cell.as_ref())
                .unwrap_or(&empty);
            let cell_node = self.append(header_row, NodeValue::TableCell);
            self.inlines(cell_node, &cell.content, false)?;
        }
        for row in &table.rows {
            let row_node = self.append(table_node, NodeValue::TableRow(false));
            for index in 0..width {
                let cell = row.get(index).unwrap_or(&empty);
                let cell_node = self.append(row_node, NodeValue::TableCell);
                self.inlines(cell_node, &cell.content, false)?;
            }
        }
        Ok(())
    }

    fn image(&mut self, parent: &'a AstNode<'a>, image: &Image) -> Result<()> {
        match &image.target {
            LinkTarget::Internal { .. } => {
                let markdown = self.next_resolved()?;
                self.raw_inline(parent, markdown);
            }
            LinkTarget::External { url } => {
                let node = self.append(
                    parent,
                    NodeValue::Image(NodeLink {
                        url: url.clone(),
                        title: String::new(),
                    }),
                );
                if let Some(alt) = &image.alt {
                    self.append(node, NodeValue::Text(alt.clone()));
                }
            }
        }
        Ok(())
    }

    /// Inline content; `breaks` keeps newlines as soft breaks, otherwise they become spaces.
    fn inlines(
        &mut self,
        parent: &'a AstNode<'a>,
        content: &[InlineContent],
        breaks: bool,
    ) -> Result<()> {
        let mut runs: Vec<&Text> = Vec::new();
        for inline in content {
            if let InlineContent::Text(text) = inline {
                runs.push(text);
                continue;
            }
            self.styled_runs(parent, &runs, 0, breaks);
            runs.clear();

            match inline {
                InlineContent::Text(_) => {}
                InlineContent::Link(link) => match &link.target {
                    LinkTarget::Internal { .. } => {
                        let markdown = self.next_resolved()?;
                        self.raw_inline(parent, markdown);
                    }
                    LinkTarget::External { url } => {
                        let node = self.append(
                            parent,
                            NodeValue::Link(NodeLink {
                                url: url.clone(),
                                title: String::new(),
                            }),
                        );
                        let texts: Vec<&Text> = link.content.iter().collect();
                        self.styled_runs(node, &texts, 0, false);
                    }
                },
                InlineContent::Image(image) => self.image(parent, image)?,
                InlineContent::InlineMacro(node) => self.inline_macro(parent, node)?,
                InlineContent::InlineMacroEditableArea => {
                    tracing::debug!("editable area placeholder has no markdown form");
                }
            }
        }
        self.styled_runs(parent, &runs, 0, breaks);
        Ok(())
    }

    /// Group consecutive runs sharing a style under one wrapper node, outermost style first.
    fn styled_runs(&self, parent: &'a AstNode<'a>, runs: &[&Text], level: usize, breaks: bool) {
        let Some(wrapper) = WRAPPERS.get(level) else {
            for text in runs {
                self.leaf(parent, text, breaks);
            }
            return;
        };

        let mut rest = runs;
        while let Some(first) = rest.first() {
            let styled = wrapper.applies(first);
            let len = rest
                .iter()
                .take_while(|text| wrapper.applies(text) == styled)
                .count();
            let (group, tail) = rest.split_at(len);
            rest = tail;

            if !styled {
                self.styled_runs(parent, group, level + 1, breaks);
                continue;
            }
            match wrapper {
                Wrapper::Strikethrough => {
                    let node = self.append(parent, NodeValue::Strikethrough);
                    self.styled_runs(node, group, level + 1, breaks);
                }
                Wrapper::Bold => {
                    let node = self.append(parent, NodeValue::Strong);
                    self.styled_runs(node, group, level + 1, breaks);
                }
                Wrapper::Italic => {
                    let node = self.append(parent, NodeValue::Emph);
                    self.styled_runs(node, group, level + 1, breaks);
                }
                Wrapper::Underline => {
                    self.raw_inline(parent, "<u>".to_string());
                    self.styled_runs(parent, group, level + 1, breaks);
                    self.raw_inline(parent, "</u>".to_string());
                }
            }
        }
    }

    fn leaf(&self, parent: &'a AstNode<'a>, text: &Text, breaks: bool) {
        if text.styles.code {
            self.append(
                parent,
                NodeValue::Code(NodeCode {
                    num_backticks: 1,
                    literal: text.content.replace('\n', " "),
                }),
            );
            return;
        }
        if !breaks {
            self.text(parent, &text.content.replace('\n', " "));
            return;
        }
        for (index, line) in text.content.split('\n').enumerate() {
            if index > 0 {
                self.append(parent, NodeValue::SoftBreak);
            }
            self.text(parent, line);
        }
    }

    /// Plain text with the first brace of every `{{` escaped, so it never reads back as a macro.
    fn text(&self, parent: &'a AstNode<'a>, content: &str) {
        let mut rest = content;
        while let Some(index) = rest.find("{{") {
            if index > 0 {
                self.append(parent, NodeValue::Text(rest[..index].to_string()));
            }
            self.raw_inline(parent, "\\{".to_string());
            rest = &rest[index + 1..];
        }
        if !rest.is_empty() {
            self.append(parent, NodeValue::Text(rest.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::markdown::links::WikiLinkSerializer;
    use crate::ir::nodes::{
        BulletListItem, CheckedListItem, CodeBlock, Link, MacroInvocation, TableColumn,
        TextStyles,
    };

    async fn md(blocks: Vec<Block>) -> String {
        serialize_markdown(&UniAst::new(blocks), &WikiLinkSerializer)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_paragraph_styles() {
        let all = TextStyles {
            bold: true,
            italic: true,
            strikethrough: true,
            ..Default::default()
        };
        let out = md(vec![Block::paragraph(vec![
            InlineContent::text("plain "),
            InlineContent::styled("wow!", all),
        ])])
        .await;
        assert!(out.starts_with("plain ~~**"), "{out}");
        assert!(out.contains("wow!"), "{out}");
    }

    #[tokio::test]
    async fn test_underline_uses_html() {
        let underline = TextStyles {
            underline: true,
            ..Default::default()
        };
        let out = md(vec![Block::paragraph(vec![InlineContent::styled("u", underline)])]).await;
        assert_eq!(out, "<u>u</u>\n");
    }

    #[tokio::test]
    async fn test_internal_link_goes_through_strategy() {
        let out = md(vec![Block::paragraph(vec![
            InlineContent::text("see "),
            InlineContent::Link(Link {
                target: LinkTarget::internal("Main/Home", None),
                content: vec![Text::plain("home")],
            }),
        ])])
        .await;
        assert_eq!(out, "see [[home|Main/Home]]\n");
    }

    #[tokio::test]
    async fn test_lists_group_and_check() {
        let out = md(vec![
            Block::BulletListItem(BulletListItem {
                content: vec![InlineContent::text("one")],
                ..Default::default()
            }),
            Block::CheckedListItem(CheckedListItem {
                checked: true,
                content: vec![InlineContent::text("done")],
                ..Default::default()
            }),
        ])
        .await;
        assert_eq!(out, "- one\n- [x] done\n");
    }

    #[tokio::test]
    async fn test_code_block_and_break() {
        let out = md(vec![
            Block::CodeBlock(CodeBlock {
                content: "let x = 1;".into(),
                language: Some("rust".into()),
            }),
            Block::Break,
        ])
        .await;
        assert!(out.starts_with("``` rust\nlet x = 1;\n```\n") || out.starts_with("```rust\nlet x = 1;\n```\n"), "{out}");
        assert!(out.trim_end().ends_with("-----") || out.trim_end().ends_with("***"), "{out}");
    }

    #[tokio::test]
    async fn test_block_macro() {
        let call = MacroInvocation::new("macro").with_param("param1", "1");
        let out = md(vec![Block::MacroBlock(MacroNode::new(call))]).await;
        assert_eq!(out.trim_end(), r#"{{macro param1="1" /}}"#);
    }

    #[tokio::test]
    async fn test_macro_like_text_is_escaped() {
        let out = md(vec![Block::paragraph(vec![InlineContent::text("{{info /}} and {{{x")])]).await;
        assert_eq!(out, "\\{{info /}} and \\{\\{{x\n");
    }

    #[tokio::test]
    async fn test_multi_line_raw_body_is_fenced() {
        let call = MacroInvocation::new("code")
            .with_param("t", "x y")
            .with_body(MacroBody::Raw {
                content: "l1\n\nl2".into(),
            });
        let out = md(vec![Block::MacroBlock(MacroNode::new(call))]).await;
        assert!(out.starts_with("{{code t=\"x y\"}}\n\n"), "{out}");
        assert!(out.contains("macro-raw\nl1\n\nl2\n```"), "{out}");
        assert!(out.trim_end().ends_with("{{/code}}"), "{out}");
    }

    #[tokio::test]
    async fn test_table_pads_rows() {
        let out = md(vec![Block::Table(Table {
            columns: vec![TableColumn {
                header_cell: Some(TableCell::new(vec![InlineContent::text("h")])),
                width_px: None,
            }],
            rows: vec![vec![
                TableCell::new(vec![InlineContent::text("a")]),
                TableCell::new(vec![InlineContent::text("b")]),
            ]],
            ..Default::default()
        })])
        .await;
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3, "{out}");
        assert!(lines[0].contains('h'));
        assert!(lines[2].contains('a') && lines[2].contains('b'));
    }

    #[test]
    fn test_convert_texts() {
        let bold = TextStyles {
            bold: true,
            ..Default::default()
        };
        let texts = vec![
            Text::plain("a "),
            Text {
                content: "b".into(),
                styles: bold,
            },
        ];
        assert_eq!(InlineMarkdown.convert_texts(&texts).unwrap(), "a **b**");
    }
}
