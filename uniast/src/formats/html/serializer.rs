//! HTML rendering (UniAst → HTML fragment)
//!
//! Pipeline: UniAst blocks → RcDom → HTML string. Text only ever enters the DOM as
//! text nodes, so the html5ever serializer does all of the escaping.

use crate::error::{ConversionError, Result};
use crate::formats::target_url;
use crate::ir::nodes::{
    Block, BlockStyles, Image, InlineContent, Link, ListItem, MacroNode, Table, TableCell, Text,
    TextStyles,
};
use crate::reference::{EntityType, ReferenceContext};
use html5ever::{
    ns, serialize, serialize::SerializeOpts, serialize::TraversalScope, Attribute, LocalName,
    QualName,
};
use markup5ever_rcdom::{Handle, Node, NodeData, SerializableHandle};
use std::cell::{Cell, RefCell};
use std::default::Default;
use std::rc::Rc;

const NESTED_MACRO: &str = "nested macros are not supported yet";
const EDITABLE_AREA_MARKER: &str = "macro-editable-area";

/// Render blocks to an HTML fragment.
#[tracing::instrument(skip_all, fields(blocks = blocks.len()))]
pub fn blocks_to_html(blocks: &[Block], ctx: &ReferenceContext) -> Result<String> {
    let root = create_element("div", vec![]);
    let rendered = HtmlBuilder { ctx }
        .blocks(&root, blocks)
        .and_then(|()| serialize_children(&root));
    rendered.inspect_err(|err| tracing::error!(error = %err, "html rendering failed"))
}

/// Render inline content to an HTML fragment.
#[tracing::instrument(skip_all, fields(items = content.len()))]
pub fn inline_contents_to_html(content: &[InlineContent], ctx: &ReferenceContext) -> Result<String> {
    let root = create_element("div", vec![]);
    let rendered = HtmlBuilder { ctx }
        .inlines(&root, content)
        .and_then(|()| serialize_children(&root));
    rendered.inspect_err(|err| tracing::error!(error = %err, "html rendering failed"))
}

fn nested_macro(node: &'static str) -> ConversionError {
    ConversionError::UnsupportedNode {
        node,
        reason: NESTED_MACRO.to_string(),
    }
}

/// CSS declarations for block styles, `None` when nothing is set.
fn block_css(styles: &BlockStyles) -> Option<String> {
    let mut declarations = Vec::new();
    if let Some(color) = &styles.text_color {
        declarations.push(format!("color: {color}"));
    }
    if let Some(color) = &styles.background_color {
        declarations.push(format!("background-color: {color}"));
    }
    if let Some(alignment) = styles.text_alignment {
        declarations.push(format!("text-align: {}", alignment.as_str()));
    }
    (!declarations.is_empty()).then(|| declarations.join("; "))
}

fn text_css(styles: &TextStyles) -> Option<String> {
    let mut declarations = Vec::new();
    if let Some(color) = &styles.text_color {
        declarations.push(format!("color: {color}"));
    }
    if let Some(color) = &styles.background_color {
        declarations.push(format!("background-color: {color}"));
    }
    (!declarations.is_empty()).then(|| declarations.join("; "))
}

fn styled_element(tag: &str, styles: &BlockStyles) -> Handle {
    match block_css(styles) {
        Some(css) => create_element(tag, vec![("style", &css)]),
        None => create_element(tag, vec![]),
    }
}

fn append(parent: &Handle, child: Handle) -> Handle {
    parent.children.borrow_mut().push(child.clone());
    child
}

struct HtmlBuilder<'c> {
    ctx: &'c ReferenceContext,
}

impl HtmlBuilder<'_> {
    fn blocks(&self, parent: &Handle, blocks: &[Block]) -> Result<()> {
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
                self.list(parent, &items)?;
                continue;
            }
            self.block(parent, &blocks[i])?;
            i += 1;
        }
        Ok(())
    }

    fn block(&self, parent: &Handle, block: &Block) -> Result<()> {
        match block {
            Block::Paragraph(p) => {
                let node = append(parent, styled_element("p", &p.styles));
                self.inlines(&node, &p.content)?;
            }
            Block::Heading(h) => {
                let tag = format!("h{}", h.level.clamp(1, 6));
                let node = append(parent, styled_element(&tag, &h.styles));
                self.inlines(&node, &h.content)?;
            }
            Block::BulletListItem(_) | Block::NumberedListItem(_) | Block::CheckedListItem(_) => {
                if let Some(item) = block.as_list_item() {
                    self.list(parent, &[item])?;
                }
            }
            Block::BlockQuote(quote) => {
                let node = append(parent, styled_element("blockquote", &quote.styles));
                self.blocks(&node, &quote.content)?;
            }
            Block::CodeBlock(code) => {
                let node = match &code.language {
                    Some(language) => create_element("pre", vec![("data-language", language)]),
                    None => create_element("pre", vec![]),
                };
                append(&node, create_text(&code.content));
                append(parent, node);
            }
            Block::Table(table) => self.table(parent, table)?,
            Block::Image(image) => {
                let figure = match image.styles.alignment {
                    Some(alignment) => {
                        let css = format!("text-align: {}", alignment.as_str());
                        create_element("figure", vec![("style", &css)])
                    }
                    None => create_element("figure", vec![]),
                };
                let figure = append(parent, figure);
                self.image(&figure, image);
                if let Some(caption) = &image.caption {
                    let figcaption = append(&figure, create_element("figcaption", vec![]));
                    append(&figcaption, create_text(caption));
                }
            }
            Block::Break => {
                append(parent, create_element("hr", vec![]));
            }
            Block::MacroBlock(MacroNode { .. }) => return Err(nested_macro("macroBlock")),
            Block::MacroBlockEditableArea => {
                append(parent, create_comment(EDITABLE_AREA_MARKER));
            }
        }
        Ok(())
    }

    fn list(&self, parent: &Handle, items: &[ListItem]) -> Result<()> {
        let Some(first) = items.first() else {
            return Ok(());
        };
        let list = match first {
            ListItem::NumberedListItem(item) => match item.number {
                Some(start) if start != 1 => {
                    create_element("ol", vec![("start", &start.to_string())])
                }
                _ => create_element("ol", vec![]),
            },
            ListItem::BulletListItem(_) | ListItem::CheckedListItem(_) => {
                create_element("ul", vec![])
            }
        };
        let list = append(parent, list);

        for item in items {
            let li = append(&list, styled_element("li", item.styles()));
            if let ListItem::CheckedListItem(checked) = item {
                let mut attrs = vec![("type", "checkbox"), ("disabled", "")];
                if checked.checked {
                    attrs.push(("checked", ""));
                }
                append(&li, create_element("input", attrs));
            }
            self.inlines(&li, item.content())?;

            let mut rest = item.sub_items();
            while let Some(head) = rest.first() {
                let ordered = head.is_ordered();
                let len = rest
                    .iter()
                    .take_while(|sub| sub.is_ordered() == ordered)
                    .count();
                self.list(&li, &rest[..len])?;
                rest = &rest[len..];
            }
        }
        Ok(())
    }

    fn table(&self, parent: &Handle, table: &Table) -> Result<()> {
        let node = append(parent, styled_element("table", &table.styles));

        if table.columns.iter().any(|column| column.width_px.is_some()) {
            let colgroup = append(&node, create_element("colgroup", vec![]));
            for column in &table.columns {
                let col = match column.width_px {
                    Some(width) => create_element("col", vec![("style", &format!("width: {width}px"))]),
                    None => create_element("col", vec![]),
                };
                append(&colgroup, col);
            }
        }

        if table.columns.iter().any(|column| column.header_cell.is_some()) {
            let thead = append(&node, create_element("thead", vec![]));
            for column in &table.columns {
                match &column.header_cell {
                    Some(cell) => self.cell(&thead, "th", cell)?,
                    None => {
                        append(&thead, create_element("th", vec![]));
                    }
                }
            }
        }

        let tbody = append(&node, create_element("tbody", vec![]));
        for row in &table.rows {
            let tr = append(&tbody, create_element("tr", vec![]));
            for cell in row {
                self.cell(&tr, "td", cell)?;
            }
        }
        Ok(())
    }

    fn cell(&self, parent: &Handle, tag: &str, cell: &TableCell) -> Result<()> {
        let row_span = cell.row_span.filter(|span| *span > 1).map(|s| s.to_string());
        let col_span = cell.col_span.filter(|span| *span > 1).map(|s| s.to_string());
        let css = block_css(&cell.styles);

        let mut attrs = Vec::new();
        if let Some(span) = &row_span {
            attrs.push(("rowspan", span.as_str()));
        }
        if let Some(span) = &col_span {
            attrs.push(("colspan", span.as_str()));
        }
        if let Some(css) = &css {
            attrs.push(("style", css.as_str()));
        }
        let node = append(parent, create_element(tag, attrs));
        self.inlines(&node, &cell.content)
    }

    fn inlines(&self, parent: &Handle, content: &[InlineContent]) -> Result<()> {
        for inline in content {
            match inline {
                InlineContent::Text(text) => self.text(parent, text),
                InlineContent::Link(link) => self.link(parent, link),
                InlineContent::Image(image) => self.image(parent, image),
                InlineContent::InlineMacro(_) => return Err(nested_macro("inlineMacro")),
                InlineContent::InlineMacroEditableArea => {
                    append(parent, create_comment(EDITABLE_AREA_MARKER));
                }
            }
        }
        Ok(())
    }

    /// Wrappers nest outside-in: code first, then the emphasis tags, then the color span.
    fn text(&self, parent: &Handle, text: &Text) {
        let styles = &text.styles;
        let mut current = parent.clone();
        let tags = [
            (styles.code, "pre"),
            (styles.bold, "strong"),
            (styles.italic, "em"),
            (styles.strikethrough, "s"),
            (styles.underline, "u"),
        ];
        for (enabled, tag) in tags {
            if enabled {
                current = append(&current, create_element(tag, vec![]));
            }
        }
        if let Some(css) = text_css(styles) {
            current = append(&current, create_element("span", vec![("style", &css)]));
        }
        append(&current, create_text(&text.content));
    }

    fn link(&self, parent: &Handle, link: &Link) {
        let href = target_url(self.ctx, &link.target, EntityType::Document);
        let anchor = append(parent, create_element("a", vec![("href", &href)]));
        for text in &link.content {
            self.text(&anchor, text);
        }
    }

    fn image(&self, parent: &Handle, image: &Image) {
        let src = target_url(self.ctx, &image.target, EntityType::Attachment);
        let alt = image.alt.as_deref().unwrap_or("");
        let width = image.width_px.map(|w| w.to_string());
        let height = image.height_px.map(|h| h.to_string());

        let mut attrs = vec![("src", src.as_str()), ("alt", alt)];
        if let Some(width) = &width {
            attrs.push(("width", width.as_str()));
        }
        if let Some(height) = &height {
            attrs.push(("height", height.as_str()));
        }
        append(parent, create_element("img", attrs));
    }
}

/// Create an HTML element with attributes
fn create_element(tag: &str, attrs: Vec<(&str, &str)>) -> Handle {
    let qual_name = QualName::new(None, ns!(html), LocalName::from(tag));
    let attributes = attrs
        .into_iter()
        .map(|(name, value)| Attribute {
            name: QualName::new(None, ns!(), LocalName::from(name)),
            value: value.to_string().into(),
        })
        .collect();

    Rc::new(Node {
        parent: Cell::new(None),
        children: RefCell::new(Vec::new()),
        data: NodeData::Element {
            name: qual_name,
            attrs: RefCell::new(attributes),
            template_contents: Default::default(),
            mathml_annotation_xml_integration_point: false,
        },
    })
}

fn create_text(text: &str) -> Handle {
    Rc::new(Node {
        parent: Cell::new(None),
        children: RefCell::new(Vec::new()),
        data: NodeData::Text {
            contents: RefCell::new(text.to_string().into()),
        },
    })
}

fn create_comment(text: &str) -> Handle {
    Rc::new(Node {
        parent: Cell::new(None),
        children: RefCell::new(Vec::new()),
        data: NodeData::Comment {
            contents: text.to_string().into(),
        },
    })
}

/// Serialize every child of `root`, leaving the container itself out.
fn serialize_children(root: &Handle) -> Result<String> {
    let mut output = Vec::new();
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::IncludeNode,
        ..Default::default()
    };

    for child in root.children.borrow().iter() {
        let serializable = SerializableHandle::from(child.clone());
        serialize(&mut output, &serializable, opts.clone()).map_err(|e| {
            ConversionError::SerializationError(format!("HTML serialization failed: {e}"))
        })?;
    }

    String::from_utf8(output)
        .map_err(|e| ConversionError::SerializationError(format!("UTF-8 conversion failed: {e}")))
}
