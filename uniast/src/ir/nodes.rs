//! Core data structures of the UniAst document tree.
//!
//! Every union is a closed, internally tagged enum (`"type"` discriminant) so the
//! persisted JSON reads the same as the in-memory tree. Style maps skip unset
//! fields, which keeps `{"styles":{}}` for plain runs.

use crate::reference::EntityReference;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root of a document. Owns every block by value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UniAst {
    pub blocks: Vec<Block>,
}

impl UniAst {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }
}

/// Block-level structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Block {
    Paragraph(Paragraph),
    Heading(Heading),
    BulletListItem(BulletListItem),
    NumberedListItem(NumberedListItem),
    CheckedListItem(CheckedListItem),
    BlockQuote(BlockQuote),
    CodeBlock(CodeBlock),
    Table(Table),
    Image(Image),
    Break,
    MacroBlock(MacroNode),
    MacroBlockEditableArea,
}

impl Block {
    /// The JSON discriminant of this block.
    pub fn kind(&self) -> &'static str {
        match self {
            Block::Paragraph(_) => "paragraph",
            Block::Heading(_) => "heading",
            Block::BulletListItem(_) => "bulletListItem",
            Block::NumberedListItem(_) => "numberedListItem",
            Block::CheckedListItem(_) => "checkedListItem",
            Block::BlockQuote(_) => "blockQuote",
            Block::CodeBlock(_) => "codeBlock",
            Block::Table(_) => "table",
            Block::Image(_) => "image",
            Block::Break => "break",
            Block::MacroBlock(_) => "macroBlock",
            Block::MacroBlockEditableArea => "macroBlockEditableArea",
        }
    }

    pub fn paragraph(content: Vec<InlineContent>) -> Self {
        Block::Paragraph(Paragraph {
            content,
            styles: BlockStyles::default(),
        })
    }

    pub fn heading(level: u8, content: Vec<InlineContent>) -> Self {
        Block::Heading(Heading {
            level: level.clamp(1, 6),
            content,
            styles: BlockStyles::default(),
        })
    }

    /// Block-level styles, `None` for the opaque kinds that carry none.
    pub fn styles(&self) -> Option<StylesRef<'_>> {
        match self {
            Block::Paragraph(p) => Some(StylesRef::Block(&p.styles)),
            Block::Heading(h) => Some(StylesRef::Block(&h.styles)),
            Block::BulletListItem(i) => Some(StylesRef::Block(&i.styles)),
            Block::NumberedListItem(i) => Some(StylesRef::Block(&i.styles)),
            Block::CheckedListItem(i) => Some(StylesRef::Block(&i.styles)),
            Block::BlockQuote(q) => Some(StylesRef::Block(&q.styles)),
            Block::Table(t) => Some(StylesRef::Block(&t.styles)),
            Block::Image(image) => Some(StylesRef::Image(&image.styles)),
            Block::CodeBlock(_)
            | Block::Break
            | Block::MacroBlock(_)
            | Block::MacroBlockEditableArea => None,
        }
    }
}

/// Styles of a block, by the shape its kind carries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StylesRef<'a> {
    Block(&'a BlockStyles),
    Image(&'a ImageStyles),
}

impl StylesRef<'_> {
    pub fn alignment(&self) -> Option<Alignment> {
        match self {
            StylesRef::Block(styles) => styles.text_alignment,
            StylesRef::Image(styles) => styles.alignment,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub content: Vec<InlineContent>,
    #[serde(default)]
    pub styles: BlockStyles,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heading {
    /// 1 to 6
    pub level: u8,
    pub content: Vec<InlineContent>,
    #[serde(default)]
    pub styles: BlockStyles,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulletListItem {
    pub content: Vec<InlineContent>,
    #[serde(default)]
    pub sub_items: Vec<ListItem>,
    #[serde(default)]
    pub styles: BlockStyles,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberedListItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    pub content: Vec<InlineContent>,
    #[serde(default)]
    pub sub_items: Vec<ListItem>,
    #[serde(default)]
    pub styles: BlockStyles,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckedListItem {
    pub checked: bool,
    pub content: Vec<InlineContent>,
    #[serde(default)]
    pub sub_items: Vec<ListItem>,
    #[serde(default)]
    pub styles: BlockStyles,
}

/// The three list item shapes, usable both as blocks and as nested sub-items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ListItem {
    BulletListItem(BulletListItem),
    NumberedListItem(NumberedListItem),
    CheckedListItem(CheckedListItem),
}

impl ListItem {
    pub fn content(&self) -> &[InlineContent] {
        match self {
            ListItem::BulletListItem(i) => &i.content,
            ListItem::NumberedListItem(i) => &i.content,
            ListItem::CheckedListItem(i) => &i.content,
        }
    }

    pub fn sub_items(&self) -> &[ListItem] {
        match self {
            ListItem::BulletListItem(i) => &i.sub_items,
            ListItem::NumberedListItem(i) => &i.sub_items,
            ListItem::CheckedListItem(i) => &i.sub_items,
        }
    }

    pub fn styles(&self) -> &BlockStyles {
        match self {
            ListItem::BulletListItem(i) => &i.styles,
            ListItem::NumberedListItem(i) => &i.styles,
            ListItem::CheckedListItem(i) => &i.styles,
        }
    }

    pub fn is_ordered(&self) -> bool {
        matches!(self, ListItem::NumberedListItem(_))
    }
}

impl From<ListItem> for Block {
    fn from(item: ListItem) -> Self {
        match item {
            ListItem::BulletListItem(i) => Block::BulletListItem(i),
            ListItem::NumberedListItem(i) => Block::NumberedListItem(i),
            ListItem::CheckedListItem(i) => Block::CheckedListItem(i),
        }
    }
}

impl Block {
    /// View a list item block as a [`ListItem`], `None` for every other block.
    pub fn as_list_item(&self) -> Option<ListItem> {
        match self {
            Block::BulletListItem(i) => Some(ListItem::BulletListItem(i.clone())),
            Block::NumberedListItem(i) => Some(ListItem::NumberedListItem(i.clone())),
            Block::CheckedListItem(i) => Some(ListItem::CheckedListItem(i.clone())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockQuote {
    pub content: Vec<Block>,
    #[serde(default)]
    pub styles: BlockStyles,
}

/// Raw code, rendered opaquely: no styles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeBlock {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Rows are not required to match the column count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<TableColumn>,
    pub rows: Vec<Vec<TableCell>>,
    #[serde(default)]
    pub styles: BlockStyles,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableColumn {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_cell: Option<TableCell>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width_px: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCell {
    pub content: Vec<InlineContent>,
    #[serde(default)]
    pub styles: BlockStyles,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_span: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col_span: Option<u32>,
}

impl TableCell {
    pub fn new(content: Vec<InlineContent>) -> Self {
        Self {
            content,
            ..Default::default()
        }
    }
}

/// An image, either as a block or inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub target: LinkTarget,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width_px: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_px: Option<f64>,
    #[serde(default)]
    pub styles: ImageStyles,
}

impl Image {
    pub fn new(target: LinkTarget) -> Self {
        Self {
            target,
            alt: None,
            caption: None,
            width_px: None,
            height_px: None,
            styles: ImageStyles::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageStyles {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,
}

/// A macro occurrence: the call plus the rendering it produced last time, if cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroNode {
    pub call: MacroInvocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
}

impl MacroNode {
    pub fn new(call: MacroInvocation) -> Self {
        Self { call, output: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroInvocation {
    pub id: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    #[serde(default)]
    pub body: MacroBody,
}

impl MacroInvocation {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            params: BTreeMap::new(),
            body: MacroBody::None,
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: MacroBody) -> Self {
        self.body = body;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MacroBody {
    #[default]
    None,
    Wysiwyg {
        content: Vec<Block>,
    },
    Raw {
        content: String,
    },
}

/// Text-level content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InlineContent {
    Text(Text),
    Link(Link),
    Image(Image),
    InlineMacro(MacroNode),
    InlineMacroEditableArea,
}

impl InlineContent {
    pub fn text(content: impl Into<String>) -> Self {
        InlineContent::Text(Text::plain(content))
    }

    pub fn styled(content: impl Into<String>, styles: TextStyles) -> Self {
        InlineContent::Text(Text {
            content: content.into(),
            styles,
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            InlineContent::Text(_) => "text",
            InlineContent::Link(_) => "link",
            InlineContent::Image(_) => "image",
            InlineContent::InlineMacro(_) => "inlineMacro",
            InlineContent::InlineMacroEditableArea => "inlineMacroEditableArea",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub content: String,
    #[serde(default)]
    pub styles: TextStyles,
}

impl Text {
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            styles: TextStyles::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub target: LinkTarget,
    #[serde(with = "tagged_text")]
    pub content: Vec<Text>,
}

/// Where a link or image points to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LinkTarget {
    /// The raw reference is always kept; the parsed form is `None` when resolution failed.
    Internal {
        #[serde(rename = "rawReference")]
        raw_reference: String,
        #[serde(rename = "parsedReference")]
        parsed_reference: Option<EntityReference>,
    },
    External {
        url: String,
    },
}

impl LinkTarget {
    pub fn internal(raw_reference: impl Into<String>, parsed: Option<EntityReference>) -> Self {
        LinkTarget::Internal {
            raw_reference: raw_reference.into(),
            parsed_reference: parsed,
        }
    }

    pub fn external(url: impl Into<String>) -> Self {
        LinkTarget::External { url: url.into() }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyles {
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub strikethrough: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub code: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

impl TextStyles {
    pub fn is_plain(&self) -> bool {
        *self == TextStyles::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockStyles {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_alignment: Option<Alignment>,
}

impl BlockStyles {
    pub fn is_empty(&self) -> bool {
        *self == BlockStyles::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "justify",
        }
    }
}

/// Link content is a list of `text` nodes; keep the discriminant in JSON.
mod tagged_text {
    use super::Text;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize)]
    #[serde(tag = "type", rename_all = "camelCase")]
    enum TaggedRef<'a> {
        Text(&'a Text),
    }

    #[derive(Deserialize)]
    #[serde(tag = "type", rename_all = "camelCase")]
    enum Tagged {
        Text(Text),
    }

    pub fn serialize<S: Serializer>(items: &[Text], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(items.iter().map(TaggedRef::Text))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Text>, D::Error> {
        let items = Vec::<Tagged>::deserialize(deserializer)?;
        Ok(items
            .into_iter()
            .map(|item| match item {
                Tagged::Text(text) => text,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_text_serializes_with_empty_styles() {
        let block = Block::paragraph(vec![InlineContent::text("hello")]);
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "paragraph",
                "content": [{"type": "text", "content": "hello", "styles": {}}],
                "styles": {}
            })
        );
    }

    #[test]
    fn test_internal_link_keeps_null_parsed_reference() {
        let link = InlineContent::Link(Link {
            target: LinkTarget::internal("Main.WebHome", None),
            content: vec![Text::plain("home")],
        });
        let value = serde_json::to_value(&link).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "link",
                "target": {"type": "internal", "rawReference": "Main.WebHome", "parsedReference": null},
                "content": [{"type": "text", "content": "home", "styles": {}}]
            })
        );
        let back: InlineContent = serde_json::from_value(value).unwrap();
        assert_eq!(back, link);
    }

    #[test]
    fn test_list_items_nest_and_convert_to_blocks() {
        let item = ListItem::NumberedListItem(NumberedListItem {
            number: Some(3),
            content: vec![InlineContent::text("three")],
            sub_items: vec![ListItem::CheckedListItem(CheckedListItem {
                checked: true,
                content: vec![InlineContent::text("done")],
                ..Default::default()
            })],
            styles: BlockStyles::default(),
        });
        let block: Block = item.clone().into();
        assert_eq!(block.kind(), "numberedListItem");
        assert_eq!(block.as_list_item(), Some(item));

        let json = serde_json::to_string(&block).unwrap();
        assert!(json.contains(r#""subItems":[{"type":"checkedListItem","checked":true"#));
    }

    #[test]
    fn test_macro_body_variants() {
        let call = MacroInvocation::new("info")
            .with_param("title", "Note")
            .with_body(MacroBody::Raw {
                content: "raw".into(),
            });
        let value = serde_json::to_value(Block::MacroBlock(MacroNode::new(call))).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "macroBlock",
                "call": {"id": "info", "params": {"title": "Note"}, "body": {"type": "raw", "content": "raw"}}
            })
        );

        let none: MacroBody = serde_json::from_value(json!({"type": "none"})).unwrap();
        assert_eq!(none, MacroBody::None);
    }

    #[test]
    fn test_opaque_blocks_have_no_styles() {
        assert!(Block::Break.styles().is_none());
        assert!(Block::CodeBlock(CodeBlock::default()).styles().is_none());
        assert!(Block::MacroBlockEditableArea.styles().is_none());
        assert!(Block::paragraph(vec![]).styles().is_some());
    }

    #[test]
    fn test_image_blocks_expose_their_styles() {
        let mut image = Image::new(LinkTarget::external("https://example.com/a.png"));
        image.styles.alignment = Some(Alignment::Center);
        let block = Block::Image(image);
        let styles = block.styles().unwrap();
        assert!(matches!(styles, StylesRef::Image(_)));
        assert_eq!(styles.alignment(), Some(Alignment::Center));
    }

    #[test]
    fn test_heading_level_is_clamped() {
        match Block::heading(9, vec![]) {
            Block::Heading(h) => assert_eq!(h.level, 6),
            other => panic!("unexpected block {other:?}"),
        }
    }

    #[test]
    fn test_unit_variants_round_trip() {
        let ast = UniAst::new(vec![Block::Break, Block::MacroBlockEditableArea]);
        let json = serde_json::to_string(&ast).unwrap();
        assert_eq!(
            json,
            r#"{"blocks":[{"type":"break"},{"type":"macroBlockEditableArea"}]}"#
        );
        assert_eq!(serde_json::from_str::<UniAst>(&json).unwrap(), ast);
    }
}
