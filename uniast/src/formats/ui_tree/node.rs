use super::MacroRenderMode;
use crate::ir::nodes::Alignment;
use serde::Serialize;
use std::collections::BTreeMap;

/// One node of the editor tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UiNode {
    /// Root hash plus index path; unique within one render
    pub key: String,
    #[serde(flatten)]
    pub kind: UiKind,
    #[serde(skip_serializing_if = "UiStyle::is_empty")]
    pub style: UiStyle,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<UiNode>,
}

impl UiNode {
    pub fn new(kind: UiKind, children: Vec<UiNode>) -> Self {
        Self {
            key: String::new(),
            kind,
            style: UiStyle::default(),
            children,
        }
    }

    pub fn leaf(kind: UiKind) -> Self {
        Self::new(kind, Vec::new())
    }

    pub fn styled(mut self, style: UiStyle) -> Self {
        self.style = style;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum UiKind {
    Document,
    Paragraph,
    Heading {
        level: u8,
    },
    BulletList,
    NumberedList {
        start: u32,
    },
    ListItem {
        #[serde(skip_serializing_if = "Option::is_none")]
        checked: Option<bool>,
    },
    BlockQuote,
    CodeBlock {
        #[serde(skip_serializing_if = "Option::is_none")]
        language: Option<String>,
        content: String,
    },
    #[serde(rename_all = "camelCase")]
    Table {
        column_widths: Vec<Option<f64>>,
    },
    TableRow {
        header: bool,
    },
    #[serde(rename_all = "camelCase")]
    TableCell {
        header: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        row_span: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        col_span: Option<u32>,
    },
    Image {
        src: String,
        alt: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        width: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        height: Option<f64>,
    },
    Break,
    /// A block macro; `props` are the call parameters with their natural types
    Macro {
        name: String,
        props: BTreeMap<String, PropValue>,
    },
    InlineMacro {
        name: String,
        props: BTreeMap<String, PropValue>,
    },
    /// Where the host editor mounts a macro's nested editable content
    EditableArea {
        mode: MacroRenderMode,
    },
    Text {
        content: String,
    },
    Link {
        href: String,
        internal: bool,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UiStyle {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub italic: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub strikethrough: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub underline: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub code: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_align: Option<Alignment>,
}

impl UiStyle {
    pub fn is_empty(&self) -> bool {
        *self == UiStyle::default()
    }
}

/// A macro parameter as the editor widgets expect it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropValue {
    Bool(bool),
    Number(f64),
    String(String),
}

impl PropValue {
    /// `true`/`false` become booleans. A number is only taken when it prints back as the
    /// exact same text, so `007`, ` 7` or `1e3` stay strings.
    pub fn coerce(raw: &str) -> Self {
        match raw {
            "true" => return PropValue::Bool(true),
            "false" => return PropValue::Bool(false),
            _ => {}
        }
        match raw.parse::<f64>() {
            Ok(number) if number.is_finite() && number.to_string() == raw => {
                PropValue::Number(number)
            }
            _ => PropValue::String(raw.to_string()),
        }
    }
}

/// Position of a mounted editable area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MountPoint {
    pub key: String,
}
