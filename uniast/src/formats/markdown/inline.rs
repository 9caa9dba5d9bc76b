//! Inline scanning over comrak's inline tree.
//!
//! comrak has already resolved emphasis, code spans, standard links and escapes by
//! the time we see a paragraph. Those are flattened into a stream of [`Atom`]s, one
//! per character of text plus one per structural marker, and the custom rules then
//! run over that stream left to right. An escaped `[` is a different atom than a
//! literal one and a code span is a single atom, so neither can take part in a
//! `[[...]]` construct.

use super::rules::InlineRuleSet;
use crate::ir::nodes::{Image, InlineContent, Link, LinkTarget, Text, TextStyles};
use crate::reference::{EntityType, ReferenceContext};
use comrak::nodes::{AstNode, NodeValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Bold,
    Italic,
    Strikethrough,
    Underline,
}

/// One unit of inline input.
#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    Char(char),
    /// A backslash-escaped character
    Escaped(char),
    Open(Style),
    Close(Style),
    Code(String),
    /// Standard Markdown link, already parsed by comrak
    Link { url: String, children: Vec<Atom> },
    /// Standard Markdown image
    Image { url: String, alt: String },
    /// Raw inline HTML other than the underline tags
    Html(String),
}

impl Atom {
    /// The character this atom stands for, if it is plain text.
    pub fn as_char(&self) -> Option<char> {
        match self {
            Atom::Char(c) | Atom::Escaped(c) => Some(*c),
            _ => None,
        }
    }
}

/// Flatten the inline children of `node` into atoms.
pub(crate) fn collect_atoms<'a>(node: &'a AstNode<'a>, out: &mut Vec<Atom>) {
    for child in node.children() {
        match &child.data.borrow().value {
            NodeValue::Text(text) => out.extend(text.chars().map(Atom::Char)),
            NodeValue::Escaped => {
                let mut inner = Vec::new();
                collect_atoms(child, &mut inner);
                out.extend(inner.into_iter().map(|atom| match atom {
                    Atom::Char(c) => Atom::Escaped(c),
                    other => other,
                }));
            }
            NodeValue::SoftBreak | NodeValue::LineBreak => out.push(Atom::Char('\n')),
            NodeValue::Strong => wrap(child, Style::Bold, out),
            NodeValue::Emph => wrap(child, Style::Italic, out),
            NodeValue::Strikethrough => wrap(child, Style::Strikethrough, out),
            NodeValue::Code(code) => out.push(Atom::Code(code.literal.clone())),
            NodeValue::HtmlInline(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "<u>" => out.push(Atom::Open(Style::Underline)),
                "</u>" => out.push(Atom::Close(Style::Underline)),
                _ => out.push(Atom::Html(raw.clone())),
            },
            NodeValue::Link(link) => {
                let mut children = Vec::new();
                collect_atoms(child, &mut children);
                out.push(Atom::Link {
                    url: link.url.clone(),
                    children,
                });
            }
            NodeValue::Image(link) => {
                let mut children = Vec::new();
                collect_atoms(child, &mut children);
                out.push(Atom::Image {
                    url: link.url.clone(),
                    alt: plain_text(&children),
                });
            }
            _ => collect_atoms(child, out),
        }
    }
}

fn wrap<'a>(node: &'a AstNode<'a>, style: Style, out: &mut Vec<Atom>) {
    out.push(Atom::Open(style));
    collect_atoms(node, out);
    out.push(Atom::Close(style));
}

/// Text of the atoms, markers dropped.
pub fn plain_text(atoms: &[Atom]) -> String {
    let mut text = String::new();
    for atom in atoms {
        match atom {
            Atom::Char(c) | Atom::Escaped(c) => text.push(*c),
            Atom::Code(code) | Atom::Html(code) => text.push_str(code),
            Atom::Link { children, .. } => text.push_str(&plain_text(children)),
            Atom::Image { alt, .. } => text.push_str(alt),
            Atom::Open(_) | Atom::Close(_) => {}
        }
    }
    text
}

/// The atoms as a string when every one of them is text.
pub fn as_text(atoms: &[Atom]) -> Option<String> {
    atoms.iter().map(Atom::as_char).collect()
}

/// Whether every style opened in `atoms` is also closed there, and never closed first.
pub fn is_balanced(atoms: &[Atom]) -> bool {
    let mut counts = StyleCounts::default();
    for atom in atoms {
        match atom {
            Atom::Open(style) => counts.add(*style, 1),
            Atom::Close(style) => {
                counts.add(*style, -1);
                if counts.any_negative() {
                    return false;
                }
            }
            _ => {}
        }
    }
    counts == StyleCounts::default()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct StyleCounts {
    bold: i32,
    italic: i32,
    strikethrough: i32,
    underline: i32,
}

impl StyleCounts {
    fn add(&mut self, style: Style, delta: i32) {
        match style {
            Style::Bold => self.bold += delta,
            Style::Italic => self.italic += delta,
            Style::Strikethrough => self.strikethrough += delta,
            Style::Underline => self.underline += delta,
        }
    }

    fn any_negative(&self) -> bool {
        self.bold < 0 || self.italic < 0 || self.strikethrough < 0 || self.underline < 0
    }
}

/// Target of a standard link or image: internal when the URL belongs to the backend.
pub(crate) fn target_from_url(ctx: &ReferenceContext, url: &str) -> LinkTarget {
    match ctx.parse_reference_from_url(url) {
        Some(reference) => LinkTarget::internal(ctx.serialize_reference(&reference), Some(reference)),
        None => LinkTarget::external(url),
    }
}

/// Append `text`, merging with the previous run when the styles match.
pub(crate) fn push_text(out: &mut Vec<InlineContent>, text: Text) {
    if text.content.is_empty() {
        return;
    }
    if let Some(InlineContent::Text(last)) = out.last_mut() {
        if last.styles == text.styles {
            last.content.push_str(&text.content);
            return;
        }
    }
    out.push(InlineContent::Text(text));
}

/// Reduce inline content to the text runs a link can hold.
pub fn flatten_to_texts(content: Vec<InlineContent>) -> Vec<Text> {
    let mut flat = Vec::new();
    for inline in content {
        match inline {
            InlineContent::Text(text) => push_text(&mut flat, text),
            InlineContent::Link(link) => {
                for text in link.content {
                    push_text(&mut flat, text);
                }
            }
            InlineContent::Image(image) => {
                if let Some(alt) = image.alt {
                    push_text(&mut flat, Text::plain(alt));
                }
            }
            InlineContent::InlineMacro(_) | InlineContent::InlineMacroEditableArea => {}
        }
    }
    flat.into_iter()
        .filter_map(|inline| match inline {
            InlineContent::Text(text) => Some(text),
            _ => None,
        })
        .collect()
}

/// Scanning state handed to the inline rules.
pub struct InlineState<'a> {
    atoms: &'a [Atom],
    pos: usize,
    base: TextStyles,
    open: StyleCounts,
    pending: String,
    output: Vec<InlineContent>,
    ctx: &'a ReferenceContext,
    rules: &'a InlineRuleSet,
}

impl<'a> InlineState<'a> {
    pub(crate) fn new(
        atoms: &'a [Atom],
        base: TextStyles,
        ctx: &'a ReferenceContext,
        rules: &'a InlineRuleSet,
    ) -> Self {
        Self {
            atoms,
            pos: 0,
            base,
            open: StyleCounts::default(),
            pending: String::new(),
            output: Vec::new(),
            ctx,
            rules,
        }
    }

    pub fn atoms(&self) -> &'a [Atom] {
        self.atoms
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Move the scan position forward; rules call this after consuming input.
    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos.min(self.atoms.len());
    }

    pub fn ctx(&self) -> &'a ReferenceContext {
        self.ctx
    }

    /// Styles in effect at the current position.
    pub fn styles(&self) -> TextStyles {
        let mut styles = self.base.clone();
        styles.bold |= self.open.bold > 0;
        styles.italic |= self.open.italic > 0;
        styles.strikethrough |= self.open.strikethrough > 0;
        styles.underline |= self.open.underline > 0;
        styles
    }

    /// Emit a finished node after any pending text.
    pub fn push(&mut self, inline: InlineContent) {
        self.flush();
        match inline {
            InlineContent::Text(text) => push_text(&mut self.output, text),
            other => self.output.push(other),
        }
    }

    /// Convert a sub-range of atoms with the current styles as a base, leaving out one rule.
    pub fn convert_nested(&self, atoms: &[Atom], without_rule: &str) -> Vec<InlineContent> {
        let rules = self.rules.without(without_rule);
        convert_with_base(atoms, self.styles(), self.ctx, &rules)
    }

    #[cfg(test)]
    pub(crate) fn emitted(&self) -> &[InlineContent] {
        &self.output
    }

    fn flush(&mut self) {
        if !self.pending.is_empty() {
            let text = Text {
                content: std::mem::take(&mut self.pending),
                styles: self.styles(),
            };
            push_text(&mut self.output, text);
        }
    }

    fn run(mut self) -> Vec<InlineContent> {
        let rules = self.rules;
        while self.pos < self.atoms.len() {
            let before = self.pos;
            let candidate = rules.iter().find(|rule| rule.apply(&mut self, true));
            let matched = match candidate {
                Some(rule) => rule.apply(&mut self, false) && self.pos > before,
                None => false,
            };
            if !matched {
                self.pos = before;
                self.step();
            }
        }
        self.flush();
        self.output
    }

    fn step(&mut self) {
        let atoms = self.atoms;
        match &atoms[self.pos] {
            Atom::Char(c) | Atom::Escaped(c) => self.pending.push(*c),
            Atom::Html(raw) => self.pending.push_str(raw),
            Atom::Open(style) => {
                self.flush();
                self.open.add(*style, 1);
            }
            Atom::Close(style) => {
                self.flush();
                self.open.add(*style, -1);
            }
            Atom::Code(code) => {
                let mut styles = self.styles();
                styles.code = true;
                self.push(InlineContent::Text(Text {
                    content: code.clone(),
                    styles,
                }));
            }
            Atom::Link { url, children } => {
                let content = self.convert_nested(children, super::rules::INTERNAL_LINK);
                self.push(InlineContent::Link(Link {
                    target: target_from_url(self.ctx, url),
                    content: flatten_to_texts(content),
                }));
            }
            Atom::Image { url, alt } => {
                let mut image = Image::new(target_from_url(self.ctx, url));
                image.alt = (!alt.is_empty()).then(|| alt.clone());
                self.push(InlineContent::Image(image));
            }
        }
        self.pos += 1;
    }
}

/// Run `rules` over `atoms`.
pub fn convert(atoms: &[Atom], ctx: &ReferenceContext, rules: &InlineRuleSet) -> Vec<InlineContent> {
    convert_with_base(atoms, TextStyles::default(), ctx, rules)
}

fn convert_with_base(
    atoms: &[Atom],
    base: TextStyles,
    ctx: &ReferenceContext,
    rules: &InlineRuleSet,
) -> Vec<InlineContent> {
    InlineState::new(atoms, base, ctx, rules).run()
}

/// Resolve a raw internal reference into a link target, keeping the raw form.
pub(crate) fn internal_target(
    ctx: &ReferenceContext,
    raw: &str,
    entity_type: EntityType,
) -> LinkTarget {
    LinkTarget::internal(raw, ctx.parse_reference(raw, Some(entity_type)))
}
