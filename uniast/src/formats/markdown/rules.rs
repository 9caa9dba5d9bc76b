//! Custom inline rules layered over CommonMark.
//!
//! Rules run in ascending priority at every position of the inline scan; the first
//! one that applies consumes input. Internal images (`![[...]]`) must be tried
//! before internal links (`[[...]]`) since the link rule would otherwise claim the
//! brackets of an image, so both carry explicit priorities instead of relying on
//! registration order.

use super::inline::{
    as_text, flatten_to_texts, internal_target, is_balanced, plain_text, Atom, InlineState,
};
use crate::common::macro_syntax::{self, MacroSyntax};
use crate::ir::nodes::{Image, InlineContent, Link, MacroNode, Text};
use crate::reference::EntityType;
use std::fmt;
use std::sync::Arc;

pub const INTERNAL_IMAGE: &str = "internal-image";
pub const INTERNAL_LINK: &str = "internal-link";
pub const INLINE_MACRO: &str = "inline-macro";

pub const INTERNAL_IMAGE_PRIORITY: u32 = 100;
pub const INTERNAL_LINK_PRIORITY: u32 = 200;
pub const INLINE_MACRO_PRIORITY: u32 = 300;

/// An inline syntax extension.
pub trait InlineRule: Send + Sync {
    fn name(&self) -> &'static str;

    /// Lower runs first.
    fn priority(&self) -> u32;

    /// Try the rule at `state.pos()`. With `silent` set the rule only reports whether it
    /// would apply and leaves `state` untouched; otherwise it emits its node and moves
    /// the position past the consumed atoms.
    fn apply(&self, state: &mut InlineState<'_>, silent: bool) -> bool;
}

/// Rules ordered by priority, ties kept in registration order.
#[derive(Clone, Default)]
pub struct InlineRuleSet {
    rules: Vec<Arc<dyn InlineRule>>,
}

impl InlineRuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Internal images, internal links and inline macros.
    pub fn standard(nested_internal_links: bool) -> Self {
        let mut rules = Self::new();
        rules.register(InternalImageRule);
        rules.register(InternalLinkRule {
            nested: nested_internal_links,
        });
        rules.register(InlineMacroRule);
        rules
    }

    pub fn register<R: InlineRule + 'static>(&mut self, rule: R) {
        self.rules.push(Arc::new(rule));
        self.rules.sort_by_key(|rule| rule.priority());
    }

    /// A copy of this set without the rule called `name`.
    pub fn without(&self, name: &str) -> Self {
        Self {
            rules: self
                .rules
                .iter()
                .filter(|rule| rule.name() != name)
                .cloned()
                .collect(),
        }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn InlineRule> {
        self.rules.iter().map(|rule| rule.as_ref())
    }
}

impl fmt::Debug for InlineRuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

fn is_char(atoms: &[Atom], index: usize, expected: char) -> bool {
    matches!(atoms.get(index), Some(Atom::Char(c)) if *c == expected)
}

/// Index of the `]]` closing a `[[` whose content starts at `start`.
///
/// Every literal `[[` met on the way opens a nested level unless `nested` is off, in
/// which case the first `]]` closes.
pub fn find_closing(atoms: &[Atom], start: usize, nested: bool) -> Option<usize> {
    let mut level = 1usize;
    let mut i = start;
    while i + 1 < atoms.len() {
        if nested && is_char(atoms, i, '[') && is_char(atoms, i + 1, '[') {
            level += 1;
            i += 2;
        } else if is_char(atoms, i, ']') && is_char(atoms, i + 1, ']') {
            level -= 1;
            if level == 0 {
                return Some(i);
            }
            i += 2;
        } else {
            i += 1;
        }
    }
    None
}

/// A matched `[[caption|reference]]`.
#[derive(Debug, PartialEq)]
pub struct BracketSpan<'a> {
    pub caption: Option<&'a [Atom]>,
    pub reference: String,
    /// First atom after the closing `]]`
    pub end: usize,
}

/// Match the bracket construct whose content starts at `start`, splitting on the last
/// literal `|`. The reference must be plain text and the caption must not cut through
/// a styled run.
pub fn scan_brackets(atoms: &[Atom], start: usize, nested: bool) -> Option<BracketSpan<'_>> {
    let close = find_closing(atoms, start, nested)?;
    let span = &atoms[start..close];
    let (caption, reference) = match span.iter().rposition(|atom| *atom == Atom::Char('|')) {
        Some(bar) => (Some(&span[..bar]), &span[bar + 1..]),
        None => (None, span),
    };
    let reference = as_text(reference)?.trim().to_string();
    if reference.is_empty() {
        return None;
    }
    if let Some(caption) = caption {
        if !is_balanced(caption) {
            return None;
        }
    }
    Some(BracketSpan {
        caption,
        reference,
        end: close + 2,
    })
}

/// `![[reference]]` and `![[caption|reference]]`
#[derive(Debug, Clone, Copy, Default)]
pub struct InternalImageRule;

impl InlineRule for InternalImageRule {
    fn name(&self) -> &'static str {
        INTERNAL_IMAGE
    }

    fn priority(&self) -> u32 {
        INTERNAL_IMAGE_PRIORITY
    }

    fn apply(&self, state: &mut InlineState<'_>, silent: bool) -> bool {
        let atoms = state.atoms();
        let pos = state.pos();
        if !(is_char(atoms, pos, '!') && is_char(atoms, pos + 1, '[') && is_char(atoms, pos + 2, '['))
        {
            return false;
        }
        let Some(span) = scan_brackets(atoms, pos + 3, true) else {
            tracing::debug!(pos, "unclosed internal image");
            return false;
        };
        if silent {
            return true;
        }

        let mut image = Image::new(internal_target(
            state.ctx(),
            &span.reference,
            EntityType::Attachment,
        ));
        image.alt = span.caption.map(plain_text);
        state.push(InlineContent::Image(image));
        state.set_pos(span.end);
        true
    }
}

/// `[[reference]]` and `[[caption|reference]]`
#[derive(Debug, Clone, Copy)]
pub struct InternalLinkRule {
    /// When off, the first `]]` closes the link.
    pub nested: bool,
}

impl Default for InternalLinkRule {
    fn default() -> Self {
        Self { nested: true }
    }
}

impl InlineRule for InternalLinkRule {
    fn name(&self) -> &'static str {
        INTERNAL_LINK
    }

    fn priority(&self) -> u32 {
        INTERNAL_LINK_PRIORITY
    }

    fn apply(&self, state: &mut InlineState<'_>, silent: bool) -> bool {
        let atoms = state.atoms();
        let pos = state.pos();
        if !(is_char(atoms, pos, '[') && is_char(atoms, pos + 1, '[')) {
            return false;
        }
        let Some(span) = scan_brackets(atoms, pos + 2, self.nested) else {
            tracing::debug!(pos, "unclosed internal link");
            return false;
        };
        if silent {
            return true;
        }

        let content = match span.caption {
            Some(caption) => flatten_to_texts(state.convert_nested(caption, INTERNAL_LINK)),
            None => vec![Text {
                content: span.reference.clone(),
                styles: state.styles(),
            }],
        };
        state.push(InlineContent::Link(Link {
            target: internal_target(state.ctx(), &span.reference, EntityType::Document),
            content,
        }));
        state.set_pos(span.end);
        true
    }
}

/// `{{id params /}}` and `{{id params}}body{{/id}}` inside running text
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineMacroRule;

impl InlineRule for InlineMacroRule {
    fn name(&self) -> &'static str {
        INLINE_MACRO
    }

    fn priority(&self) -> u32 {
        INLINE_MACRO_PRIORITY
    }

    fn apply(&self, state: &mut InlineState<'_>, silent: bool) -> bool {
        let atoms = state.atoms();
        let pos = state.pos();
        if !(is_char(atoms, pos, '{') && is_char(atoms, pos + 1, '{')) {
            return false;
        }

        let mut text = String::new();
        let mut offsets = Vec::new();
        for atom in &atoms[pos..] {
            let Some(c) = atom.as_char() else { break };
            offsets.push(text.len());
            text.push(c);
        }
        offsets.push(text.len());

        let Some((MacroSyntax::Complete(call), consumed)) = macro_syntax::parse_prefix(&text)
        else {
            return false;
        };
        let Some(count) = offsets.iter().position(|offset| *offset == consumed) else {
            return false;
        };
        if silent {
            return true;
        }

        state.push(InlineContent::InlineMacro(MacroNode::new(call)));
        state.set_pos(pos + count);
        true
    }
}
