//! Textual macro syntax shared by the Markdown parser and serializer.
//!
//! ```text
//!     {{id key="value" other=bare /}}          self-closing
//!     {{id key="value"}}body{{/id}}            paired, raw body
//!     {{id}} ... blocks ... {{/id}}            opening tag alone, closed further down
//! ```
//!
//! Quoted values support `\"` and `\\` (any escaped character stands for itself).
//! Bare values stop at whitespace, `/` or `}`.

use crate::ir::nodes::{MacroBody, MacroInvocation};
use std::collections::BTreeMap;

/// What a macro tag turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum MacroSyntax {
    /// `{{id /}}`, or `{{id}}body{{/id}}` with the body kept raw
    Complete(MacroInvocation),
    /// `{{id}}` whose closing tag was not found in the same input
    Open(MacroInvocation),
}

struct Tag {
    id: String,
    params: BTreeMap<String, String>,
    self_closing: bool,
    /// Byte length of the tag in the input
    len: usize,
}

/// Parse a macro at the start of `input`, returning the syntax and the number of bytes consumed.
///
/// A paired macro is only complete when its closing tag occurs in `input`; otherwise the
/// opening tag alone is returned as [`MacroSyntax::Open`].
pub fn parse_prefix(input: &str) -> Option<(MacroSyntax, usize)> {
    let tag = parse_tag(input)?;
    let call = MacroInvocation {
        id: tag.id.clone(),
        params: tag.params,
        body: MacroBody::None,
    };
    if tag.self_closing {
        return Some((MacroSyntax::Complete(call), tag.len));
    }

    let rest = &input[tag.len..];
    match find_close(rest, &tag.id) {
        Some((start, end)) => {
            let body = &rest[..start];
            let call = call.with_body(MacroBody::Raw {
                content: body.to_string(),
            });
            Some((MacroSyntax::Complete(call), tag.len + end))
        }
        None => Some((MacroSyntax::Open(call), tag.len)),
    }
}

/// Parse `input` as exactly one macro, surrounding whitespace allowed.
pub fn parse_exact(input: &str) -> Option<MacroSyntax> {
    let trimmed = input.trim();
    let (syntax, consumed) = parse_prefix(trimmed)?;
    (consumed == trimmed.len()).then_some(syntax)
}

/// Match a lone closing tag `{{/id}}`, returning the id.
pub fn parse_close(input: &str) -> Option<&str> {
    let inner = input.trim().strip_prefix("{{")?.strip_suffix("}}")?;
    let id = inner.trim().strip_prefix('/')?.trim();
    (!id.is_empty() && !id.contains(char::is_whitespace)).then_some(id)
}

/// `{{id k="v" /}}`
pub fn format_self_closing(call: &MacroInvocation) -> String {
    format!("{{{{{}{} /}}}}", call.id, format_params(&call.params))
}

/// `{{id k="v"}}`
pub fn format_open(call: &MacroInvocation) -> String {
    format!("{{{{{}{}}}}}", call.id, format_params(&call.params))
}

/// `{{/id}}`
pub fn format_close(id: &str) -> String {
    format!("{{{{/{id}}}}}")
}

fn format_params(params: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    for (key, value) in params {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        for c in value.chars() {
            if c == '"' || c == '\\' {
                out.push('\\');
            }
            out.push(c);
        }
        out.push('"');
    }
    out
}

fn is_stop(c: char) -> bool {
    c.is_whitespace() || c == '/' || c == '}' || c == '='
}

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: &str) -> bool {
        if self.rest().starts_with(expected) {
            self.pos += expected.len();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn word(&mut self) -> Option<String> {
        let start = self.pos;
        while self.peek().is_some_and(|c| !is_stop(c)) {
            self.bump();
        }
        (self.pos > start).then(|| self.input[start..self.pos].to_string())
    }

    fn quoted(&mut self) -> Option<String> {
        let mut value = String::new();
        loop {
            match self.bump()? {
                '"' => return Some(value),
                '\\' => value.push(self.bump()?),
                c => value.push(c),
            }
        }
    }
}

fn parse_tag(input: &str) -> Option<Tag> {
    let mut cursor = Cursor { input, pos: 0 };
    if !cursor.eat("{{") {
        return None;
    }
    cursor.skip_whitespace();
    let id = cursor.word()?;

    let mut params = BTreeMap::new();
    loop {
        cursor.skip_whitespace();
        if cursor.eat("/") {
            cursor.skip_whitespace();
            if !cursor.eat("}}") {
                return None;
            }
            return Some(Tag {
                id,
                params,
                self_closing: true,
                len: cursor.pos,
            });
        }
        if cursor.eat("}}") {
            return Some(Tag {
                id,
                params,
                self_closing: false,
                len: cursor.pos,
            });
        }

        let key = cursor.word()?;
        cursor.skip_whitespace();
        if !cursor.eat("=") {
            return None;
        }
        cursor.skip_whitespace();
        let value = if cursor.eat("\"") {
            cursor.quoted()?
        } else {
            cursor.word()?
        };
        params.insert(key, value);
    }
}

/// Locate the closing tag of `id` in `input`, skipping nested macros with the same id.
/// Returns the byte range of the closing tag.
fn find_close(input: &str, id: &str) -> Option<(usize, usize)> {
    let mut depth = 0usize;
    let mut pos = 0;
    while let Some(offset) = input[pos..].find("{{") {
        let start = pos + offset;
        let rest = &input[start..];
        if let Some(end) = rest.find("}}") {
            let candidate = &rest[..end + 2];
            if parse_close(candidate) == Some(id) {
                if depth == 0 {
                    return Some((start, start + end + 2));
                }
                depth -= 1;
                pos = start + end + 2;
                continue;
            }
        }
        if let Some(tag) = parse_tag(rest) {
            if tag.id == id && !tag.self_closing {
                depth += 1;
            }
            pos = start + tag.len;
        } else {
            pos = start + 2;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete(input: &str) -> MacroInvocation {
        match parse_exact(input) {
            Some(MacroSyntax::Complete(call)) => call,
            other => panic!("expected a complete macro, got {other:?}"),
        }
    }

    #[test]
    fn test_self_closing_forms() {
        assert_eq!(complete("{{macro /}}"), MacroInvocation::new("macro"));
        assert_eq!(complete("{{  macro  / }}"), MacroInvocation::new("macro"));
        assert_eq!(
            complete("{{macro param1=1/}}"),
            MacroInvocation::new("macro").with_param("param1", "1")
        );
    }

    #[test]
    fn test_quoted_values_with_escapes() {
        let call = complete(r#"{{macro title="a \"quoted\" }} and \\ slash" n=2 /}}"#);
        assert_eq!(call.params["title"], r#"a "quoted" }} and \ slash"#);
        assert_eq!(call.params["n"], "2");
    }

    #[test]
    fn test_paired_macro_keeps_raw_body() {
        let call = complete("{{code lang=rust}}fn main() {}{{/code}}");
        assert_eq!(
            call.body,
            MacroBody::Raw {
                content: "fn main() {}".into()
            }
        );
    }

    #[test]
    fn test_nested_same_id_is_skipped() {
        let call = complete("{{box}}a{{box}}b{{/box}}c{{/box}}");
        assert_eq!(
            call.body,
            MacroBody::Raw {
                content: "a{{box}}b{{/box}}c".into()
            }
        );
    }

    #[test]
    fn test_open_and_close_tags() {
        assert_eq!(
            parse_exact("{{info title=x}}"),
            Some(MacroSyntax::Open(
                MacroInvocation::new("info").with_param("title", "x")
            ))
        );
        assert_eq!(parse_close("{{/info}}"), Some("info"));
        assert_eq!(parse_close("{{ / info }}"), Some("info"));
        assert_eq!(parse_close("{{info}}"), None);
    }

    #[test]
    fn test_rejects_malformed_tags() {
        assert_eq!(parse_exact("{{}}"), None);
        assert_eq!(parse_exact("{{macro key /}}"), None);
        assert_eq!(parse_exact(r#"{{macro key="unterminated /}}"#), None);
        assert_eq!(parse_exact("{{macro /}} trailing"), None);
        assert_eq!(parse_exact("text"), None);
    }

    #[test]
    fn test_prefix_reports_consumed_length() {
        let (syntax, consumed) = parse_prefix("{{a /}} tail").unwrap();
        assert_eq!(syntax, MacroSyntax::Complete(MacroInvocation::new("a")));
        assert_eq!(consumed, "{{a /}}".len());
    }

    #[test]
    fn test_format_round_trips() {
        let call = MacroInvocation::new("macro")
            .with_param("param1", "some \" quote and \\ slash")
            .with_param("param2", "2");
        let text = format_self_closing(&call);
        assert_eq!(
            text,
            r#"{{macro param1="some \" quote and \\ slash" param2="2" /}}"#
        );
        assert_eq!(complete(&text), call);
        assert_eq!(format_self_closing(&MacroInvocation::new("m")), "{{m /}}");
        assert_eq!(
            format_open(&MacroInvocation::new("m").with_param("a", "b")),
            r#"{{m a="b"}}"#
        );
        assert_eq!(format_close("m"), "{{/m}}");
    }
}
