//! Markdown format implementation
//!
//! Bidirectional conversion between UniAst and CommonMark with the GFM table,
//! strikethrough and task list extensions.
//!
//! # Library Choice
//!
//! `comrak` handles both directions. The parser lets comrak build its AST and then
//! runs our own inline rules over the flattened inline content; the serializer builds
//! a comrak AST and lets comrak write it out.
//!
//! # Element Mapping Table
//!
//! | UniAst Element        | Markdown Equivalent              | Notes                                 |
//! |-----------------------|----------------------------------|---------------------------------------|
//! | paragraph             | Paragraph                        | Direct                                |
//! | heading               | ATX heading                      | Level 1-6                             |
//! | bullet/checked items  | `- item`, `- [x] item`           | Consecutive items form one list       |
//! | numbered items        | `1. item`                        | Start number kept, gaps are not       |
//! | blockQuote            | `> quote`                        | Direct                                |
//! | codeBlock             | Fenced code block                | Language → info string                |
//! | table                 | GFM table                        | Short rows padded on export           |
//! | image                 | `![alt](url)` or `![[alt\|ref]]` | Alone in a paragraph, see below       |
//! | break                 | Thematic break                   | Direct                                |
//! | macroBlock            | `{{id k="v" /}}` paragraph       | Multi-paragraph bodies use open/close |
//! | raw macro body        | `{{id}}body{{/id}}`              | Multi-line: fenced `macro-raw` block  |
//! | InlineContent:        |                                  |                                       |
//! |   text                | Emphasis, strong, `~~`, `<u>`    | Colors dropped                        |
//! |   code style          | `code`                           | Direct                                |
//! |   internal link       | `[[caption\|ref]]`               | Depends on the link strategy          |
//! |   external link       | `[text](url)`                    | Direct                                |
//! |   inlineMacro         | `{{id /}}` in running text       | Direct                                |
//! |   text `{{`           | `\{{`                            | Escaped so text never reads as a macro|
//!
//! # Lossy Conversions
//!
//! - Text and background colors, alignment (no Markdown form)
//! - Image captions and dimensions, table spans and column widths
//! - Editable-area placeholders (editor-only nodes)
//! - Explicit numbers of list items after the first one
//! - Block images: Markdown images are inline, so a block image comes back as a
//!   paragraph holding one inline image. That paragraph is the canonical form.

pub mod inline;
pub mod links;
pub mod parser;
pub mod rules;
pub mod serializer;

pub use links::{
    FileSystemLinkSerializer, InternalLinkSerializer, InternalTarget, MetadataClient,
    RemoteLinkSerializer, WikiLinkSerializer,
};
#[cfg(feature = "remote-links")]
pub use links::HttpMetadataClient;
pub use parser::{parse_markdown, parse_markdown_with, MarkdownParser, MarkdownParserOptions};
pub use rules::{InlineRule, InlineRuleSet};
pub use serializer::{serialize_markdown, InlineMarkdown};

use crate::error::Result;
use crate::format::Format;
use crate::ir::nodes::UniAst;
use crate::reference::ReferenceContext;
use async_trait::async_trait;
use comrak::ComrakOptions;
use std::sync::Arc;

/// Info string of the fenced block carrying a multi-line raw macro body between the
/// opening and closing tags.
pub(crate) const RAW_MACRO_BODY: &str = "macro-raw";

/// comrak options shared by the parser and the serializer.
pub(crate) fn comrak_options() -> ComrakOptions<'static> {
    let mut options = ComrakOptions::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.tasklist = true;
    options.extension.autolink = false;
    options.parse.smart = false;
    options.render.unsafe_ = true;
    options.render.escaped_char_spans = true;
    options
}

/// Format implementation for Markdown
pub struct MarkdownFormat {
    parser: MarkdownParser,
    links: Arc<dyn InternalLinkSerializer>,
}

impl MarkdownFormat {
    pub fn new(parser: MarkdownParser, links: Arc<dyn InternalLinkSerializer>) -> Self {
        Self { parser, links }
    }
}

impl Default for MarkdownFormat {
    fn default() -> Self {
        Self::new(
            MarkdownParser::new(ReferenceContext::default()),
            Arc::new(WikiLinkSerializer),
        )
    }
}

#[async_trait]
impl Format for MarkdownFormat {
    fn name(&self) -> &str {
        "markdown"
    }

    fn description(&self) -> &str {
        "CommonMark Markdown with wiki links and macros"
    }

    fn file_extensions(&self) -> &[&str] {
        &["md", "markdown"]
    }

    fn supports_parsing(&self) -> bool {
        true
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn parse(&self, source: &str) -> Result<UniAst> {
        self.parser.parse(source)
    }

    async fn serialize(&self, ast: &UniAst) -> Result<String> {
        serialize_markdown(ast, self.links.as_ref()).await
    }
}
