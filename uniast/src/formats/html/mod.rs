//! HTML format implementation
//!
//! Export only: UniAst blocks become an HTML fragment.
//!
//! # Library Choice
//!
//! `html5ever` + `markup5ever_rcdom`: the renderer builds an RcDom tree and lets the
//! html5ever serializer write it. Text is never concatenated into markup, so user
//! content cannot inject tags.
//!
//! # Element Mapping Table
//!
//! | UniAst Element        | HTML Equivalent                                  | Notes                                   |
//! |-----------------------|--------------------------------------------------|-----------------------------------------|
//! | paragraph             | `<p>`                                            | Block styles → `style` attribute        |
//! | heading               | `<h1>` … `<h6>`                                  | Direct                                  |
//! | bullet/checked items  | `<ul><li>`                                       | Checked items get a disabled checkbox   |
//! | numbered items        | `<ol><li>`                                       | `start` when the first number is not 1  |
//! | blockQuote            | `<blockquote>`                                   | Direct                                  |
//! | codeBlock             | `<pre data-language="…">`                        | Escaped text                            |
//! | table                 | `<table>` `<colgroup>` `<thead>` `<tbody>`       | colgroup/thead only when needed         |
//! | image                 | `<figure><img><figcaption>`                      | Alignment on the figure                 |
//! | break                 | `<hr>`                                           | Direct                                  |
//! | editable areas        | `<!--macro-editable-area-->`                     | Inert marker                            |
//! | macroBlock, inlineMacro | (error)                                        | Macros are rendered by the UI layer     |
//! | InlineContent:        |                                                  |                                         |
//! |   text                | `<pre>` `<strong>` `<em>` `<s>` `<u>` `<span>`   | Nested in that order, outermost first   |
//! |   link                | `<a href>`                                       | Internal hrefs via the reference context |
//! |   image               | `<img src alt>`                                  | Empty alt when none is set              |

pub mod serializer;

pub use serializer::{blocks_to_html, inline_contents_to_html};

use crate::error::Result;
use crate::format::Format;
use crate::ir::nodes::UniAst;
use crate::reference::ReferenceContext;
use async_trait::async_trait;

/// Format implementation for HTML
#[derive(Debug, Clone, Default)]
pub struct HtmlFormat {
    ctx: ReferenceContext,
}

impl HtmlFormat {
    pub fn new(ctx: ReferenceContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Format for HtmlFormat {
    fn name(&self) -> &str {
        "html"
    }

    fn description(&self) -> &str {
        "HTML fragment"
    }

    fn file_extensions(&self) -> &[&str] {
        &["html", "htm"]
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    async fn serialize(&self, ast: &UniAst) -> Result<String> {
        blocks_to_html(&ast.blocks, &self.ctx)
    }
}
