//! Backend-agnostic document tree with Markdown, HTML and UI-tree converters
//!
//! ```text
//!     UniAst is the intermediate representation rich-text content travels through: stored
//!     Markdown or persisted JSON is read into a UniAst tree, rendered to HTML or to the
//!     editor's node tree for display, and written back to Markdown or JSON for storage.
//!     Macro invocations and internal cross-references survive every round trip.
//!
//!     This is a pure lib: it powers the `uniast` CLI but supposes no shell environment.
//!     The only I/O is the optional remote link strategy of the Markdown serializer.
//! ```
//!
//! Architecture
//!
//! ```text
//!     The file structure:
//!     .
//!     ├── error.rs                # ConversionError
//!     ├── format.rs               # Format trait definition
//!     ├── registry.rs             # FormatRegistry for discovery and selection
//!     ├── transforms.rs           # Macro load/save round trip for persisted JSON
//!     ├── ir
//!     │   ├── nodes.rs            # The tree: blocks, inline content, link targets, macros
//!     │   └── walk.rs             # The one depth-first walk every pass builds on
//!     ├── reference               # Reference context façade + default path service
//!     ├── common
//!     │   └── macro_syntax.rs     # {{macro}} text syntax
//!     └── formats
//!         ├── markdown            # parser + inline rules, serializer + link strategies
//!         ├── html                # HTML fragment renderer
//!         ├── ui_tree             # Editor node tree renderer
//!         └── json                # Persisted form
//! ```
//!
//! Data Flow
//!
//! ```text
//!     stored Markdown ──parse──┐
//!                              ├──▶ UniAst ──▶ HTML / UI tree (display)
//!     stored JSON ──load───────┘        └────▶ Markdown / JSON (storage, via save)
//! ```
//!
//! References
//!
//! ```text
//!     Converters never interpret a reference themselves. Everything goes through a
//!     [`ReferenceContext`](reference::ReferenceContext) built once per session from
//!     injected services, so swapping the backend changes no converter code.
//! ```
//!
//! Errors
//!
//! ```text
//!     Every public entry point returns `Result<_, ConversionError>`. Inline syntax that does
//!     not match falls back to plain text instead of failing, and malformed cached macro
//!     output degrades to a string. Content a target cannot represent (a macro in HTML
//!     output) fails the conversion rather than being dropped.
//! ```
//!
//! Library Choices
//!
//! ```text
//!     We never write a Markdown or HTML serializer by hand: comrak parses and writes
//!     Markdown, html5ever writes the HTML DOM. Our code adapts trees in both directions.
//! ```

pub mod common;
pub mod error;
pub mod format;
pub mod formats;
pub mod ir;
pub mod reference;
pub mod registry;
pub mod transforms;

pub use error::{ConversionError, Result};
pub use format::Format;
pub use ir::nodes::UniAst;
pub use reference::ReferenceContext;
pub use registry::FormatRegistry;
