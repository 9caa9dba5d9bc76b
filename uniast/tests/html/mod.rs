//! HTML format tests
//!
//! Markdown parsed with the path reference context and rendered as an HTML fragment.

mod export;
