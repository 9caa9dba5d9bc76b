//! Markdown format tests
//!
//! Tests for Markdown → UniAst parsing, UniAst → Markdown serialization with each
//! internal link strategy, and round trips between the two.

mod export;
mod import;
mod round_trip;
