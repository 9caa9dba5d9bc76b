//! The UniAst document tree and its traversal.
//!
//! `nodes` holds the format-agnostic representation every converter reads and
//! writes; `walk` is the single place that knows how nodes nest.

pub mod nodes;
pub mod walk;
