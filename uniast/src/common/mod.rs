//! Syntax shared by more than one format.

pub mod macro_syntax;
