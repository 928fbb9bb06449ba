//! AST and syntax definitions for Ember.
//!
//! This crate defines the abstract syntax tree produced by the parser and
//! walked by the evaluator. The same expression tree is used both as an
//! executable body and as a pattern skeleton.

mod expr;
mod form;

pub use expr::*;
pub use form::*;
