//! Parser for Ember.
//!
//! This crate provides a recursive descent parser that converts
//! tokens into an abstract syntax tree.
//!
//! ## Error Recovery
//!
//! The parser implements error recovery to continue parsing after
//! encountering errors, allowing multiple errors to be reported
//! in a single parse pass. A broken form is skipped up to its
//! terminating `.`.

mod parser;
mod recovery;

pub use parser::Parser;
pub use recovery::{DelimiterKind, DelimiterStack};

use ember_diagnostic::Diagnostic;
use ember_lexer::Lexer;
use ember_syntax::{Expr, SourceFile};

/// Parse source code into an AST.
pub fn parse(source: &str) -> (SourceFile, Vec<Diagnostic>) {
    let lexer = Lexer::new(source);
    let (tokens, mut diagnostics) = lexer.tokenize();

    let mut parser = Parser::new(tokens);
    let file = parser.parse_file();

    diagnostics.extend(parser.diagnostics());
    (file, diagnostics)
}

/// Parse a single expression (or a comma sequence), with an optional
/// trailing `.`.
pub fn parse_expr(source: &str) -> (Option<Expr>, Vec<Diagnostic>) {
    let lexer = Lexer::new(source);
    let (tokens, mut diagnostics) = lexer.tokenize();

    let mut parser = Parser::new(tokens);
    let expr = parser.parse_expr_input();

    diagnostics.extend(parser.diagnostics());
    (expr, diagnostics)
}

/// What a line of interactive input turned out to be.
#[derive(Debug)]
pub enum Input {
    /// One or more forms to define.
    Forms(SourceFile),
    /// An expression to evaluate.
    Expr(Expr),
}

/// Parse REPL input, deciding between forms and an expression by looking
/// at how the input starts.
pub fn parse_input(source: &str) -> (Option<Input>, Vec<Diagnostic>) {
    let lexer = Lexer::new(source);
    let (tokens, mut diagnostics) = lexer.tokenize();

    let mut parser = Parser::new(tokens);
    let input = if parser.looks_like_form() {
        Some(Input::Forms(parser.parse_file()))
    } else {
        parser.parse_expr_input().map(Input::Expr)
    };

    diagnostics.extend(parser.diagnostics());
    (input, diagnostics)
}
