//! The Ember parser.

use ember_common::Span;
use ember_diagnostic::{Diagnostic, DiagnosticKind, ErrorCode, Label};
use ember_lexer::{Token, TokenKind};
use ember_syntax::*;
use std::sync::Arc;

use crate::recovery::{DelimiterKind, DelimiterStack, is_clause_end, is_form_end};

/// The Ember parser.
///
/// Parsing functions return `None` after reporting a diagnostic; the caller
/// at form level then skips to the next `.` and carries on.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    diagnostics: Vec<Diagnostic>,
    /// Open delimiters, for "unclosed delimiter" reports
    delimiters: DelimiterStack,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            diagnostics: Vec::new(),
            delimiters: DelimiterStack::new(),
        }
    }

    pub fn diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Parse a complete source file.
    pub fn parse_file(&mut self) -> SourceFile {
        let start = self.current_span();
        let mut forms = Vec::new();

        while !self.at_end() {
            match self.parse_form() {
                Some(form) => forms.push(form),
                None => self.synchronize(),
            }
        }

        let end = self.current_span();
        SourceFile {
            forms,
            span: start.merge(end),
        }
    }

    /// Parse a single expression sequence, optionally terminated by `.`,
    /// that must span the whole input.
    pub fn parse_expr_input(&mut self) -> Option<Expr> {
        let expr = self.parse_body()?;
        self.eat(TokenKind::Dot);
        if !self.at_end() {
            let found = self.current_kind().clone();
            self.error(&format!("unexpected {} after expression", found));
            return None;
        }
        Some(expr)
    }

    /// Decide whether the token stream starts with a form rather than an
    /// expression: an attribute `-name(`, or a head `name(...) ->`.
    pub fn looks_like_form(&self) -> bool {
        match (self.peek(0), self.peek(1)) {
            (TokenKind::Minus, TokenKind::Atom(_)) => {
                matches!(self.peek(2), TokenKind::LParen)
            }
            (TokenKind::Atom(_), TokenKind::LParen) => {
                let closed_at = self.tokens[self.pos + 1..]
                    .iter()
                    .scan(DelimiterStack::new(), |stack, token| {
                        stack.update(&token.kind, token.span);
                        Some(stack.is_empty())
                    })
                    .position(|closed| closed);
                match closed_at {
                    Some(offset) => matches!(self.peek(offset + 2), TokenKind::Arrow),
                    None => false,
                }
            }
            _ => false,
        }
    }

    // ========== Forms ==========

    fn parse_form(&mut self) -> Option<Form> {
        let start = self.current_span();

        let kind = match self.current_kind().clone() {
            TokenKind::Minus => self.parse_attribute()?,
            TokenKind::Atom(_) => self.parse_function()?,
            found => {
                self.error_with_code(
                    &format!("expected a function or an attribute, found {}", found),
                    ErrorCode::ExpectedForm,
                );
                return None;
            }
        };

        if !self.eat(TokenKind::Dot) {
            let found = self.current_kind().clone();
            self.error_with_code(
                &format!("expected `.` to end the form, found {}", found),
                ErrorCode::MissingTerminator,
            );
            return None;
        }

        Some(Form {
            kind,
            span: start.merge(self.previous_span()),
        })
    }

    /// `-module(name)` or `-export([f/1, ...])`, without the final `.`.
    fn parse_attribute(&mut self) -> Option<FormKind> {
        self.advance(); // -
        let name_span = self.current_span();
        let name = self.parse_atom_name()?;
        self.open(DelimiterKind::Paren);

        let kind = match name.as_str() {
            "module" => FormKind::Module(self.parse_atom_name()?),
            "export" => {
                self.open(DelimiterKind::Bracket);
                let names = self.parse_comma_list(TokenKind::RBracket, Parser::parse_function_name);
                self.close()?;
                FormKind::Export(names)
            }
            other => {
                self.diagnostics.push(
                    Diagnostic::error(
                        DiagnosticKind::Parser,
                        name_span,
                        format!("unknown attribute `-{}`", other),
                    )
                    .with_code(ErrorCode::UnknownAttribute)
                    .with_label(Label::new(name_span, "only module and export are supported")),
                );
                return None;
            }
        };

        self.close()?;
        Some(kind)
    }

    /// `name/arity` inside an export list.
    fn parse_function_name(&mut self) -> Option<FunctionName> {
        let name = self.parse_atom_name()?;
        self.expect(TokenKind::Slash)?;
        let arity = self.parse_arity()?;
        Some(FunctionName::new(name, arity))
    }

    fn parse_arity(&mut self) -> Option<usize> {
        match self.current_kind().clone() {
            TokenKind::Int(n) if n >= 0 => {
                self.advance();
                Some(n as usize)
            }
            found => {
                self.error(&format!("expected an arity, found {}", found));
                None
            }
        }
    }

    /// One or more clauses `name(Params) -> Body` separated by `;`.
    fn parse_function(&mut self) -> Option<FormKind> {
        let mut clauses = vec![self.parse_function_clause()?];
        while self.eat(TokenKind::Semicolon) {
            clauses.push(self.parse_function_clause()?);
        }

        if clauses.len() == 1 {
            clauses.pop().map(FormKind::Function)
        } else {
            Some(FormKind::MultiFunction(clauses))
        }
    }

    fn parse_function_clause(&mut self) -> Option<FunctionDef> {
        let start = self.current_span();
        let name = self.parse_atom_name()?;
        let params = self.parse_params()?;
        self.expect(TokenKind::Arrow)?;
        let body = self.parse_body()?;

        Some(FunctionDef {
            name,
            params,
            body: Arc::new(body),
            span: start.merge(self.previous_span()),
        })
    }

    fn parse_params(&mut self) -> Option<Vec<Expr>> {
        self.open(DelimiterKind::Paren);
        let params = self.parse_comma_list(TokenKind::RParen, Parser::parse_expr);
        self.close()?;
        Some(params)
    }

    // ========== Expressions ==========

    /// A comma sequence. A single expression is returned as is.
    fn parse_body(&mut self) -> Option<Expr> {
        let first = self.parse_expr()?;
        if !self.check(TokenKind::Comma) {
            return Some(first);
        }

        let start = first.span;
        let mut exprs = vec![first];
        while self.eat(TokenKind::Comma) {
            exprs.push(self.parse_expr()?);
        }
        Some(Expr::new(
            ExprKind::Block(exprs),
            start.merge(self.previous_span()),
        ))
    }

    pub fn parse_expr(&mut self) -> Option<Expr> {
        self.parse_match_expr()
    }

    /// `P = E` and `A ! B`, both right associative.
    fn parse_match_expr(&mut self) -> Option<Expr> {
        let left = self.parse_comparison_expr()?;

        if self.eat(TokenKind::Eq) {
            let right = self.parse_match_expr()?;
            let span = left.span.merge(right.span);
            return Some(Expr::new(
                ExprKind::Match {
                    pattern: Box::new(left),
                    value: Box::new(right),
                },
                span,
            ));
        }

        if self.eat(TokenKind::Bang) {
            let right = self.parse_match_expr()?;
            let span = left.span.merge(right.span);
            return Some(Expr::new(
                ExprKind::Send {
                    target: Box::new(left),
                    message: Box::new(right),
                },
                span,
            ));
        }

        Some(left)
    }

    fn parse_comparison_expr(&mut self) -> Option<Expr> {
        let mut left = self.parse_additive_expr()?;

        loop {
            let op = match self.current_kind() {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::SlashEq => BinOp::Ne,
                TokenKind::EqColonEq => BinOp::ExactEq,
                TokenKind::EqSlashEq => BinOp::ExactNe,
                TokenKind::Lt => BinOp::Lt,
                TokenKind::LtEq => BinOp::Le,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::GtEq => BinOp::Ge,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive_expr()?;
            left = binary(op, left, right);
        }

        Some(left)
    }

    fn parse_additive_expr(&mut self) -> Option<Expr> {
        let mut left = self.parse_multiplicative_expr()?;

        loop {
            let op = match self.current_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative_expr()?;
            left = binary(op, left, right);
        }

        Some(left)
    }

    fn parse_multiplicative_expr(&mut self) -> Option<Expr> {
        let mut left = self.parse_unary_expr()?;

        loop {
            let op = match self.current_kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Div => BinOp::IntDiv,
                TokenKind::Rem => BinOp::Rem,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary_expr()?;
            left = binary(op, left, right);
        }

        Some(left)
    }

    fn parse_unary_expr(&mut self) -> Option<Expr> {
        let start = self.current_span();

        let op = match self.current_kind() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Not => UnaryOp::Not,
            _ => return self.parse_call_expr(),
        };
        self.advance();

        let operand = self.parse_unary_expr()?;
        let span = start.merge(operand.span);

        // Fold negative literals so `-1` is a plain constant in patterns.
        let kind = match (op, operand.kind) {
            (UnaryOp::Neg, ExprKind::Int(n)) => ExprKind::Int(n.wrapping_neg()),
            (UnaryOp::Neg, ExprKind::Float(x)) => ExprKind::Float(-x),
            (op, kind) => ExprKind::Unary {
                op,
                operand: Box::new(Expr::new(kind, operand.span)),
            },
        };
        Some(Expr::new(kind, span))
    }

    /// `f(Args)` and `m:f(Args)`.
    fn parse_call_expr(&mut self) -> Option<Expr> {
        let mut expr = self.parse_primary_expr()?;

        loop {
            if self.check(TokenKind::LParen) {
                let args = self.parse_params()?;
                let span = expr.span.merge(self.previous_span());
                expr = Expr::new(
                    ExprKind::Call {
                        func: Box::new(expr),
                        args,
                    },
                    span,
                );
            } else if self.eat(TokenKind::Colon) {
                let func = self.parse_primary_expr()?;
                let args = self.parse_params()?;
                let span = expr.span.merge(self.previous_span());
                expr = Expr::new(
                    ExprKind::Remote {
                        module: Box::new(expr),
                        func: Box::new(func),
                        args,
                    },
                    span,
                );
            } else {
                break;
            }
        }

        Some(expr)
    }

    fn parse_primary_expr(&mut self) -> Option<Expr> {
        let start = self.current_span();

        let kind = match self.current_kind().clone() {
            TokenKind::Int(n) => ExprKind::Int(n),
            TokenKind::Float(x) => ExprKind::Float(x),
            TokenKind::String(s) => ExprKind::String(s),
            TokenKind::Atom(name) => ExprKind::Atom(name),
            TokenKind::Var(name) => ExprKind::Var(name),
            TokenKind::True => ExprKind::Bool(true),
            TokenKind::False => ExprKind::Bool(false),

            TokenKind::LParen => {
                self.open(DelimiterKind::Paren);
                let inner = self.parse_expr()?;
                self.close()?;
                return Some(inner);
            }
            TokenKind::LBrace => return self.parse_tuple(),
            TokenKind::LBracket => return self.parse_list(),
            TokenKind::Begin => {
                self.open(DelimiterKind::Block);
                let body = self.parse_body()?;
                self.close()?;
                // Keep the `begin` span so errors point at the whole block.
                return Some(Expr::new(body.kind, start.merge(self.previous_span())));
            }
            TokenKind::Fun => return self.parse_fun(),
            TokenKind::Receive => return self.parse_receive(),
            TokenKind::Case => return self.parse_case(),

            found => {
                self.error_with_code(
                    &format!("expected expression, found {}", found),
                    ErrorCode::ExpectedExpression,
                );
                return None;
            }
        };

        self.advance();
        Some(Expr::new(kind, start))
    }

    /// `{A, B, ...}`
    fn parse_tuple(&mut self) -> Option<Expr> {
        let start = self.current_span();
        self.open(DelimiterKind::Brace);
        let items = self.parse_comma_list(TokenKind::RBrace, Parser::parse_expr);
        self.close()?;
        Some(Expr::new(
            ExprKind::Tuple(items),
            start.merge(self.previous_span()),
        ))
    }

    /// `[A, B | Tail]`
    fn parse_list(&mut self) -> Option<Expr> {
        let start = self.current_span();
        self.open(DelimiterKind::Bracket);

        let mut items = Vec::new();
        let mut tail = None;
        if !self.check(TokenKind::RBracket) {
            items.push(self.parse_expr()?);
            while self.eat(TokenKind::Comma) {
                items.push(self.parse_expr()?);
            }
            if self.eat(TokenKind::Pipe) {
                tail = Some(Box::new(self.parse_expr()?));
            }
        }

        self.close()?;
        Some(Expr::new(
            ExprKind::List { items, tail },
            start.merge(self.previous_span()),
        ))
    }

    /// `fun name/arity`, `fun m:name/arity`, or `fun (Params) -> Body; ... end`.
    fn parse_fun(&mut self) -> Option<Expr> {
        let start = self.current_span();
        self.advance(); // fun

        if let TokenKind::Atom(first) = self.current_kind().clone() {
            self.advance();
            let (module, name) = if self.eat(TokenKind::Colon) {
                (Some(first), self.parse_atom_name()?)
            } else {
                (None, first)
            };
            self.expect(TokenKind::Slash)?;
            let arity = self.parse_arity()?;
            return Some(Expr::new(
                ExprKind::FunRef {
                    module,
                    name,
                    arity,
                },
                start.merge(self.previous_span()),
            ));
        }

        self.delimiters.push(DelimiterKind::Block, start);
        let mut clauses = Vec::new();
        loop {
            let clause_start = self.current_span();
            let params = self.parse_params()?;
            self.expect(TokenKind::Arrow)?;
            let body = self.parse_body()?;
            clauses.push(FunClause {
                params,
                body: Arc::new(body),
                span: clause_start.merge(self.previous_span()),
            });
            if !self.eat(TokenKind::Semicolon) {
                break;
            }
        }
        self.close()?;

        Some(Expr::new(
            ExprKind::Fun(clauses),
            start.merge(self.previous_span()),
        ))
    }

    /// `receive P -> B; ... end`
    fn parse_receive(&mut self) -> Option<Expr> {
        let start = self.current_span();
        self.open(DelimiterKind::Block);
        let clauses = self.parse_clauses()?;
        self.close()?;
        Some(Expr::new(
            ExprKind::Receive(clauses),
            start.merge(self.previous_span()),
        ))
    }

    /// `case E of P -> B; ... end`
    fn parse_case(&mut self) -> Option<Expr> {
        let start = self.current_span();
        self.open(DelimiterKind::Block);
        let subject = self.parse_expr()?;
        self.expect(TokenKind::Of)?;
        let clauses = self.parse_clauses()?;
        self.close()?;
        Some(Expr::new(
            ExprKind::Case {
                subject: Box::new(subject),
                clauses,
            },
            start.merge(self.previous_span()),
        ))
    }

    fn parse_clauses(&mut self) -> Option<Vec<Clause>> {
        let mut clauses = Vec::new();
        loop {
            let start = self.current_span();
            let pattern = self.parse_expr()?;
            self.expect(TokenKind::Arrow)?;
            let body = self.parse_body()?;
            if !is_clause_end(self.current_kind()) {
                let found = self.current_kind().clone();
                self.error(&format!("expected `;` or `end`, found {}", found));
                return None;
            }
            clauses.push(Clause {
                pattern,
                body,
                span: start.merge(self.previous_span()),
            });
            if !self.eat(TokenKind::Semicolon) {
                break;
            }
        }
        Some(clauses)
    }

    fn parse_atom_name(&mut self) -> Option<String> {
        match self.current_kind().clone() {
            TokenKind::Atom(name) => {
                self.advance();
                Some(name)
            }
            found => {
                self.error(&format!("expected atom, found {}", found));
                None
            }
        }
    }

    // ========== Token Helpers ==========

    fn current(&self) -> &Token {
        self.tokens
            .get(self.pos)
            .unwrap_or(&self.tokens[self.tokens.len() - 1])
    }

    fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn peek(&self, offset: usize) -> &TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    fn current_span(&self) -> Span {
        self.current().span
    }

    fn previous_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens[self.pos - 1].span
        } else {
            Span::DUMMY
        }
    }

    fn at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    fn check(&self, kind: TokenKind) -> bool {
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(&kind)
    }

    fn advance(&mut self) {
        if !self.at_end() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Option<()> {
        if self.eat(kind.clone()) {
            return Some(());
        }
        let found = self.current_kind().clone();
        self.error(&format!("expected {}, found {}", kind, found));
        None
    }

    /// Consume an opening delimiter and remember where it was.
    fn open(&mut self, kind: DelimiterKind) {
        let span = self.current_span();
        self.advance();
        self.delimiters.push(kind, span);
    }

    /// Consume the closing delimiter for the innermost `open`, or report
    /// where it was opened.
    fn close(&mut self) -> Option<()> {
        let Some((kind, opened_at)) = self.delimiters.innermost() else {
            return Some(());
        };
        let closing = kind.closing_token();
        if self.eat(closing.clone()) {
            self.delimiters.pop();
            return Some(());
        }

        let span = self.current_span();
        let found = self.current_kind().clone();
        self.diagnostics.push(
            Diagnostic::error(
                DiagnosticKind::Parser,
                span,
                format!("expected {}, found {}", closing, found),
            )
            .with_code(ErrorCode::UnclosedDelimiter)
            .with_label(Label::new(opened_at, "opened here"))
            .with_label(Label::new(span, "expected closing delimiter")),
        );
        None
    }

    fn error(&mut self, message: &str) {
        self.error_with_code(message, ErrorCode::UnexpectedToken);
    }

    fn error_with_code(&mut self, message: &str, code: ErrorCode) {
        let span = self.current_span();
        self.diagnostics.push(
            Diagnostic::error(DiagnosticKind::Parser, span, message)
                .with_code(code)
                .with_label(Label::new(span, "here")),
        );
    }

    // ========== Error Recovery ==========

    /// Skip past the next `.` so the following form parses cleanly.
    fn synchronize(&mut self) {
        self.delimiters = DelimiterStack::new();
        while !self.at_end() {
            let ended = is_form_end(self.current_kind());
            self.advance();
            if ended {
                return;
            }
        }
    }

    /// Parse a comma-separated list with error recovery.
    fn parse_comma_list<T, F>(&mut self, closing: TokenKind, mut parse_item: F) -> Vec<T>
    where
        F: FnMut(&mut Self) -> Option<T>,
    {
        let mut items = Vec::new();

        while !self.check(closing.clone()) && !self.at_end() {
            if let Some(item) = parse_item(self) {
                items.push(item);
            } else {
                // Recovery: skip to comma or closing delimiter
                while !self.check(TokenKind::Comma)
                    && !self.check(closing.clone())
                    && !is_form_end(self.current_kind())
                    && !self.at_end()
                {
                    self.advance();
                }
            }

            if !self.eat(TokenKind::Comma) {
                break;
            }
        }

        items
    }
}

fn binary(op: BinOp, left: Expr, right: Expr) -> Expr {
    let span = left.span.merge(right.span);
    Expr::new(
        ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser(source: &str) -> Parser {
        let (tokens, diags) = ember_lexer::Lexer::new(source).tokenize();
        assert!(diags.is_empty(), "{:?}", diags);
        Parser::new(tokens)
    }

    #[test]
    fn test_looks_like_form() {
        assert!(parser("f(X) -> X.").looks_like_form());
        assert!(parser("f({a, [1]}) -> ok.").looks_like_form());
        assert!(parser("-module(m).").looks_like_form());
        assert!(!parser("f(1).").looks_like_form());
        assert!(!parser("X = f(1), X.").looks_like_form());
        assert!(!parser("- 1").looks_like_form());
    }

    #[test]
    fn test_negative_literal_is_folded() {
        let mut p = parser("-3");
        let expr = p.parse_expr_input().expect("expression");
        assert_eq!(expr.kind, ExprKind::Int(-3));
    }

    #[test]
    fn test_recovers_at_next_form() {
        let mut p = parser("f() -> ).\ng() -> ok.");
        let file = p.parse_file();
        assert_eq!(file.forms.len(), 1);
        assert_eq!(p.diagnostics().len(), 1);
    }
}
