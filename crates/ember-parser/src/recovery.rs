//! Error recovery strategies for the parser.
//!
//! Forms always end with `.`, and `.` never appears inside an expression,
//! so recovery skips to the next form terminator. Delimiters are tracked
//! so an unbalanced bracket can be reported where it was opened.

use ember_common::Span;
use ember_lexer::TokenKind;

/// Tokens that end a form.
pub const FORM_ENDS: &[TokenKind] = &[TokenKind::Dot];

/// Tokens that end a clause body inside `fun`, `case` and `receive`.
pub const CLAUSE_ENDS: &[TokenKind] = &[TokenKind::Semicolon, TokenKind::End, TokenKind::Dot];

/// Check if a token kind is in a set.
pub fn is_in_set(kind: &TokenKind, set: &[TokenKind]) -> bool {
    set.iter()
        .any(|k| std::mem::discriminant(k) == std::mem::discriminant(kind))
}

/// Check if a token ends a form.
pub fn is_form_end(kind: &TokenKind) -> bool {
    is_in_set(kind, FORM_ENDS)
}

/// Check if a token ends a clause body.
pub fn is_clause_end(kind: &TokenKind) -> bool {
    is_in_set(kind, CLAUSE_ENDS)
}

/// Delimiter kinds for recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelimiterKind {
    Paren,   // )
    Bracket, // ]
    Brace,   // }
    /// `begin`, `fun`, `case` and `receive` blocks closed by `end`
    Block,
}

impl DelimiterKind {
    pub fn closing_token(&self) -> TokenKind {
        match self {
            DelimiterKind::Paren => TokenKind::RParen,
            DelimiterKind::Bracket => TokenKind::RBracket,
            DelimiterKind::Brace => TokenKind::RBrace,
            DelimiterKind::Block => TokenKind::End,
        }
    }

    /// Classify an opening token. `fun name/arity` also opens a block by
    /// this rule, so callers that care must special-case it.
    pub fn from_opening(kind: &TokenKind) -> Option<DelimiterKind> {
        match kind {
            TokenKind::LParen => Some(DelimiterKind::Paren),
            TokenKind::LBracket => Some(DelimiterKind::Bracket),
            TokenKind::LBrace => Some(DelimiterKind::Brace),
            TokenKind::Begin | TokenKind::Case | TokenKind::Receive => Some(DelimiterKind::Block),
            _ => None,
        }
    }
}

/// Tracks nested delimiters for balanced recovery.
#[derive(Debug, Default)]
pub struct DelimiterStack {
    stack: Vec<(DelimiterKind, Span)>,
}

impl DelimiterStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: DelimiterKind, span: Span) {
        self.stack.push((kind, span));
    }

    pub fn pop(&mut self) -> Option<(DelimiterKind, Span)> {
        self.stack.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// The innermost open delimiter, with the span that opened it.
    pub fn innermost(&self) -> Option<(DelimiterKind, Span)> {
        self.stack.last().copied()
    }

    /// Update the stack based on a token.
    pub fn update(&mut self, token: &TokenKind, span: Span) {
        if let Some(kind) = DelimiterKind::from_opening(token) {
            self.push(kind, span);
            return;
        }
        if let Some((open, _)) = self.innermost() {
            if open.closing_token() == *token {
                self.pop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_form_end() {
        assert!(is_form_end(&TokenKind::Dot));
        assert!(!is_form_end(&TokenKind::Semicolon));
        assert!(is_clause_end(&TokenKind::End));
    }

    #[test]
    fn test_delimiter_stack() {
        let mut stack = DelimiterStack::new();
        assert!(stack.is_empty());

        stack.update(&TokenKind::LParen, Span::from_usize(0, 1));
        assert_eq!(stack.depth(), 1);

        stack.update(&TokenKind::Case, Span::from_usize(1, 5));
        assert_eq!(stack.innermost().map(|(k, _)| k), Some(DelimiterKind::Block));

        // A mismatched closer leaves the stack alone.
        stack.update(&TokenKind::RParen, Span::from_usize(5, 6));
        assert_eq!(stack.depth(), 2);

        stack.update(&TokenKind::End, Span::from_usize(6, 9));
        stack.update(&TokenKind::RParen, Span::from_usize(9, 10));
        assert!(stack.is_empty());
    }
}
