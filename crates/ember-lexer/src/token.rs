//! Token definitions for Ember.

use ember_common::Span;
use std::fmt;

/// A token with its kind and span.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The kind of a token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Int(i64),
    Float(f64),
    String(String),

    /// Lowercase identifier or quoted `'atom'`
    Atom(String),
    /// Uppercase or `_`-prefixed identifier
    Var(String),

    // Keywords
    Fun,
    Receive,
    Case,
    Of,
    End,
    Begin,
    Div,
    Rem,
    Not,
    True,
    False,

    // Delimiters
    LParen,   // (
    RParen,   // )
    LBracket, // [
    RBracket, // ]
    LBrace,   // {
    RBrace,   // }

    // Operators
    Plus,       // +
    Minus,      // -
    Star,       // *
    Slash,      // /
    Eq,         // =
    EqEq,       // ==
    SlashEq,    // /=
    EqColonEq,  // =:=
    EqSlashEq,  // =/=
    Lt,         // <
    LtEq,       // =<
    Gt,         // >
    GtEq,       // >=
    Bang,       // !
    Pipe,       // |
    Arrow,      // ->

    // Punctuation
    Comma,     // ,
    Colon,     // :
    Semicolon, // ;
    Dot,       // .

    // Special
    Eof,
    Error,
}

impl TokenKind {
    /// Returns true if this token is a keyword.
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Fun
                | TokenKind::Receive
                | TokenKind::Case
                | TokenKind::Of
                | TokenKind::End
                | TokenKind::Begin
                | TokenKind::Div
                | TokenKind::Rem
                | TokenKind::Not
                | TokenKind::True
                | TokenKind::False
        )
    }

    /// Returns the keyword for a lowercase identifier, if any.
    pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
        match s {
            "fun" => Some(TokenKind::Fun),
            "receive" => Some(TokenKind::Receive),
            "case" => Some(TokenKind::Case),
            "of" => Some(TokenKind::Of),
            "end" => Some(TokenKind::End),
            "begin" => Some(TokenKind::Begin),
            "div" => Some(TokenKind::Div),
            "rem" => Some(TokenKind::Rem),
            "not" => Some(TokenKind::Not),
            "true" => Some(TokenKind::True),
            "false" => Some(TokenKind::False),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::Int(n) => return write!(f, "integer `{n}`"),
            TokenKind::Float(x) => return write!(f, "float `{x}`"),
            TokenKind::String(_) => "string literal",
            TokenKind::Atom(name) => return write!(f, "atom `{name}`"),
            TokenKind::Var(name) => return write!(f, "variable `{name}`"),
            TokenKind::Fun => "`fun`",
            TokenKind::Receive => "`receive`",
            TokenKind::Case => "`case`",
            TokenKind::Of => "`of`",
            TokenKind::End => "`end`",
            TokenKind::Begin => "`begin`",
            TokenKind::Div => "`div`",
            TokenKind::Rem => "`rem`",
            TokenKind::Not => "`not`",
            TokenKind::True => "`true`",
            TokenKind::False => "`false`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::Plus => "`+`",
            TokenKind::Minus => "`-`",
            TokenKind::Star => "`*`",
            TokenKind::Slash => "`/`",
            TokenKind::Eq => "`=`",
            TokenKind::EqEq => "`==`",
            TokenKind::SlashEq => "`/=`",
            TokenKind::EqColonEq => "`=:=`",
            TokenKind::EqSlashEq => "`=/=`",
            TokenKind::Lt => "`<`",
            TokenKind::LtEq => "`=<`",
            TokenKind::Gt => "`>`",
            TokenKind::GtEq => "`>=`",
            TokenKind::Bang => "`!`",
            TokenKind::Pipe => "`|`",
            TokenKind::Arrow => "`->`",
            TokenKind::Comma => "`,`",
            TokenKind::Colon => "`:`",
            TokenKind::Semicolon => "`;`",
            TokenKind::Dot => "`.`",
            TokenKind::Eof => "end of input",
            TokenKind::Error => "invalid token",
        };
        f.write_str(text)
    }
}
