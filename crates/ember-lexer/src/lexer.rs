//! The Ember lexer.
//! Ember 词法分析器。

use crate::token::{Token, TokenKind};
use ember_common::Span;
use ember_diagnostic::{Diagnostic, DiagnosticKind, ErrorCode, Label};

/// The Ember lexer.
/// Ember 词法分析器。
///
/// Converts source code into a sequence of tokens. Errors are collected as
/// diagnostics and surface as `TokenKind::Error` so the parser can keep going.
/// 将源代码转换为 token 序列。错误以诊断信息收集，并以 `TokenKind::Error` 表示。
pub struct Lexer<'src> {
    /// Character iterator with position info
    /// 带位置信息的字符迭代器
    chars: std::iter::Peekable<std::str::CharIndices<'src>>,
    /// Current position in source
    /// 当前在源码中的位置
    pos: usize,
    /// Collected diagnostics
    /// 收集的诊断信息
    diagnostics: Vec<Diagnostic>,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source code.
    /// 为给定的源代码创建新的词法分析器。
    pub fn new(source: &'src str) -> Self {
        Self {
            chars: source.char_indices().peekable(),
            pos: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Tokenize the entire source and return tokens and diagnostics.
    /// 对整个源代码进行词法分析，返回 token 列表和诊断信息。
    pub fn tokenize(mut self) -> (Vec<Token>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        (tokens, self.diagnostics)
    }

    /// Get the next token.
    /// 获取下一个 token。
    fn next_token(&mut self) -> Token {
        self.skip_trivia();

        let start = self.pos;

        let Some((_pos, ch)) = self.advance() else {
            return Token::new(TokenKind::Eof, Span::from_usize(start, start));
        };

        let kind = match ch {
            // Single character tokens - 单字符 token
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            '.' => TokenKind::Dot,
            '|' => TokenKind::Pipe,
            '!' => TokenKind::Bang,
            '+' => TokenKind::Plus,
            '*' => TokenKind::Star,

            // Minus or Arrow - 减号或箭头
            '-' => {
                if self.peek_char() == Some('>') {
                    self.advance();
                    TokenKind::Arrow
                } else {
                    TokenKind::Minus
                }
            }

            // Slash or `/=` - 斜杠或不等号
            '/' => {
                if self.peek_char() == Some('=') {
                    self.advance();
                    TokenKind::SlashEq
                } else {
                    TokenKind::Slash
                }
            }

            // `=`, `==`, `=:=`, `=/=`, `=<` - 等号族
            '=' => match self.peek_char() {
                Some('=') => {
                    self.advance();
                    TokenKind::EqEq
                }
                Some('<') => {
                    self.advance();
                    TokenKind::LtEq
                }
                Some(':') if self.peek_nth(1) == Some('=') => {
                    self.advance();
                    self.advance();
                    TokenKind::EqColonEq
                }
                Some('/') if self.peek_nth(1) == Some('=') => {
                    self.advance();
                    self.advance();
                    TokenKind::EqSlashEq
                }
                _ => TokenKind::Eq,
            },

            '<' => TokenKind::Lt,

            '>' => {
                if self.peek_char() == Some('=') {
                    self.advance();
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                }
            }

            // String literal - 字符串字面量
            '"' => self.string_literal(),

            // Quoted atom - 引号原子
            '\'' => self.quoted_atom(),

            // Character code `$a` - 字符编码
            '$' => self.char_code(start),

            // Numbers - 数字
            '0'..='9' => self.number(ch, start),

            // Atoms, keywords and variables - 原子、关键字和变量
            'a'..='z' => self.atom_or_keyword(ch),
            'A'..='Z' | '_' => self.variable(ch),

            _ => {
                self.error_unexpected_char(ch, start);
                TokenKind::Error
            }
        };

        Token::new(kind, Span::from_usize(start, self.pos))
    }

    /// Advance to the next character.
    /// 前进到下一个字符。
    fn advance(&mut self) -> Option<(usize, char)> {
        let result = self.chars.next();
        if let Some((pos, ch)) = result {
            self.pos = pos + ch.len_utf8();
        }
        result
    }

    /// Peek at the next character without consuming it.
    /// 查看下一个字符但不消耗它。
    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, ch)| *ch)
    }

    /// Peek at the nth character ahead.
    /// 查看前方第 n 个字符。
    fn peek_nth(&self, n: usize) -> Option<char> {
        self.chars.clone().nth(n).map(|(_, ch)| ch)
    }

    /// Skip whitespace and `%` line comments.
    /// 跳过空白字符和 `%` 行注释。
    fn skip_trivia(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() {
                self.advance();
            } else if ch == '%' {
                while let Some(ch) = self.peek_char() {
                    if ch == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    /// Parse a string literal (double-quoted).
    /// 解析字符串字面量（双引号包围）。
    fn string_literal(&mut self) -> TokenKind {
        match self.quoted('"') {
            Some(value) => TokenKind::String(value),
            None => {
                let span = Span::from_usize(self.pos, self.pos);
                self.diagnostics.push(
                    Diagnostic::error(DiagnosticKind::Lexer, span, "unterminated string")
                        .with_code(ErrorCode::UnterminatedString),
                );
                TokenKind::Error
            }
        }
    }

    /// Parse a quoted atom (`'hello world'`).
    /// 解析引号原子。
    fn quoted_atom(&mut self) -> TokenKind {
        match self.quoted('\'') {
            Some(value) => TokenKind::Atom(value),
            None => {
                let span = Span::from_usize(self.pos, self.pos);
                self.diagnostics.push(
                    Diagnostic::error(DiagnosticKind::Lexer, span, "unterminated quoted atom")
                        .with_code(ErrorCode::UnterminatedAtom),
                );
                TokenKind::Error
            }
        }
    }

    /// Read characters up to the closing `quote`, handling escapes.
    /// Returns `None` when input ends first.
    fn quoted(&mut self, quote: char) -> Option<String> {
        let mut value = String::new();

        loop {
            match self.advance() {
                Some((_, ch)) if ch == quote => return Some(value),
                Some((_, '\\')) => {
                    if let Some(escaped) = self.escape_char() {
                        value.push(escaped);
                    }
                }
                Some((_, ch)) => value.push(ch),
                None => return None,
            }
        }
    }

    /// Parse an escape character sequence.
    /// 解析转义字符序列。
    fn escape_char(&mut self) -> Option<char> {
        match self.advance() {
            Some((_, 'n')) => Some('\n'),
            Some((_, 'r')) => Some('\r'),
            Some((_, 't')) => Some('\t'),
            Some((_, 's')) => Some(' '),
            Some((_, '0')) => Some('\0'),
            Some((_, '\\')) => Some('\\'),
            Some((_, '"')) => Some('"'),
            Some((_, '\'')) => Some('\''),
            Some((pos, ch)) => {
                let span = Span::from_usize(pos, self.pos);
                self.diagnostics.push(
                    Diagnostic::error(
                        DiagnosticKind::Lexer,
                        span,
                        format!("invalid escape sequence: \\{}", ch),
                    )
                    .with_code(ErrorCode::InvalidEscape),
                );
                None
            }
            None => None,
        }
    }

    /// Parse a character code literal; `$a` is the integer 97.
    /// 解析字符编码字面量。
    fn char_code(&mut self, start: usize) -> TokenKind {
        let ch = match self.advance() {
            Some((_, '\\')) => self.escape_char(),
            Some((_, ch)) => Some(ch),
            None => None,
        };

        match ch {
            Some(c) => TokenKind::Int(c as i64),
            None => {
                let span = Span::from_usize(start, self.pos);
                self.diagnostics.push(
                    Diagnostic::error(DiagnosticKind::Lexer, span, "expected a character after `$`")
                        .with_code(ErrorCode::InvalidNumber),
                );
                TokenKind::Error
            }
        }
    }

    /// Parse a number literal (integer or float).
    /// 解析数字字面量（整数或浮点数）。
    ///
    /// A `.` only continues the number when a digit follows, so `X = 1.`
    /// ends the form instead of starting a fraction.
    fn number(&mut self, first: char, start: usize) -> TokenKind {
        let mut value = String::from(first);
        let mut is_float = false;

        self.digits(&mut value);

        // Decimal part - 小数部分
        if self.peek_char() == Some('.')
            && self.peek_nth(1).is_some_and(|ch| ch.is_ascii_digit())
        {
            self.advance();
            value.push('.');
            is_float = true;
            self.digits(&mut value);

            // Exponent - 指数部分
            if let Some('e' | 'E') = self.peek_char() {
                let signed = matches!(self.peek_nth(1), Some('+' | '-'));
                let digit_at = if signed { 2 } else { 1 };
                if self.peek_nth(digit_at).is_some_and(|ch| ch.is_ascii_digit()) {
                    self.advance();
                    value.push('e');
                    if signed {
                        if let Some((_, sign)) = self.advance() {
                            value.push(sign);
                        }
                    }
                    self.digits(&mut value);
                }
            }
        }

        let parsed = if is_float {
            value.parse::<f64>().ok().map(TokenKind::Float)
        } else {
            value.parse::<i64>().ok().map(TokenKind::Int)
        };

        parsed.unwrap_or_else(|| {
            let span = Span::from_usize(start, self.pos);
            self.diagnostics.push(
                Diagnostic::error(
                    DiagnosticKind::Lexer,
                    span,
                    format!("invalid number literal `{}`", value),
                )
                .with_code(ErrorCode::InvalidNumber),
            );
            TokenKind::Error
        })
    }

    fn digits(&mut self, value: &mut String) {
        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_digit() {
                value.push(ch);
                self.advance();
            } else if ch == '_' && self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn identifier_tail(&mut self, value: &mut String) {
        while let Some(ch) = self.peek_char() {
            if ch.is_alphanumeric() || ch == '_' || ch == '@' {
                value.push(ch);
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Parse an atom or keyword.
    /// 解析原子或关键字。
    fn atom_or_keyword(&mut self, first: char) -> TokenKind {
        let mut value = String::from(first);
        self.identifier_tail(&mut value);
        TokenKind::keyword_from_str(&value).unwrap_or(TokenKind::Atom(value))
    }

    /// Parse a variable name.
    /// 解析变量名。
    fn variable(&mut self, first: char) -> TokenKind {
        let mut value = String::from(first);
        self.identifier_tail(&mut value);
        TokenKind::Var(value)
    }

    /// Report an unexpected character error.
    /// 报告意外字符错误。
    fn error_unexpected_char(&mut self, ch: char, pos: usize) {
        let span = Span::from_usize(pos, self.pos);
        self.diagnostics.push(
            Diagnostic::error(
                DiagnosticKind::Lexer,
                span,
                format!("unexpected character: '{}'", ch),
            )
            .with_code(ErrorCode::UnexpectedCharacter)
            .with_label(Label::new(span, "unexpected character here")),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let (tokens, diagnostics) = Lexer::new(source).tokenize();
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_integer_followed_by_dot_is_not_float() {
        assert_eq!(
            kinds("X = 1."),
            vec![
                TokenKind::Var("X".into()),
                TokenKind::Eq,
                TokenKind::Int(1),
                TokenKind::Dot,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comparison_operators() {
        assert_eq!(
            kinds("=:= =/= =< >= /= =="),
            vec![
                TokenKind::EqColonEq,
                TokenKind::EqSlashEq,
                TokenKind::LtEq,
                TokenKind::GtEq,
                TokenKind::SlashEq,
                TokenKind::EqEq,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comment_is_skipped() {
        assert_eq!(
            kinds("ok % trailing\n"),
            vec![TokenKind::Atom("ok".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_unterminated_string_reports() {
        let (tokens, diagnostics) = Lexer::new("\"abc").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Error);
        assert_eq!(diagnostics[0].code, Some(ErrorCode::UnterminatedString));
    }
}
