//! Error codes for Ember diagnostics.

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Lexer errors (E0001 - E0099)
    UnexpectedCharacter,
    UnterminatedString,
    UnterminatedAtom,
    InvalidEscape,
    InvalidNumber,

    // Parser errors (E0100 - E0199)
    UnexpectedToken,
    ExpectedExpression,
    ExpectedForm,
    UnclosedDelimiter,
    MissingTerminator,
    UnknownAttribute,

    // Load errors (E0200 - E0299)
    ModuleNotFound,
    ModuleNameMismatch,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            // Lexer
            ErrorCode::UnexpectedCharacter => "E0001",
            ErrorCode::UnterminatedString => "E0002",
            ErrorCode::UnterminatedAtom => "E0003",
            ErrorCode::InvalidEscape => "E0004",
            ErrorCode::InvalidNumber => "E0005",

            // Parser
            ErrorCode::UnexpectedToken => "E0100",
            ErrorCode::ExpectedExpression => "E0101",
            ErrorCode::ExpectedForm => "E0102",
            ErrorCode::UnclosedDelimiter => "E0103",
            ErrorCode::MissingTerminator => "E0104",
            ErrorCode::UnknownAttribute => "E0105",

            // Load
            ErrorCode::ModuleNotFound => "E0200",
            ErrorCode::ModuleNameMismatch => "E0201",
        }
    }

    /// Get a human-readable description of the error.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::UnexpectedCharacter => "unexpected character in input",
            ErrorCode::UnterminatedString => "string literal is not terminated",
            ErrorCode::UnterminatedAtom => "quoted atom is not terminated",
            ErrorCode::InvalidEscape => "invalid escape sequence in string",
            ErrorCode::InvalidNumber => "invalid number literal",

            ErrorCode::UnexpectedToken => "unexpected token",
            ErrorCode::ExpectedExpression => "expected an expression",
            ErrorCode::ExpectedForm => "expected a function clause or attribute",
            ErrorCode::UnclosedDelimiter => "unclosed delimiter",
            ErrorCode::MissingTerminator => "form is not terminated",
            ErrorCode::UnknownAttribute => "unknown attribute",

            ErrorCode::ModuleNotFound => "module source file not found",
            ErrorCode::ModuleNameMismatch => "module attribute does not match file name",
        }
    }

    /// Get a suggested fix for the error, if available.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            ErrorCode::UnterminatedString => Some("add a closing quote `\"` to terminate the string"),
            ErrorCode::UnterminatedAtom => Some("add a closing `'` to terminate the atom"),
            ErrorCode::MissingTerminator => Some("end every form with `.`"),
            ErrorCode::UnclosedDelimiter => Some("add the matching closing delimiter"),
            ErrorCode::UnknownAttribute => Some("only `-module(Name).` and `-export([...]).` are supported"),
            ErrorCode::ModuleNameMismatch => Some("rename the file or the `-module` attribute so they agree"),
            _ => None,
        }
    }
}
