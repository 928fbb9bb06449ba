use ember_diagnostic::{Diagnostic, ErrorCode};
use ember_eval::EvalError;
use thiserror::Error;

/// Errors that can occur while hosting an interpreter.
#[derive(Debug, Error)]
pub enum MachineError {
    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The source did not parse. Carries the text so callers can render
    /// the diagnostics against it.
    #[error("{filename}: {} syntax error(s)", .diagnostics.len())]
    Parse {
        filename: String,
        text: String,
        diagnostics: Vec<Diagnostic>,
    },

    #[error("module '{0}' not found on the search path")]
    ModuleNotFound(String),

    #[error("{filename}: missing -module attribute")]
    MissingModule { filename: String },

    #[error("{filename} declares module '{declared}', expected '{expected}'")]
    ModuleName {
        filename: String,
        declared: String,
        expected: String,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl MachineError {
    /// Diagnostic code of a loader failure.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            MachineError::ModuleNotFound(_) => Some(ErrorCode::ModuleNotFound),
            MachineError::ModuleName { .. } => Some(ErrorCode::ModuleNameMismatch),
            _ => None,
        }
    }
}

impl From<MachineError> for EvalError {
    /// Failures surface inside the interpreter as `Load` errors; evaluation
    /// errors pass through unchanged.
    fn from(error: MachineError) -> Self {
        match error {
            MachineError::Eval(error) => error,
            other => EvalError::Load(other.to_string()),
        }
    }
}
