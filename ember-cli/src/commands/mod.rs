//! CLI command implementations.

pub mod check;
pub mod eval;
pub mod repl;
pub mod run;

use std::path::PathBuf;

use ember_diagnostic::emit;
use ember_runtime::{Machine, MachineConfig, MachineError};

/// Flags shared by every command.
pub struct Options {
    pub verbose: bool,
    pub quiet: bool,
    pub config: Option<PathBuf>,
}

/// Build a machine from the config file (if any) and the environment.
pub fn machine(options: &Options) -> Result<Machine, String> {
    let config = match &options.config {
        Some(path) => MachineConfig::load(path)
            .map_err(|e| format!("cannot load config '{}': {}", path.display(), e))?,
        None => MachineConfig::default(),
    };
    let config = config.with_env().map_err(|e| e.to_string())?;
    tracing::debug!(?config, "configuration");
    Ok(Machine::new(config))
}

/// Render a machine error, with full diagnostics for syntax errors, and
/// turn it into the command's error message.
pub fn report(error: MachineError) -> String {
    if let MachineError::Parse {
        filename,
        text,
        diagnostics,
    } = &error
    {
        for diag in diagnostics {
            emit(text, filename, diag);
        }
    }
    match error.code() {
        Some(code) => match code.suggestion() {
            Some(help) => format!("{} [{}]\n  help: {}", error, code.as_str(), help),
            None => format!("{} [{}]", error, code.as_str()),
        },
        None => error.to_string(),
    }
}
