//! The `ember check` command.
//! `ember check` 命令。

use std::fs;
use std::path::Path;

use ember_diagnostic::emit;
use ember_parser::parse;

use super::Options;
use crate::output;

/// Parse a file and report every diagnostic without evaluating it.
/// 解析文件并报告所有诊断信息，但不求值。
pub fn run(file: &Path, options: &Options) -> Result<(), String> {
    let filename = file.display().to_string();
    let source = fs::read_to_string(file)
        .map_err(|e| format!("cannot read file '{}': {}", filename, e))?;

    let (ast, diagnostics) = parse(&source);

    for diag in &diagnostics {
        emit(&source, &filename, diag);
    }

    let errors = diagnostics.iter().filter(|d| d.is_error()).count();
    if errors > 0 {
        return Err(format!("{} parse error(s) found", errors));
    }

    if options.verbose {
        output::info(&format!("Parsed {} forms", ast.forms.len()));
    }
    if !options.quiet {
        output::success("OK - No errors found");
    }
    Ok(())
}
