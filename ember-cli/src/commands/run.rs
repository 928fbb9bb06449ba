//! The `ember run` command.

use std::path::Path;

use super::{Options, machine, report};
use crate::output;

pub fn run(file: &Path, options: &Options) -> Result<(), String> {
    let machine = machine(options)?;
    match machine.run_file(file).map_err(report)? {
        Some(value) => {
            if !options.quiet {
                output::value(&value);
            }
        }
        None => {
            if options.verbose {
                output::info(&format!("{} defines no main/0", file.display()));
            }
        }
    }
    Ok(())
}
