//! The `ember eval` command.

use super::{Options, machine, report};
use crate::output;

pub fn run(expr: &str, options: &Options) -> Result<(), String> {
    let machine = machine(options)?;
    let value = machine.eval_str(expr).map_err(report)?;
    if !options.quiet {
        output::value(&value);
    }
    Ok(())
}
