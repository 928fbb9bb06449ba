//! Embeddable host for the Ember interpreter.
//!
//! A [`Machine`] wires the evaluator, the built-ins, the standard modules
//! and the module loader together behind a small API.

mod config;
mod error;
pub mod loader;
mod machine;

pub use config::{MachineConfig, PATH_VAR, STACK_SIZE_VAR};
pub use error::MachineError;
pub use machine::Machine;
