//! Evaluator and process runtime for Ember.
//!
//! This crate walks the syntax tree directly. It holds the value model,
//! scoped contexts, the pattern matcher, callable values with their clause
//! dispatch, delayed tail calls and the process/mailbox layer.

pub mod builtin;
mod context;
mod error;
mod eval;
mod function;
mod matcher;
mod module;
mod node;
mod process;
mod thunk;
pub mod value;

pub use context::{Context, ModuleInfo};
pub use error::EvalError;
pub use eval::{ANONYMOUS, Evaluator, Mode};
pub use function::{Callable, Function, MultiFunction, NativeFunction};
pub use matcher::{MatchBody, match_value, try_match};
pub use module::Module;
pub use node::{DEFAULT_STACK_SIZE, Node, Output, SharedBuffer};
pub use process::{ProcessHandle, ProcessState};
pub use thunk::DelayedCall;
pub use value::{Cons, Value};
