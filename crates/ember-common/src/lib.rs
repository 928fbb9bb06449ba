//! Common data structures for Ember.
//!
//! - `Span`: byte range of a token, expression or form
//! - `BytePos`: a single byte offset into the source

mod span;

pub use span::{BytePos, Span};
