//! Workspace root for Ember.
//!
//! The interpreter lives in `crates/*`; this package only hosts the
//! cross-crate integration tests under `tests/`.
