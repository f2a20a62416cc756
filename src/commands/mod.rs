//! Command Handlers
//!
//! Entry points for the CLI. Each handler validates its request, calls the
//! pipeline, and wraps the outcome in a `CommandResponse`.

pub mod knowledge;

pub use knowledge::*;
