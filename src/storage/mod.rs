//! Storage Layer
//!
//! JSON configuration persistence. Vector data lives in the configured
//! vector store, not here.

pub mod config;

pub use config::*;
