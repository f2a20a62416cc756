//! Data Models
//!
//! Configuration and output envelope types.

pub mod response;
pub mod settings;

pub use response::*;
pub use settings::*;
