//! Portal Core - Shared data structures, configuration, errors and logging
//!
//! This crate defines the types every other portal crate agrees on: the
//! response envelope, the user/session model, the error taxonomy and the
//! configuration file layout.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use types::*;

// Re-export commonly used external types
pub use tracing;
