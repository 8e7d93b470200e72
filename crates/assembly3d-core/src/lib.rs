//! Assembly3D Core Library
//!
//! This crate provides the error type, transform math, export
//! configuration and logging setup shared across all Assembly3D crates.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::{ExportConfig, LoggingConfig};
pub use error::{Error, Result, ResultExt};
pub use types::*;

/// Re-export commonly used items
pub mod prelude {
    pub use crate::error::{Error, Result, ResultExt};
    pub use crate::types::*;
}
