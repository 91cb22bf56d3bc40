//! atopix-common — Shared types and errors used across all Atopix crates.

pub mod error;
pub mod matrix;

// Re-export commonly used types
pub use error::{ApiError, AtopixError, ErrorKind, Result};
pub use matrix::GeneMatrix;
