//! HTTP handlers for all API routes.

pub mod system;
pub mod baseline;
pub mod preprocess;
pub mod predict;
pub mod statistics;
