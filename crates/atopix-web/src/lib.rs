//! atopix-web — HTTP API for Atopix.
//! Provides:
//!   - Health and model listing
//!   - Baseline cohort reference data
//!   - CSV preprocessing into a short-lived cache
//!   - Direct and cached predictions
//!   - Per-gene statistics of cached uploads

pub mod router;
pub mod handlers;
pub mod state;
pub mod upload;
