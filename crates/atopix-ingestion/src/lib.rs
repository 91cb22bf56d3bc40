//! atopix-ingestion — Turns uploaded CSV bytes into validated gene matrices
//! and keeps them in a short-lived cache for repeated predictions.

pub mod tabular;
pub mod cache;

pub use cache::{Clock, PreprocessCache, SystemClock, DEFAULT_TTL_SECS};
pub use tabular::{ingest, ingest_with_ids, IdColumn};
