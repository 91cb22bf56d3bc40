//! atopix-models — Prediction engines and result formatting.
//!
//! Every engine implements [`PredictionEngine`]: one call per patient row,
//! confidence within [0.5, 1.0], and output that depends only on the
//! matrix content.

pub mod seed;
pub mod engine;
pub mod engines;
pub mod formatter;
pub mod registry;

pub use engine::{Call, Endotype, EngineResult, Prediction, PredictionEngine, PredictionRecord};
pub use registry::{ModelRegistry, MODEL_NAMES};
