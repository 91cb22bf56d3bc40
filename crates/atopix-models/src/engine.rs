//! The contract every prediction engine satisfies, and the records it emits.

use atopix_common::GeneMatrix;
use serde::Serialize;
use indexmap::IndexMap;
use std::time::Instant;

use crate::formatter;

pub const MIN_CONFIDENCE: f64 = 0.5;
pub const MAX_CONFIDENCE: f64 = 1.0;
/// Confidence reported for rows that carry no usable signal.
pub const NO_SIGNAL_CONFIDENCE: f64 = 0.55;

/// One binary call for one patient row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Call {
    pub positive: bool,
    pub confidence: f64,
}

impl Call {
    /// Confidence is forced into [0.5, 1.0]; a non-finite value falls back
    /// to the no-signal confidence.
    pub fn new(positive: bool, confidence: f64) -> Self {
        let confidence = if confidence.is_finite() {
            confidence.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
        } else {
            NO_SIGNAL_CONFIDENCE
        };
        Self { positive, confidence }
    }

    pub fn no_signal() -> Self {
        Self::new(false, NO_SIGNAL_CONFIDENCE)
    }

    pub fn label(&self) -> u8 {
        u8::from(self.positive)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Prediction {
    Yes,
    No,
}

impl From<bool> for Prediction {
    fn from(positive: bool) -> Self {
        if positive { Self::Yes } else { Self::No }
    }
}

/// Secondary classification of positive patients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Endotype {
    #[serde(rename = "endotype_1")]
    Endotype1,
    #[serde(rename = "endotype_2")]
    Endotype2,
    #[serde(rename = "negative")]
    Negative,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRecord {
    pub patient_id: String,
    pub prediction: Prediction,
    pub endotype: Endotype,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gene_expression: Option<IndexMap<String, f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineResult {
    pub success: bool,
    pub model_type: String,
    pub patient_count: usize,
    pub predictions: Vec<PredictionRecord>,
    pub processing_time_ms: f64,
}

/// A binary disease-risk classifier over gene-expression rows.
///
/// `classify` must return exactly one call per row, in row order, for any
/// matrix with at least one row and one column, and must derive any
/// pseudo-randomness from the matrix content alone.
pub trait PredictionEngine: Send + Sync {
    fn name(&self) -> &'static str;

    fn classify(&self, matrix: &GeneMatrix) -> Vec<Call>;

    fn predict(&self, matrix: &GeneMatrix) -> EngineResult {
        let start = Instant::now();
        let calls = self.classify(matrix);
        debug_assert_eq!(calls.len(), matrix.n_patients());
        let predictions = formatter::format_records(matrix, &calls);
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        tracing::debug!(
            model = self.name(),
            patients = predictions.len(),
            positives = calls.iter().filter(|c| c.positive).count(),
            elapsed_ms,
            "prediction complete"
        );

        EngineResult {
            success: true,
            model_type: self.name().to_string(),
            patient_count: predictions.len(),
            predictions,
            processing_time_ms: formatter::round_to(elapsed_ms, 2),
        }
    }
}
