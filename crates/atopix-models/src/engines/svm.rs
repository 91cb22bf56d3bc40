//! Hash-threshold engine.
//!
//! Each row's content hash, reduced modulo 100, decides the call: above 50
//! is positive. Confidence rises linearly from 0.60 to 0.9465 with the hash.

use atopix_common::GeneMatrix;

use crate::engine::{Call, PredictionEngine};
use crate::seed::content_seed;

const CUT: u64 = 50;

#[derive(Debug, Default, Clone, Copy)]
pub struct SvmModel;

impl PredictionEngine for SvmModel {
    fn name(&self) -> &'static str {
        "svm"
    }

    fn classify(&self, matrix: &GeneMatrix) -> Vec<Call> {
        matrix
            .rows()
            .map(|row| {
                let bucket = content_seed(row.iter().copied()) % 100;
                Call::new(bucket > CUT, 0.6 + (bucket as f64 / 100.0) * 0.35)
            })
            .collect()
    }
}
