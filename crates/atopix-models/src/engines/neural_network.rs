//! Weighted-sum engine.
//!
//! Draws one normal weight per column for a fixed prefix of columns, seeded
//! from the first row. Each row's weighted prefix sum is scaled by the
//! row's own spread and squashed through a sigmoid; above 0.5 is positive.

use atopix_common::GeneMatrix;

use crate::engine::{Call, PredictionEngine};
use crate::seed::{content_seed, dot, population_std, seeded_rng, sigmoid, standard_normal, SPREAD_EPSILON};

/// Columns fed into the weighted sum.
pub const FEATURE_PREFIX: usize = 10;

#[derive(Debug, Default, Clone, Copy)]
pub struct NeuralNetworkModel;

impl PredictionEngine for NeuralNetworkModel {
    fn name(&self) -> &'static str {
        "neural_network"
    }

    fn classify(&self, matrix: &GeneMatrix) -> Vec<Call> {
        let n_features = FEATURE_PREFIX.min(matrix.n_genes());
        let mut rng = seeded_rng(content_seed(matrix.row(0).iter().copied()));
        let weights: Vec<f64> = (0..n_features).map(|_| standard_normal(&mut rng)).collect();

        matrix
            .rows()
            .map(|row| {
                let spread = population_std(row);
                if !spread.is_finite() || spread < SPREAD_EPSILON {
                    return Call::no_signal();
                }
                let activation = sigmoid(dot(&row[..n_features], &weights) / spread);
                Call::new(activation > 0.5, 0.55 + (activation - 0.5).abs() * 0.8)
            })
            .collect()
    }
}
