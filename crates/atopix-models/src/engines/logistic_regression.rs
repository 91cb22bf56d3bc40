//! Linear-combination engine.
//!
//! Draws one coefficient per column and an intercept, seeded from the
//! leading values of the first row, and passes the full-width linear
//! combination through the logistic function; above 0.5 is positive.

use atopix_common::GeneMatrix;

use crate::engine::{Call, PredictionEngine};
use crate::seed::{content_seed, dot, seeded_rng, sigmoid, standard_normal};

const SEED_WINDOW: usize = 50;
const COEFFICIENT_SCALE: f64 = 0.1;
const INTERCEPT_SCALE: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct LinearParams {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LogisticRegressionModel;

impl LogisticRegressionModel {
    pub fn params(matrix: &GeneMatrix) -> LinearParams {
        let seed = content_seed(matrix.row(0).iter().take(SEED_WINDOW).copied());
        let mut rng = seeded_rng(seed);
        let coefficients = (0..matrix.n_genes())
            .map(|_| standard_normal(&mut rng) * COEFFICIENT_SCALE)
            .collect();
        let intercept = standard_normal(&mut rng) * INTERCEPT_SCALE;
        LinearParams { coefficients, intercept }
    }
}

impl PredictionEngine for LogisticRegressionModel {
    fn name(&self) -> &'static str {
        "logistic_regression"
    }

    fn classify(&self, matrix: &GeneMatrix) -> Vec<Call> {
        let params = Self::params(matrix);
        matrix
            .rows()
            .map(|row| {
                let p = sigmoid(dot(row, &params.coefficients) + params.intercept);
                Call::new(p > 0.5, 0.55 + (p - 0.5).abs() * 2.0 * 0.40)
            })
            .collect()
    }
}
