//! Majority-vote engine.
//!
//! Simulates a fixed number of weak rules per patient. Each rule picks a
//! random third of the columns and votes positive when their mean exceeds
//! the row mean. The per-row generator is seeded from the first values of
//! the matrix offset by the row index.

use atopix_common::GeneMatrix;
use rand::seq::index;

use crate::engine::{Call, PredictionEngine};
use crate::seed::{content_seed, mean, seeded_rng};

pub const N_TREES: usize = 10;
/// Leading matrix values that feed the seed.
const SEED_WINDOW: usize = 100;

#[derive(Debug, Default, Clone, Copy)]
pub struct RandomForestModel;

impl RandomForestModel {
    fn subset_size(n_genes: usize) -> usize {
        (n_genes / 3).max(1)
    }

    /// Number of positive votes for one row.
    fn votes(row: &[f64], seed: u64) -> usize {
        let mut rng = seeded_rng(seed);
        let n_genes = row.len();
        let k = Self::subset_size(n_genes);
        let overall = mean(row);

        (0..N_TREES)
            .filter(|_| {
                let picked: Vec<f64> = index::sample(&mut rng, n_genes, k)
                    .iter()
                    .map(|j| row[j])
                    .collect();
                mean(&picked) > overall
            })
            .count()
    }

    /// Majority wins; a tie is negative. Confidence grows with the margin.
    fn vote_call(votes: usize) -> Call {
        let ratio = votes as f64 / N_TREES as f64;
        Call::new(votes * 2 > N_TREES, 0.55 + (ratio - 0.5).abs() * 0.8)
    }
}

impl PredictionEngine for RandomForestModel {
    fn name(&self) -> &'static str {
        "random_forest"
    }

    fn classify(&self, matrix: &GeneMatrix) -> Vec<Call> {
        let base_seed = content_seed(matrix.values().iter().take(SEED_WINDOW).copied());

        matrix
            .rows()
            .enumerate()
            .map(|(i, row)| {
                let (lo, hi) = row
                    .iter()
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
                if lo == hi {
                    return Call::no_signal();
                }
                Self::vote_call(Self::votes(row, base_seed.wrapping_add(i as u64)))
            })
            .collect()
    }
}
