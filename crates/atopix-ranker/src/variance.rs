//! Rank genes by how much they vary across patients.

use atopix_common::GeneMatrix;

pub const DEFAULT_TOP_GENES: usize = 10;

/// Population variance (divides by N).
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

/// Names of the `n` highest-variance gene columns, highest first.
/// Equal variances keep their original column order.
pub fn top_variant_genes(matrix: &GeneMatrix, n: usize) -> Vec<String> {
    let mut ranked: Vec<(usize, f64)> = (0..matrix.n_genes())
        .map(|j| {
            let column: Vec<f64> = matrix.column(j).collect();
            (j, population_variance(&column))
        })
        .collect();

    // sort_by is stable, ties stay in column order
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    ranked
        .into_iter()
        .take(n)
        .map(|(j, _)| matrix.gene_columns()[j].clone())
        .collect()
}
