//! Descriptive statistics per gene column.

use atopix_common::GeneMatrix;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneStatistics {
    pub gene: String,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation (N - 1); 0 for a single patient.
    pub std: f64,
    /// Sample variance (N - 1); 0 for a single patient.
    pub variance: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

fn summarize(gene: &str, values: &[f64]) -> GeneStatistics {
    let count = values.len();
    let n = count as f64;
    let mean = values.iter().sum::<f64>() / n;

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = count / 2;
    let median = if count % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };

    let variance = if count > 1 {
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)
    } else {
        0.0
    };

    GeneStatistics {
        gene: gene.to_string(),
        mean,
        median,
        std: variance.sqrt(),
        variance,
        min: sorted[0],
        max: sorted[count - 1],
        count,
    }
}

/// Statistics for every gene column, in column order.
pub fn gene_statistics(matrix: &GeneMatrix) -> Vec<GeneStatistics> {
    matrix
        .gene_columns()
        .iter()
        .enumerate()
        .map(|(j, gene)| {
            let column: Vec<f64> = matrix.column(j).collect();
            summarize(gene, &column)
        })
        .collect()
}
