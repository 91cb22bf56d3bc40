//! Turns engine calls into per-patient records.
//!
//! Endotypes are assigned from a median split of the first gene column. The
//! median is taken over the rows present in the current batch, so filtering
//! patients can move the boundary.

use atopix_common::GeneMatrix;
use indexmap::IndexMap;

use crate::engine::{Call, Endotype, EngineResult, Prediction, PredictionRecord};

/// Round to `decimals` places. Values too large to scale come back unchanged.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / factor
}

/// Median of the values; 0.0 for an empty slice.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

pub fn assign_endotype(positive: bool, first_gene: f64, first_gene_median: f64) -> Endotype {
    match (positive, first_gene >= first_gene_median) {
        (false, _) => Endotype::Negative,
        (true, true) => Endotype::Endotype1,
        (true, false) => Endotype::Endotype2,
    }
}

/// One record per row, pairing identifiers with calls and endotypes.
pub fn format_records(matrix: &GeneMatrix, calls: &[Call]) -> Vec<PredictionRecord> {
    let first_gene: Vec<f64> = matrix.column(0).collect();
    let split = median(&first_gene);

    matrix
        .patient_ids()
        .iter()
        .zip(calls)
        .zip(&first_gene)
        .map(|((id, call), &value)| PredictionRecord {
            patient_id: id.clone(),
            prediction: Prediction::from(call.positive),
            endotype: assign_endotype(call.positive, value, split),
            confidence: round_to(call.confidence, 2),
            gene_expression: None,
        })
        .collect()
}

/// Echo each patient's full expression row onto its record, in column order.
pub fn attach_gene_expression(result: &mut EngineResult, matrix: &GeneMatrix) {
    for (record, row) in result.predictions.iter_mut().zip(matrix.rows()) {
        let expression = matrix
            .gene_columns()
            .iter()
            .cloned()
            .zip(row.iter().copied())
            .collect::<IndexMap<_, _>>();
        record.gene_expression = Some(expression);
    }
}
