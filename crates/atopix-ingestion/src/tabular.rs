//! CSV ingestion and validation.
//!
//! Accepts raw upload bytes and produces a [`GeneMatrix`]:
//! - Uploads: a leading non-numeric column is taken as patient identifiers;
//!   otherwise identifiers are synthesized as `patient_1`, `patient_2`, ...
//! - Reference files ([`IdColumn::First`]): the first column is always the
//!   identifiers, numeric or not.
//! - Every remaining column must be numeric. Offending columns are reported
//!   together in a single error.
//! - Missing cells are imputed with their column mean, or zero when the
//!   whole column is missing.

use atopix_common::{AtopixError, GeneMatrix, Result};
use csv::{ReaderBuilder, Trim};
use std::collections::HashMap;
use tracing::debug;

/// Cell spellings treated as missing values.
const MISSING_MARKERS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "#N/A", "<NA>",
];

fn is_missing(cell: &str) -> bool {
    MISSING_MARKERS.contains(&cell)
}

/// Parse a single cell. `Ok(None)` is a missing value, `Err(())` is text
/// that cannot be read as a finite number.
fn parse_cell(cell: &str) -> std::result::Result<Option<f64>, ()> {
    if is_missing(cell) {
        return Ok(None);
    }
    match cell.parse::<f64>() {
        Ok(v) if v.is_nan() => Ok(None),
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(()),
    }
}

/// Synthesized identifier for a 0-based row index.
pub fn synthesized_patient_id(row: usize) -> String {
    format!("patient_{}", row + 1)
}

/// Where patient identifiers come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdColumn {
    /// Column 0 holds identifiers unless every cell in it is numeric or missing.
    Detect,
    /// Column 0 always holds identifiers.
    First,
}

/// Ingest raw CSV bytes into a validated gene matrix.
pub fn ingest(raw: &[u8]) -> Result<GeneMatrix> {
    ingest_with(raw, IdColumn::Detect)
}

/// Ingest a file whose first column is known to hold identifiers.
pub fn ingest_with_ids(raw: &[u8]) -> Result<GeneMatrix> {
    ingest_with(raw, IdColumn::First)
}

pub fn ingest_with(raw: &[u8], id_column: IdColumn) -> Result<GeneMatrix> {
    if raw.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(AtopixError::validation("CSV file is empty or invalid"));
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(raw);

    let headers: Vec<String> = reader
        .headers()
        .map_err(parse_error)?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.is_empty() || headers.iter().all(String::is_empty) {
        return Err(AtopixError::validation("CSV file is empty or invalid"));
    }
    let width = headers.len();

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(parse_error)?;
        if record.len() > width {
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            return Err(AtopixError::validation(format!(
                "Error parsing CSV file: expected {} fields in line {}, saw {}",
                width,
                line,
                record.len()
            )));
        }
        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        row.resize(width, String::new());
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(AtopixError::validation("CSV file is empty"));
    }

    let names = normalize_headers(&headers);

    let ids_from_file = match id_column {
        IdColumn::First => true,
        IdColumn::Detect => !rows.iter().all(|row| parse_cell(&row[0]).is_ok()),
    };
    let (patient_ids, gene_start) = if !ids_from_file {
        ((0..rows.len()).map(synthesized_patient_id).collect::<Vec<_>>(), 0)
    } else {
        let ids = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                if is_missing(&row[0]) {
                    synthesized_patient_id(i)
                } else {
                    row[0].clone()
                }
            })
            .collect();
        (ids, 1)
    };

    let gene_columns: Vec<String> = names[gene_start..].to_vec();
    if gene_columns.is_empty() {
        return Err(AtopixError::validation("CSV must have at least 1 gene column"));
    }

    let n_genes = gene_columns.len();
    let mut cells: Vec<Option<f64>> = Vec::with_capacity(rows.len() * n_genes);
    let mut non_numeric: Vec<&str> = Vec::new();
    for (offset, name) in gene_columns.iter().enumerate() {
        let j = gene_start + offset;
        if rows.iter().any(|row| parse_cell(&row[j]).is_err()) {
            non_numeric.push(name);
        }
    }
    if !non_numeric.is_empty() {
        return Err(AtopixError::validation(format!(
            "Non-numeric data found in gene columns: {}. All gene expression values must be numeric.",
            non_numeric.join(", ")
        )));
    }

    for row in &rows {
        for cell in &row[gene_start..] {
            cells.push(parse_cell(cell).unwrap_or(None));
        }
    }

    let values = impute_column_means(&cells, n_genes);

    debug!(
        patients = patient_ids.len(),
        genes = n_genes,
        ids_from_file,
        "ingested CSV"
    );

    GeneMatrix::from_row_major(patient_ids, gene_columns, values)
}

fn parse_error(err: csv::Error) -> AtopixError {
    AtopixError::validation(format!("Error parsing CSV file: {}", err))
}

/// Fill missing cells with the mean of the present values in their column.
/// A column with no present values is filled with zero.
fn impute_column_means(cells: &[Option<f64>], n_cols: usize) -> Vec<f64> {
    let mut sums = vec![0.0f64; n_cols];
    let mut counts = vec![0usize; n_cols];
    for (idx, cell) in cells.iter().enumerate() {
        if let Some(v) = cell {
            sums[idx % n_cols] += v;
            counts[idx % n_cols] += 1;
        }
    }
    let means: Vec<f64> = sums
        .iter()
        .zip(&counts)
        .map(|(&sum, &count)| if count == 0 { 0.0 } else { sum / count as f64 })
        .collect();

    cells
        .iter()
        .enumerate()
        .map(|(idx, cell)| cell.unwrap_or(means[idx % n_cols]))
        .collect()
}

/// Give blank headers a positional name and make duplicates unique the way
/// pandas does: `g1`, `g1.1`, `g1.2`, ... with suffixes stacked when a
/// suffixed name is itself taken.
fn normalize_headers(headers: &[String]) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(headers.len());
    for (i, raw) in headers.iter().enumerate() {
        let mut name = if raw.is_empty() { format!("Unnamed: {}", i) } else { raw.clone() };
        let mut count = counts.get(&name).copied().unwrap_or(0);
        while count > 0 {
            counts.insert(name.clone(), count + 1);
            name = format!("{}.{}", name, count);
            count = counts.get(&name).copied().unwrap_or(0);
        }
        counts.insert(name.clone(), count + 1);
        out.push(name);
    }
    out
}
