//! Validated patient × gene expression matrix.
//!
//! Rows are patients, columns are genes. Values are stored row-major in a
//! single buffer. Once built, a matrix is never mutated; selections produce
//! a new matrix.

use crate::error::{AtopixError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct GeneMatrix {
    patient_ids: Vec<String>,
    gene_columns: Vec<String>,
    values: Vec<f64>,
}

impl GeneMatrix {
    /// Build a matrix from per-patient rows.
    ///
    /// Fails if there are no rows or no columns, if any row width differs
    /// from the column count, if identifier and row counts disagree, or if
    /// any cell is not finite.
    pub fn new(
        patient_ids: Vec<String>,
        gene_columns: Vec<String>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self> {
        let n_genes = gene_columns.len();
        let mut values = Vec::with_capacity(rows.len() * n_genes);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n_genes {
                return Err(AtopixError::validation(format!(
                    "Row {} has {} values but {} gene columns were declared",
                    i + 1,
                    row.len(),
                    n_genes
                )));
            }
            values.extend_from_slice(row);
        }
        Self::from_row_major(patient_ids, gene_columns, values)
    }

    /// Build a matrix from an already flattened row-major buffer.
    pub fn from_row_major(
        patient_ids: Vec<String>,
        gene_columns: Vec<String>,
        values: Vec<f64>,
    ) -> Result<Self> {
        if patient_ids.is_empty() {
            return Err(AtopixError::validation("CSV must have at least 1 patient row"));
        }
        if gene_columns.is_empty() {
            return Err(AtopixError::validation("CSV must have at least 1 gene column"));
        }
        if values.len() != patient_ids.len() * gene_columns.len() {
            return Err(AtopixError::Internal(format!(
                "matrix shape mismatch: {} values for {} x {}",
                values.len(),
                patient_ids.len(),
                gene_columns.len()
            )));
        }
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            let n = gene_columns.len();
            return Err(AtopixError::validation(format!(
                "Non-finite value in gene column '{}' for patient '{}'",
                gene_columns[pos % n],
                patient_ids[pos / n]
            )));
        }
        Ok(Self { patient_ids, gene_columns, values })
    }

    pub fn n_patients(&self) -> usize {
        self.patient_ids.len()
    }

    pub fn n_genes(&self) -> usize {
        self.gene_columns.len()
    }

    pub fn patient_ids(&self) -> &[String] {
        &self.patient_ids
    }

    pub fn gene_columns(&self) -> &[String] {
        &self.gene_columns
    }

    /// Entire buffer in row-major order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn row(&self, i: usize) -> &[f64] {
        let n = self.n_genes();
        &self.values[i * n..(i + 1) * n]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.values.chunks_exact(self.n_genes())
    }

    pub fn column(&self, j: usize) -> impl Iterator<Item = f64> + '_ {
        self.rows().map(move |row| row[j])
    }

    /// New matrix holding only the given rows, in the order given.
    pub fn select_rows(&self, indices: &[usize]) -> Result<Self> {
        let mut ids = Vec::with_capacity(indices.len());
        let mut values = Vec::with_capacity(indices.len() * self.n_genes());
        for &i in indices {
            let id = self.patient_ids.get(i).ok_or_else(|| {
                AtopixError::Internal(format!("row index {} out of bounds", i))
            })?;
            ids.push(id.clone());
            values.extend_from_slice(self.row(i));
        }
        Self::from_row_major(ids, self.gene_columns.clone(), values)
    }
}
