//! Reference cohort shipped alongside the server.

use atopix_common::{ApiError, AtopixError, GeneMatrix};
use atopix_ingestion::ingest_with_ids;
use axum::{extract::State, Json};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{info, warn};

use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct BaselineResponse {
    pub success: bool,
    pub patient_count: usize,
    pub patient_ids: Vec<String>,
    pub gene_columns: Vec<String>,
    /// Gene name → values across patients, in file column order.
    pub data: IndexMap<String, Vec<f64>>,
}

impl From<GeneMatrix> for BaselineResponse {
    fn from(matrix: GeneMatrix) -> Self {
        let data = matrix
            .gene_columns()
            .iter()
            .enumerate()
            .map(|(j, gene)| (gene.clone(), matrix.column(j).collect()))
            .collect();
        Self {
            success: true,
            patient_count: matrix.n_patients(),
            patient_ids: matrix.patient_ids().to_vec(),
            gene_columns: matrix.gene_columns().to_vec(),
            data,
        }
    }
}

/// GET /api/baseline
pub async fn baseline(State(state): State<SharedState>) -> Result<Json<BaselineResponse>, ApiError> {
    let path = state.config.data.baseline_path.clone();
    let raw = tokio::fs::read(&path).await.map_err(|e| {
        warn!(path = %path.display(), "baseline file unreadable");
        AtopixError::from(e)
    })?;

    // The baseline is server-owned data, so a bad file is a server fault.
    let matrix = tokio::task::spawn_blocking(move || ingest_with_ids(&raw))
        .await
        .map_err(|e| ApiError::Internal(format!("baseline task failed: {}", e)))?
        .map_err(|e| match e {
            AtopixError::Validation(msg) => {
                ApiError::Internal(format!("invalid baseline file {}: {}", path.display(), msg))
            }
            other => ApiError::from(other),
        })?;

    info!(
        patients = matrix.n_patients(),
        genes = matrix.n_genes(),
        "served baseline cohort"
    );

    Ok(Json(BaselineResponse::from(matrix)))
}
