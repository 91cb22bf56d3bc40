//! Upload once, predict many times.

use atopix_common::{ApiError, GeneMatrix};
use atopix_ingestion::ingest;
use atopix_models::formatter::round_to;
use axum::{
    extract::{Request, State},
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::state::SharedState;
use crate::upload::{multipart_body, UploadForm};

/// Gene columns included in the preview.
pub const PREVIEW_GENES: usize = 5;

#[derive(Debug, Serialize)]
pub struct PatientPreview {
    pub patient_id: String,
    /// Values of the preview genes, aligned with `gene_columns`.
    pub values: Vec<f64>,
}

#[derive(Debug, Serialize)]
pub struct PreprocessResponse {
    pub success: bool,
    pub cache_key: String,
    pub patient_count: usize,
    /// First few gene columns; see `total_genes` for the full count.
    pub gene_columns: Vec<String>,
    pub total_genes: usize,
    pub preview_data: Vec<PatientPreview>,
}

pub fn preview(matrix: &GeneMatrix) -> Vec<PatientPreview> {
    let n = PREVIEW_GENES.min(matrix.n_genes());
    matrix
        .patient_ids()
        .iter()
        .zip(matrix.rows())
        .map(|(id, row)| PatientPreview {
            patient_id: id.clone(),
            values: row[..n].iter().map(|&v| round_to(v, 4)).collect(),
        })
        .collect()
}

/// POST /api/preprocess — multipart with a `file` part.
pub async fn preprocess(
    State(state): State<SharedState>,
    request: Request,
) -> Result<Json<PreprocessResponse>, ApiError> {
    let multipart = multipart_body(request, &state).await?;
    let mut form = UploadForm::read(multipart, &state.config).await?;
    let file = form.take_csv(&state.config)?;

    let filename = file.filename;
    let bytes = file.bytes;
    let matrix = tokio::task::spawn_blocking(move || ingest(&bytes))
        .await
        .map_err(|e| ApiError::Internal(format!("ingest task failed: {}", e)))??;
    let patient_count = matrix.n_patients();
    let total_genes = matrix.n_genes();
    let gene_columns = matrix.gene_columns().iter().take(PREVIEW_GENES).cloned().collect();
    let preview_data = preview(&matrix);

    let cache_key = state.cache.put(matrix);
    info!(
        cache_key = %cache_key,
        filename = %filename,
        patients = patient_count,
        genes = total_genes,
        "preprocessed upload"
    );

    Ok(Json(PreprocessResponse {
        success: true,
        cache_key,
        patient_count,
        gene_columns,
        total_genes,
        preview_data,
    }))
}
