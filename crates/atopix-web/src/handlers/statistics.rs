//! Per-gene descriptive statistics of a cached upload.

use atopix_common::ApiError;
use atopix_ranker::{gene_statistics, GeneStatistics};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct StatisticsResponse {
    pub success: bool,
    pub cache_key: String,
    pub patient_count: usize,
    pub statistics: Vec<GeneStatistics>,
}

/// GET /api/statistics/{cache_key}
pub async fn statistics(
    State(state): State<SharedState>,
    Path(cache_key): Path<String>,
) -> Result<Json<StatisticsResponse>, ApiError> {
    let matrix = state.cache.get(&cache_key, None)?;
    Ok(Json(StatisticsResponse {
        success: true,
        patient_count: matrix.n_patients(),
        statistics: gene_statistics(&matrix),
        cache_key,
    }))
}
