//! Prediction endpoint.
//!
//! Direct mode: multipart with `model_type` and a CSV `file`.
//! Cached mode: `model_type` and `cache_key` (plus optional `patient_ids`),
//! sent either as multipart fields or as a JSON body.

use std::sync::Arc;

use atopix_common::{ApiError, GeneMatrix};
use atopix_ingestion::ingest;
use atopix_models::{formatter::attach_gene_expression, EngineResult};
use atopix_ranker::{top_variant_genes, DEFAULT_TOP_GENES};
use axum::{
    extract::{FromRequest, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::state::{AppState, SharedState};
use crate::upload::{multipart_body, parse_patient_ids, too_large, UploadForm, UploadedFile};

#[derive(Debug, Deserialize)]
pub struct CachedPredictRequest {
    pub model_type: Option<String>,
    pub cache_key: Option<String>,
    #[serde(default)]
    pub patient_ids: Option<Vec<String>>,
}

#[derive(Debug)]
pub enum PredictSource {
    Upload(UploadedFile),
    Cached {
        cache_key: String,
        patient_ids: Option<Vec<String>>,
    },
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    #[serde(flatten)]
    pub result: EngineResult,
    pub gene_columns: Vec<String>,
    pub top_variant_genes: Vec<String>,
}

fn no_model_type() -> ApiError {
    ApiError::Validation("No model type specified".to_string())
}

fn is_json(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.trim_start().starts_with("application/json"))
}

async fn from_json(request: Request, state: &SharedState) -> Result<(String, PredictSource), ApiError> {
    let Json(body) = Json::<CachedPredictRequest>::from_request(request, state)
        .await
        .map_err(|rejection| {
            if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                too_large(&state.config)
            } else {
                ApiError::Validation(format!("Invalid JSON body: {}", rejection.body_text()))
            }
        })?;

    let model_type = body.model_type.ok_or_else(no_model_type)?;
    let cache_key = body
        .cache_key
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("No cache_key provided".to_string()))?;
    let patient_ids = body.patient_ids.filter(|ids| !ids.is_empty());
    Ok((model_type, PredictSource::Cached { cache_key, patient_ids }))
}

async fn from_form(request: Request, state: &SharedState) -> Result<(String, PredictSource), ApiError> {
    let multipart = multipart_body(request, state).await?;
    let mut form = UploadForm::read(multipart, &state.config).await?;

    if form.file.is_none() && form.cache_key.is_none() {
        return Err(ApiError::Validation("No file provided".to_string()));
    }
    let model_type = form.model_type.take().ok_or_else(no_model_type)?;
    // Reject unknown models before looking at the file.
    state.models.get(&model_type)?;

    let source = if form.file.is_some() {
        PredictSource::Upload(form.take_csv(&state.config)?)
    } else {
        let cache_key = form.cache_key.take().unwrap_or_default();
        let patient_ids = match form.patient_ids.as_deref() {
            Some(raw) => parse_patient_ids(raw)?,
            None => None,
        };
        PredictSource::Cached { cache_key, patient_ids }
    };
    Ok((model_type, source))
}

/// Run the selected engine over the resolved matrix and assemble the response.
pub fn run_prediction(
    state: &AppState,
    model_type: &str,
    source: PredictSource,
) -> Result<PredictResponse, ApiError> {
    let engine = state.models.get(model_type)?;

    let matrix: Arc<GeneMatrix> = match source {
        PredictSource::Upload(file) => Arc::new(ingest(&file.bytes)?),
        PredictSource::Cached { cache_key, patient_ids } => {
            state.cache.get(&cache_key, patient_ids.as_deref())?
        }
    };

    let mut result = engine.predict(&matrix);
    attach_gene_expression(&mut result, &matrix);
    let top_variant_genes = top_variant_genes(&matrix, DEFAULT_TOP_GENES);

    info!(
        model = model_type,
        patients = result.patient_count,
        elapsed_ms = result.processing_time_ms,
        "prediction served"
    );

    Ok(PredictResponse {
        result,
        gene_columns: matrix.gene_columns().to_vec(),
        top_variant_genes,
    })
}

/// POST /api/predict
pub async fn predict(
    State(state): State<SharedState>,
    request: Request,
) -> Result<Json<PredictResponse>, ApiError> {
    let (model_type, source) = if is_json(&request) {
        from_json(request, &state).await?
    } else {
        from_form(request, &state).await?
    };

    // Parsing and scoring are CPU-bound.
    tokio::task::spawn_blocking(move || run_prediction(&state, &model_type, source))
        .await
        .map_err(|e| ApiError::Internal(format!("prediction task failed: {}", e)))?
        .map(Json)
}
