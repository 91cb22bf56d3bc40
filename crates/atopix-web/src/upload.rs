//! Multipart form reading and upload validation.

use atopix_common::ApiError;
use atopix_config::AppConfig;
use axum::extract::multipart::{Multipart, MultipartError};
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Fields recognised in upload forms. Unknown parts are ignored.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<UploadedFile>,
    pub model_type: Option<String>,
    pub cache_key: Option<String>,
    pub patient_ids: Option<String>,
}

pub fn too_large(config: &AppConfig) -> ApiError {
    ApiError::PayloadTooLarge(format!(
        "File is too large. Maximum size is {}MB",
        config.server.max_upload_mb()
    ))
}

fn multipart_error(err: MultipartError, config: &AppConfig) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        too_large(config)
    } else {
        ApiError::Validation(format!("Invalid form data: {}", err.body_text()))
    }
}

/// Extract a multipart body, turning rejections into tagged errors.
/// A request that is not multipart at all is reported as missing its file.
pub async fn multipart_body<S>(request: Request, state: &S) -> Result<Multipart, ApiError>
where
    S: Send + Sync,
{
    Multipart::from_request(request, state).await.map_err(|rejection| {
        tracing::debug!(reason = %rejection.body_text(), "request is not multipart");
        ApiError::Validation("No file provided".to_string())
    })
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl UploadForm {
    pub async fn read(mut multipart: Multipart, config: &AppConfig) -> Result<Self, ApiError> {
        let mut form = UploadForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(e, config))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "file" => {
                    let filename = field.file_name().unwrap_or_default().to_string();
                    let bytes = field.bytes().await.map_err(|e| multipart_error(e, config))?;
                    form.file = Some(UploadedFile { filename, bytes: bytes.to_vec() });
                }
                "model_type" | "cache_key" | "patient_ids" => {
                    let text = field.text().await.map_err(|e| multipart_error(e, config))?;
                    let slot = match name.as_str() {
                        "model_type" => &mut form.model_type,
                        "cache_key" => &mut form.cache_key,
                        _ => &mut form.patient_ids,
                    };
                    *slot = non_empty(text);
                }
                other => tracing::debug!(field = other, "ignoring unknown form field"),
            }
        }
        Ok(form)
    }

    /// The uploaded CSV, after the presence, filename and extension checks.
    pub fn take_csv(&mut self, config: &AppConfig) -> Result<UploadedFile, ApiError> {
        let file = self
            .file
            .take()
            .ok_or_else(|| ApiError::Validation("No file provided".to_string()))?;
        validate_filename(&file.filename, config)?;
        Ok(file)
    }
}

pub fn validate_filename(filename: &str, config: &AppConfig) -> Result<(), ApiError> {
    if filename.is_empty() {
        return Err(ApiError::Validation("No file selected".to_string()));
    }
    if !config.upload.is_allowed(filename) {
        return Err(ApiError::Validation(format!(
            "File must be a CSV ({} extension required)",
            config.upload.allowed_extensions.join(" or ")
        )));
    }
    Ok(())
}

/// Accepts a JSON array (`["p1","p2"]`) or a comma-separated list.
/// An empty selection means no filter.
pub fn parse_patient_ids(raw: &str) -> Result<Option<Vec<String>>, ApiError> {
    let raw = raw.trim();
    let ids: Vec<String> = if raw.starts_with('[') {
        serde_json::from_str(raw)
            .map_err(|e| ApiError::Validation(format!("Invalid patient_ids list: {}", e)))?
    } else {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    };
    Ok((!ids.is_empty()).then_some(ids))
}
