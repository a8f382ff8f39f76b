//! Document parse endpoint

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};

use crate::error::{AppError, Result};
use crate::parse::{OutputBundle, ParseForm};
use crate::state::AppState;

/// Parse a document given as an upload or a storage path
///
/// POST /file_parse (multipart/form-data)
pub async fn file_parse(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<OutputBundle>> {
    let mut multipart = multipart
        .map_err(|e| AppError::BadRequest(format!("Expected a multipart form: {}", e)))?;

    let mut form = ParseForm::default();
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {}", e);
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(e.body_text())
        } else {
            AppError::BadRequest(format!("Invalid multipart data: {}", e))
        }
    })? {
        let name = field.name().unwrap_or("").to_string();

        if name == "file" {
            let file_name = field.file_name().map(|s| s.to_string()).unwrap_or_default();
            let data = field.bytes().await.map_err(|e| {
                tracing::error!("Failed to read file data: {}", e);
                if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    AppError::PayloadTooLarge(e.body_text())
                } else {
                    AppError::BadRequest(format!("Failed to read file: {}", e))
                }
            })?;
            tracing::debug!(file_name = %file_name, size = data.len(), "Received upload");
            form.set_file(file_name, data.to_vec());
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read field {}: {}", name, e)))?;
        if !form.set_text(&name, value) {
            tracing::debug!(field = %name, "Ignoring unknown form field");
        }
    }

    let request = form.into_request()?;
    let bundle = state.service().parse(request).await?;

    Ok(Json(bundle))
}

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/file_parse", post(file_parse))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}
