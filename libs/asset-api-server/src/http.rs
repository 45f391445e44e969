use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use asset_api::{AssetId, AssetMeta, FALLBACK_CONTENT_TYPE};

use super::error::ApiError;
use super::AppState;

/// Multipart field carrying the model file.
pub const UPLOAD_FIELD: &str = "model";

// ═══════════════════════════════════════════════════════════════
//  GET /
// ═══════════════════════════════════════════════════════════════

pub(crate) async fn handle_home() -> &'static str {
    "Welcome to the 3D Model API server! 🎉"
}

// ═══════════════════════════════════════════════════════════════
//  POST /upload   (multipart, file field `model`)
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
pub(crate) struct UploadResponse {
    message: &'static str,
    id: AssetId,
    name: String,
}

struct UploadedFile {
    filename: String,
    content_type: Option<String>,
    data: Bytes,
}

pub(crate) async fn handle_upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, axum::Json<UploadResponse>), ApiError> {
    // A request that is not multipart at all carries no file either.
    let Ok(mut multipart) = multipart else {
        return Err(ApiError::no_file());
    };
    let max_bytes = state.service.validator().max_bytes();

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::multipart(e, max_bytes))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        // A plain text field named `model` is not a file, and a form
        // submitted with no file chosen sends an empty filename.
        let Some(filename) = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_string)
        else {
            continue;
        };
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(|e| ApiError::multipart(e, max_bytes))?;
        upload = Some(UploadedFile { filename, content_type, data });
        break;
    }

    let Some(file) = upload else {
        return Err(ApiError::no_file());
    };

    let id = state
        .service
        .ingest(&file.filename, file.data, file.content_type.as_deref())
        .await
        .map_err(|e| ApiError::service(e, "Failed to upload model"))?;

    Ok((
        StatusCode::CREATED,
        axum::Json(UploadResponse {
            message: "Model uploaded successfully",
            id,
            name: file.filename,
        }),
    ))
}

// ═══════════════════════════════════════════════════════════════
//  GET /model/{id}
// ═══════════════════════════════════════════════════════════════

pub(crate) async fn handle_fetch_model(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let asset = state
        .service
        .fetch(&AssetId::from(id))
        .await
        .map_err(|e| ApiError::service(e, "Failed to retrieve model"))?;

    let mut headers = HeaderMap::new();
    for (name, value) in asset.headers() {
        // Declared types come from the client and may not be valid header text.
        let value = HeaderValue::from_str(value).unwrap_or_else(|_| {
            tracing::warn!(id = %asset.id, value, "invalid content type, serving as octet-stream");
            HeaderValue::from_static(FALLBACK_CONTENT_TYPE)
        });
        headers.insert(HeaderName::from_static(name), value);
    }

    Ok((headers, asset.data).into_response())
}

// ═══════════════════════════════════════════════════════════════
//  GET /models
// ═══════════════════════════════════════════════════════════════

pub(crate) async fn handle_list_models(
    State(state): State<AppState>,
) -> Result<axum::Json<Vec<AssetMeta>>, ApiError> {
    let metas = state
        .service
        .list_metadata()
        .await
        .map_err(|e| ApiError::service(e, "Failed to list models"))?;
    Ok(axum::Json(metas))
}
