use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, post},
};
use deployment::Deployment;
use serde::Serialize;
use services::services::{
    catalog::parse_category_ids,
    storage::StorageKind,
    upload::{
        ALLOWED_CONTENT_TYPES, MAX_UPLOAD_BYTES, UploadRequest, UploadResponse, UploadedFile,
        upload_image,
    },
};
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError, middleware::require_admin};

/// Room for the form fields around a maximum-size file
const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 1024 * 1024;

#[derive(Debug, Serialize, TS)]
pub struct UploadStatus {
    /// Configured backends in the order they are tried
    pub backends: Vec<StorageKind>,
    /// Backend a new upload tries first
    pub primary: Option<StorageKind>,
    pub serverless: bool,
    pub max_file_size: usize,
    pub allowed_types: Vec<String>,
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Collect the multipart form. Category ids arrive as a JSON array
/// (`category_ids`) and/or as repeated `category_id` fields.
async fn read_upload_form(mut multipart: Multipart) -> Result<UploadRequest, ApiError> {
    let mut request = UploadRequest::default();
    let mut raw_ids: Vec<String> = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await?;
                request.file = Some(UploadedFile {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            "title" => request.title = non_empty(field.text().await?),
            "description" => request.description = non_empty(field.text().await?),
            "location" => request.location = non_empty(field.text().await?),
            "featured" => request.featured = field.text().await?.trim() == "true",
            "category_ids" | "categoryIds" => {
                let text = field.text().await?;
                if text.trim().is_empty() {
                    continue;
                }
                let ids: Vec<String> = serde_json::from_str(&text).map_err(|_| {
                    ApiError::BadRequest("category_ids must be a JSON array of ids".into())
                })?;
                raw_ids.extend(ids);
            }
            "category_id" | "categoryId" => {
                if let Some(id) = non_empty(field.text().await?) {
                    raw_ids.push(id);
                }
            }
            other => tracing::debug!(field = other, "Ignoring unknown upload field"),
        }
    }

    request.category_ids = parse_category_ids(&raw_ids)?;
    Ok(request)
}

/// POST /api/upload - Store an image file and record it
pub async fn upload(
    State(deployment): State<DeploymentImpl>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let request = read_upload_form(multipart).await?;
    let response = upload_image(&deployment.db().pool, deployment.storage(), request).await?;
    Ok(Json(response))
}

/// GET /api/upload/status
pub async fn upload_status(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<UploadStatus>>, ApiError> {
    let storage = deployment.storage();
    Ok(ResponseJson(ApiResponse::success(UploadStatus {
        backends: storage.kinds(),
        primary: storage.primary(),
        serverless: deployment.config().storage.serverless,
        max_file_size: MAX_UPLOAD_BYTES,
        allowed_types: ALLOWED_CONTENT_TYPES.iter().map(|t| t.to_string()).collect(),
    })))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new()
        .route(
            "/upload",
            post(upload).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/upload/status", get(upload_status))
        .route_layer(from_fn_with_state(deployment.clone(), require_admin))
}
