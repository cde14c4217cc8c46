use axum::{
    Extension, Json, Router,
    extract::State,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{delete, get, post, put},
};
use db::models::contact::{ContactMessage, ContactStatus};
use deployment::Deployment;
use serde::Deserialize;
use services::services::contact::{self, ContactSubmission};
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{
    DeploymentImpl,
    error::ApiError,
    middleware::{load_contact_message_middleware, require_admin},
};

#[derive(Debug, Deserialize, TS)]
pub struct UpdateStatusRequest {
    pub status: ContactStatus,
}

/// POST /api/contact - Public contact form
pub async fn submit_contact(
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<ContactSubmission>,
) -> Result<ResponseJson<ApiResponse<ContactMessage>>, ApiError> {
    let message = contact::submit(&deployment.db().pool, payload).await?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        message,
        "Message sent successfully",
    )))
}

/// GET /api/contact - Newest first
pub async fn get_contact_messages(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<ContactMessage>>>, ApiError> {
    let messages = ContactMessage::find_all(&deployment.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(messages)))
}

/// PUT /api/contact/{id}/status
pub async fn update_contact_status(
    Extension(message): Extension<ContactMessage>,
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<ResponseJson<ApiResponse<ContactMessage>>, ApiError> {
    let updated = ContactMessage::update_status(&deployment.db().pool, message.id, payload.status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Contact message".into()))?;
    Ok(ResponseJson(ApiResponse::success(updated)))
}

/// DELETE /api/contact/{id}
#[tracing::instrument(skip_all, fields(contact_id = %message.id))]
pub async fn delete_contact_message(
    Extension(message): Extension<ContactMessage>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = ContactMessage::delete(&deployment.db().pool, message.id).await?;
    if rows_affected == 0 {
        Err(ApiError::Database(sqlx::Error::RowNotFound))
    } else {
        tracing::info!("Contact message deleted");
        Ok(ResponseJson(ApiResponse::success(())))
    }
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let message_router = Router::new()
        .route("/", delete(delete_contact_message))
        .route("/status", put(update_contact_status))
        .layer(from_fn_with_state(
            deployment.clone(),
            load_contact_message_middleware,
        ))
        .route_layer(from_fn_with_state(deployment.clone(), require_admin));

    let inner = Router::new()
        .route(
            "/",
            post(submit_contact).merge(
                get(get_contact_messages)
                    .route_layer(from_fn_with_state(deployment.clone(), require_admin)),
            ),
        )
        .nest("/{message_id}", message_router);

    Router::new().nest("/contact", inner)
}
