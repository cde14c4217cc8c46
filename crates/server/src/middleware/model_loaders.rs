use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use db::models::{category::Category, contact::ContactMessage, image::Image};
use deployment::Deployment;
use uuid::Uuid;

use crate::DeploymentImpl;

pub async fn load_category_middleware(
    State(deployment): State<DeploymentImpl>,
    Path(category_id): Path<Uuid>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let category = match Category::find_by_id(&deployment.db().pool, category_id).await {
        Ok(Some(category)) => category,
        Ok(None) => {
            tracing::warn!("Category {} not found", category_id);
            return Err(StatusCode::NOT_FOUND);
        }
        Err(e) => {
            tracing::error!("Failed to fetch category {}: {}", category_id, e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    request.extensions_mut().insert(category);
    Ok(next.run(request).await)
}

pub async fn load_image_middleware(
    State(deployment): State<DeploymentImpl>,
    Path(image_id): Path<Uuid>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let image = match Image::find_by_id(&deployment.db().pool, image_id).await {
        Ok(Some(image)) => image,
        Ok(None) => {
            tracing::warn!("Image {} not found", image_id);
            return Err(StatusCode::NOT_FOUND);
        }
        Err(e) => {
            tracing::error!("Failed to fetch image {}: {}", image_id, e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    request.extensions_mut().insert(image);
    Ok(next.run(request).await)
}

pub async fn load_contact_message_middleware(
    State(deployment): State<DeploymentImpl>,
    Path(message_id): Path<Uuid>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let message = match ContactMessage::find_by_id(&deployment.db().pool, message_id).await {
        Ok(Some(message)) => message,
        Ok(None) => {
            tracing::warn!("Contact message {} not found", message_id);
            return Err(StatusCode::NOT_FOUND);
        }
        Err(e) => {
            tracing::error!("Failed to fetch contact message {}: {}", message_id, e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    request.extensions_mut().insert(message);
    Ok(next.run(request).await)
}
