use axum::{
    Json, Router,
    extract::State,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, put},
};
use deployment::Deployment;
use serde_json::Value;
use services::services::site_config::{self, SiteConfig};
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError, middleware::require_admin};

/// GET /api/site-config - Stored sections merged over the defaults
pub async fn get_site_config(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<SiteConfig>>, ApiError> {
    let config = site_config::get(&deployment.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(config)))
}

/// PUT /api/site-config - Replace the top-level sections present in the body
#[tracing::instrument(skip_all)]
pub async fn update_site_config(
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<Value>,
) -> Result<ResponseJson<ApiResponse<SiteConfig>>, ApiError> {
    let config = site_config::update(&deployment.db().pool, payload).await?;
    tracing::info!("Site configuration updated");
    Ok(ResponseJson(ApiResponse::success_with_message(
        config,
        "Site configuration updated",
    )))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().route(
        "/site-config",
        get(get_site_config).merge(
            put(update_site_config)
                .route_layer(from_fn_with_state(deployment.clone(), require_admin)),
        ),
    )
}
