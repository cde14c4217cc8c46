use axum::{
    Json, Router,
    extract::State,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, put},
};
use deployment::Deployment;
use serde_json::Value;
use services::services::profile::{self, PhotographerProfile};
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError, middleware::require_admin};

pub async fn get_profile(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<PhotographerProfile>>, ApiError> {
    let profile = profile::get(&deployment.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(profile)))
}

#[tracing::instrument(skip_all)]
pub async fn update_profile(
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<Value>,
) -> Result<ResponseJson<ApiResponse<PhotographerProfile>>, ApiError> {
    let profile = profile::update(&deployment.db().pool, payload).await?;
    Ok(ResponseJson(ApiResponse::success(profile)))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().route(
        "/profile",
        get(get_profile).merge(
            put(update_profile).route_layer(from_fn_with_state(deployment.clone(), require_admin)),
        ),
    )
}
