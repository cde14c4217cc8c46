use axum::{
    Extension, Json, Router,
    extract::State,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::user::User;
use deployment::Deployment;
use services::services::auth::{self, AuthError, LoginRequest, LoginResponse, Session};
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError, middleware::require_admin};

/// POST /api/auth/login - Exchange admin credentials for a session token
pub async fn login(
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<LoginRequest>,
) -> Result<ResponseJson<ApiResponse<LoginResponse>>, ApiError> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest("Email and password are required".into()));
    }
    let response = auth::login(&deployment.db().pool, deployment.sessions(), &payload).await?;
    Ok(ResponseJson(ApiResponse::success(response)))
}

/// GET /api/auth/me - The signed-in user
pub async fn me(
    Extension(session): Extension<Session>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<User>>, ApiError> {
    // The account may have been removed after the token was issued
    let user = User::find_by_id(&deployment.db().pool, session.user_id)
        .await?
        .ok_or(AuthError::InvalidToken)?;
    Ok(ResponseJson(ApiResponse::success(user)))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let inner = Router::new()
        .route(
            "/me",
            get(me).route_layer(from_fn_with_state(deployment.clone(), require_admin)),
        )
        .route("/login", post(login));

    Router::new().nest("/auth", inner)
}
