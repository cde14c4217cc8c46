use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use deployment::Deployment;
use services::services::auth::AuthError;

use crate::{DeploymentImpl, error::ApiError};

/// Extract bearer token from Authorization header.
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?;
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
}

/// Reject requests without a valid admin session. The verified
/// [`Session`](services::services::auth::Session) is inserted as a request
/// extension.
pub async fn require_admin(
    State(deployment): State<DeploymentImpl>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers()).ok_or(AuthError::MissingToken)?;
    let session = deployment.sessions().validate(token)?;

    if !session.is_admin() {
        tracing::warn!(user_id = %session.user_id, "Non-admin session rejected");
        return Err(AuthError::Forbidden.into());
    }

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}
