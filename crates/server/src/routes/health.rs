use axum::{extract::State, response::Json};
use deployment::Deployment;
use serde::Serialize;

use crate::DeploymentImpl;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database_ready: bool,
    pub storage_backends: Vec<&'static str>,
}

pub async fn health_check(State(deployment): State<DeploymentImpl>) -> Json<HealthResponse> {
    // Quick database connectivity check
    let database_ready = sqlx::query("SELECT 1")
        .fetch_one(&deployment.db().pool)
        .await
        .is_ok();

    Json(HealthResponse {
        status: if database_ready { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database_ready,
        storage_backends: deployment
            .storage()
            .kinds()
            .iter()
            .map(|kind| kind.as_str())
            .collect(),
    })
}
