use std::sync::Arc;

use async_trait::async_trait;
use db::DBService;
use services::services::{
    auth::SessionTokenService,
    config::{AppConfig, ConfigError},
    storage::StorageChain,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Everything a request handler can reach: the database, immutable
/// configuration and the services built from it
#[async_trait]
pub trait Deployment: Clone + Send + Sync + 'static {
    async fn new() -> Result<Self, DeploymentError>;

    fn db(&self) -> &DBService;

    fn config(&self) -> &AppConfig;

    fn storage(&self) -> &Arc<StorageChain>;

    fn sessions(&self) -> &SessionTokenService;

    /// Log which upload backends are reachable
    fn log_storage_backends(&self) {
        let kinds: Vec<_> = self
            .storage()
            .kinds()
            .iter()
            .map(|k| k.as_str())
            .collect();
        tracing::info!(backends = ?kinds, "Upload storage chain ready");
        if kinds.is_empty() {
            tracing::warn!("Running serverless without a cloud storage backend; uploads will fail");
        }
    }
}
