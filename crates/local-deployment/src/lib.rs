use std::sync::Arc;

use async_trait::async_trait;
use db::DBService;
use deployment::{Deployment, DeploymentError};
use services::services::{auth::SessionTokenService, config::AppConfig, storage::StorageChain};

#[derive(Clone)]
pub struct LocalDeployment {
    db: DBService,
    config: Arc<AppConfig>,
    storage: Arc<StorageChain>,
    sessions: SessionTokenService,
}

#[async_trait]
impl Deployment for LocalDeployment {
    async fn new() -> Result<Self, DeploymentError> {
        let config = AppConfig::from_env()?;
        let db = DBService::new().await?;
        let deployment = Self::from_parts(db, config);
        deployment.log_storage_backends();
        Ok(deployment)
    }

    fn db(&self) -> &DBService {
        &self.db
    }

    fn config(&self) -> &AppConfig {
        &self.config
    }

    fn storage(&self) -> &Arc<StorageChain> {
        &self.storage
    }

    fn sessions(&self) -> &SessionTokenService {
        &self.sessions
    }
}

impl LocalDeployment {
    /// Assemble a deployment from an opened database and loaded configuration
    pub fn from_parts(db: DBService, config: AppConfig) -> Self {
        let storage = Arc::new(StorageChain::from_config(&config.storage));
        let sessions = SessionTokenService::from_config(&config.auth);
        Self {
            db,
            config: Arc::new(config),
            storage,
            sessions,
        }
    }

    /// Same as [`LocalDeployment::from_parts`] with a caller-supplied storage
    /// chain
    pub fn with_storage(db: DBService, config: AppConfig, storage: StorageChain) -> Self {
        Self {
            storage: Arc::new(storage),
            ..Self::from_parts(db, config)
        }
    }
}
