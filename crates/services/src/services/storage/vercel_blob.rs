use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;

use super::{StorageBackend, StorageError, StorageKind, object_path, remote_error};
use crate::services::config::VercelBlobConfig;

const API_VERSION: &str = "7";

#[derive(Debug, Deserialize)]
struct PutBlobResponse {
    url: String,
}

/// Public blob store addressed by pathname
pub struct VercelBlobStorage {
    http: Client,
    config: VercelBlobConfig,
}

impl VercelBlobStorage {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn new(config: VercelBlobConfig) -> Self {
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("portfolio-server/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { http, config }
    }
}

#[async_trait]
impl StorageBackend for VercelBlobStorage {
    fn kind(&self) -> StorageKind {
        StorageKind::VercelBlob
    }

    async fn put(
        &self,
        bytes: &[u8],
        content_type: &str,
        category: &str,
        file_name: &str,
    ) -> Result<String, StorageError> {
        let pathname = object_path(category, file_name);
        let url = format!("{}/", self.config.api_url.trim_end_matches('/'));

        tracing::debug!(pathname = %pathname, "Uploading to Vercel Blob");

        let response = self
            .http
            .put(&url)
            .query(&[("pathname", pathname.as_str())])
            .bearer_auth(self.config.token.expose_secret())
            .header("x-api-version", API_VERSION)
            .header("x-vercel-blob-access", "public")
            .header("x-content-type", content_type)
            .body(bytes.to_vec())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(remote_error(response).await);
        }

        let blob: PutBlobResponse = response
            .json()
            .await
            .map_err(|e| StorageError::InvalidResponse(e.to_string()))?;
        Ok(blob.url)
    }
}
