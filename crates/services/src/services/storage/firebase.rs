use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;

use super::{StorageBackend, StorageError, StorageKind, object_path, remote_error};
use crate::services::config::FirebaseConfig;

/// Metadata returned by the storage REST API after a media upload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectMetadata {
    name: String,
    bucket: Option<String>,
    /// Comma separated; the first one builds the public download URL
    download_tokens: Option<String>,
}

/// Firebase Storage via its REST upload endpoint
pub struct FirebaseStorage {
    http: Client,
    config: FirebaseConfig,
}

impl FirebaseStorage {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn new(config: FirebaseConfig) -> Self {
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("portfolio-server/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { http, config }
    }

    fn objects_url(&self, bucket: &str) -> String {
        format!(
            "{}/v0/b/{}/o",
            self.config.api_url.trim_end_matches('/'),
            bucket
        )
    }

    fn download_url(&self, metadata: &ObjectMetadata) -> String {
        let bucket = metadata.bucket.as_deref().unwrap_or(&self.config.bucket);
        let mut url = format!(
            "{}/{}?alt=media",
            self.objects_url(bucket),
            urlencoding::encode(&metadata.name)
        );
        if let Some(token) = metadata
            .download_tokens
            .as_deref()
            .and_then(|tokens| tokens.split(',').next())
            .filter(|token| !token.is_empty())
        {
            url.push_str("&token=");
            url.push_str(token);
        }
        url
    }
}

#[async_trait]
impl StorageBackend for FirebaseStorage {
    fn kind(&self) -> StorageKind {
        StorageKind::Firebase
    }

    async fn put(
        &self,
        bytes: &[u8],
        content_type: &str,
        category: &str,
        file_name: &str,
    ) -> Result<String, StorageError> {
        let name = object_path(category, file_name);

        tracing::debug!(
            bucket = %self.config.bucket,
            project_id = %self.config.project_id,
            name = %name,
            "Uploading to Firebase Storage"
        );

        let response = self
            .http
            .post(self.objects_url(&self.config.bucket))
            .query(&[
                ("name", name.as_str()),
                ("uploadType", "media"),
                ("key", self.config.api_key.expose_secret()),
            ])
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes.to_vec())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(remote_error(response).await);
        }

        let metadata: ObjectMetadata = response
            .json()
            .await
            .map_err(|e| StorageError::InvalidResponse(e.to_string()))?;
        Ok(self.download_url(&metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> FirebaseStorage {
        FirebaseStorage::new(FirebaseConfig {
            api_key: "key".to_string().into(),
            project_id: "proj".into(),
            bucket: "proj.appspot.com".into(),
            api_url: "https://firebasestorage.googleapis.com".into(),
        })
    }

    #[test]
    fn download_url_encodes_object_name_and_uses_first_token() {
        let url = storage().download_url(&ObjectMetadata {
            name: "images/interiors/a.jpg".into(),
            bucket: None,
            download_tokens: Some("tok1,tok2".into()),
        });
        assert_eq!(
            url,
            "https://firebasestorage.googleapis.com/v0/b/proj.appspot.com/o/images%2Finteriors%2Fa.jpg?alt=media&token=tok1"
        );
    }

    #[test]
    fn download_url_without_token() {
        let url = storage().download_url(&ObjectMetadata {
            name: "images/a/b.png".into(),
            bucket: Some("other".into()),
            download_tokens: None,
        });
        assert!(url.starts_with("https://firebasestorage.googleapis.com/v0/b/other/o/"));
        assert!(url.ends_with("?alt=media"));
    }
}
