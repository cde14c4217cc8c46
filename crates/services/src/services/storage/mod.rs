//! Object storage for uploaded images.
//!
//! Backends are tried in priority order: Vercel Blob, then Firebase Storage,
//! then the local uploads directory. Only configured backends take part, and
//! each is tried at most once per upload.

mod firebase;
mod local;
mod vercel_blob;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

pub use firebase::FirebaseStorage;
pub use local::{LocalStorage, UPLOADS_URL_PREFIX};
pub use vercel_blob::VercelBlobStorage;

use super::config::StorageConfig;

/// Tag of the backend that accepted an upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum StorageKind {
    VercelBlob,
    Firebase,
    Local,
}

impl StorageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKind::VercelBlob => "vercel-blob",
            StorageKind::Firebase => "firebase",
            StorageKind::Local => "local",
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(
        "Local file storage is not available in a serverless environment. Configure Vercel Blob (BLOB_READ_WRITE_TOKEN) or Firebase Storage (FIREBASE_API_KEY, FIREBASE_PROJECT_ID, FIREBASE_STORAGE_BUCKET)."
    )]
    LocalUnavailable,
    #[error("storage request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("storage service returned HTTP {status}: {body}")]
    Remote { status: u16, body: String },
    #[error("unexpected storage response: {0}")]
    InvalidResponse(String),
    #[error("refusing to store outside the uploads directory: {0}")]
    InvalidPath(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("no storage backend accepted the upload")]
    Exhausted,
}

/// One place an uploaded file can be written to
#[async_trait]
pub trait StorageBackend: Send + Sync {
    fn kind(&self) -> StorageKind;

    /// Whether `put` can succeed in this environment at all
    fn is_available(&self) -> bool {
        true
    }

    /// Store `bytes` as `images/{category}/{file_name}` (or the backend's
    /// equivalent) and return a public URL
    async fn put(
        &self,
        bytes: &[u8],
        content_type: &str,
        category: &str,
        file_name: &str,
    ) -> Result<String, StorageError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
pub struct StoredObject {
    pub url: String,
    pub storage: StorageKind,
}

/// Configured backends in priority order
pub struct StorageChain {
    backends: Vec<Box<dyn StorageBackend>>,
}

impl fmt::Debug for StorageChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageChain")
            .field("backends", &self.kinds())
            .finish()
    }
}

impl StorageChain {
    pub fn new(backends: Vec<Box<dyn StorageBackend>>) -> Self {
        Self { backends }
    }

    /// Build the chain from configuration. Local storage is always the last
    /// link; it refuses writes itself when running serverless.
    pub fn from_config(config: &StorageConfig) -> Self {
        let mut backends: Vec<Box<dyn StorageBackend>> = Vec::new();
        if let Some(blob) = &config.vercel_blob {
            backends.push(Box::new(VercelBlobStorage::new(blob.clone())));
        }
        if let Some(firebase) = &config.firebase {
            backends.push(Box::new(FirebaseStorage::new(firebase.clone())));
        }
        backends.push(Box::new(LocalStorage::new(
            config.uploads_dir.clone(),
            config.serverless,
        )));
        Self::new(backends)
    }

    /// Backends that can accept uploads, in priority order
    pub fn kinds(&self) -> Vec<StorageKind> {
        self.available().map(|b| b.kind()).collect()
    }

    /// The backend a new upload would try first
    pub fn primary(&self) -> Option<StorageKind> {
        self.available().next().map(|b| b.kind())
    }

    fn available(&self) -> impl Iterator<Item = &dyn StorageBackend> {
        self.backends
            .iter()
            .map(|b| b.as_ref())
            .filter(|b| b.is_available())
    }

    /// Try each backend once, in order. Failures are logged and the next
    /// backend is tried; the last failure is returned when all fail.
    pub async fn put(
        &self,
        bytes: &[u8],
        content_type: &str,
        category: &str,
        file_name: &str,
    ) -> Result<StoredObject, StorageError> {
        let mut last_error = None;

        for backend in &self.backends {
            let kind = backend.kind();
            match backend.put(bytes, content_type, category, file_name).await {
                Ok(url) => {
                    tracing::info!(storage = %kind, file_name, category, "Stored upload");
                    return Ok(StoredObject { url, storage: kind });
                }
                Err(e) => {
                    tracing::warn!(storage = %kind, error = %e, "Upload backend failed, trying next");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(StorageError::Exhausted))
    }
}

/// Object path shared by the cloud backends
pub(crate) fn object_path(category: &str, file_name: &str) -> String {
    format!("images/{category}/{file_name}")
}

/// Map a non-success HTTP response into [`StorageError::Remote`]
pub(crate) async fn remote_error(response: reqwest::Response) -> StorageError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    StorageError::Remote { status, body }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;

    struct FakeBackend {
        kind: StorageKind,
        fail: bool,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl StorageBackend for FakeBackend {
        fn kind(&self) -> StorageKind {
            self.kind
        }

        async fn put(
            &self,
            _bytes: &[u8],
            _content_type: &str,
            category: &str,
            file_name: &str,
        ) -> Result<String, StorageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(StorageError::InvalidResponse("boom".into()))
            } else {
                Ok(format!("https://{}/{category}/{file_name}", self.kind))
            }
        }
    }

    fn fake(kind: StorageKind, fail: bool) -> (Box<dyn StorageBackend>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Box::new(FakeBackend {
                kind,
                fail,
                calls: calls.clone(),
            }),
            calls,
        )
    }

    #[tokio::test]
    async fn first_successful_backend_wins() {
        let (blob, blob_calls) = fake(StorageKind::VercelBlob, false);
        let (local, local_calls) = fake(StorageKind::Local, false);
        let chain = StorageChain::new(vec![blob, local]);

        let stored = chain.put(b"x", "image/png", "a", "f.png").await.unwrap();
        assert_eq!(stored.storage, StorageKind::VercelBlob);
        assert_eq!(blob_calls.load(Ordering::SeqCst), 1);
        assert_eq!(local_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failures_fall_through_once_each() {
        let (blob, blob_calls) = fake(StorageKind::VercelBlob, true);
        let (firebase, firebase_calls) = fake(StorageKind::Firebase, true);
        let (local, _) = fake(StorageKind::Local, false);
        let chain = StorageChain::new(vec![blob, firebase, local]);

        let stored = chain.put(b"x", "image/png", "a", "f.png").await.unwrap();
        assert_eq!(stored.storage, StorageKind::Local);
        assert_eq!(stored.url, "https://local/a/f.png");
        assert_eq!(blob_calls.load(Ordering::SeqCst), 1);
        assert_eq!(firebase_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn all_failing_returns_last_error() {
        let (blob, _) = fake(StorageKind::VercelBlob, true);
        let chain = StorageChain::new(vec![blob]);
        assert!(matches!(
            chain.put(b"x", "image/png", "a", "f.png").await,
            Err(StorageError::InvalidResponse(_))
        ));
        assert!(matches!(
            StorageChain::new(vec![]).put(b"x", "image/png", "a", "f.png").await,
            Err(StorageError::Exhausted)
        ));
    }

    #[test]
    fn storage_tags_serialize_kebab_case() {
        assert_eq!(
            serde_json::to_value(StorageKind::VercelBlob).unwrap(),
            serde_json::json!("vercel-blob")
        );
        assert_eq!(StorageKind::Firebase.to_string(), "firebase");
    }

    #[test]
    fn chain_from_config_orders_backends() {
        let config = StorageConfig {
            vercel_blob: None,
            firebase: Some(crate::services::config::FirebaseConfig {
                api_key: "k".to_string().into(),
                project_id: "p".into(),
                bucket: "b".into(),
                api_url: "http://localhost".into(),
            }),
            uploads_dir: std::env::temp_dir(),
            serverless: false,
        };
        let chain = StorageChain::from_config(&config);
        assert_eq!(chain.kinds(), vec![StorageKind::Firebase, StorageKind::Local]);
        assert_eq!(chain.primary(), Some(StorageKind::Firebase));
    }

    #[test]
    fn serverless_chain_does_not_report_local_storage() {
        let config = StorageConfig {
            vercel_blob: None,
            firebase: None,
            uploads_dir: std::env::temp_dir(),
            serverless: true,
        };
        let chain = StorageChain::from_config(&config);
        assert!(chain.kinds().is_empty());
        assert_eq!(chain.primary(), None);
    }
}
