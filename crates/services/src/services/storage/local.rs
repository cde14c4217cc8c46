use std::path::PathBuf;

use async_trait::async_trait;

use super::{StorageBackend, StorageError, StorageKind};

/// URL prefix the server mounts the uploads directory under
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

/// Files written under the uploads directory and served by the app itself
pub struct LocalStorage {
    root: PathBuf,
    serverless: bool,
}

impl LocalStorage {
    pub fn new(root: PathBuf, serverless: bool) -> Self {
        Self { root, serverless }
    }
}

#[async_trait]
impl StorageBackend for LocalStorage {
    fn kind(&self) -> StorageKind {
        StorageKind::Local
    }

    fn is_available(&self) -> bool {
        !self.serverless
    }

    async fn put(
        &self,
        bytes: &[u8],
        _content_type: &str,
        category: &str,
        file_name: &str,
    ) -> Result<String, StorageError> {
        if self.serverless {
            return Err(StorageError::LocalUnavailable);
        }

        for part in [category, file_name] {
            if part.is_empty() || part.contains(['/', '\\']) || part == ".." || part == "." {
                return Err(StorageError::InvalidPath(part.to_string()));
            }
        }

        let dir = self.root.join(category);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(file_name), bytes).await?;

        Ok(format!("{UPLOADS_URL_PREFIX}/{category}/{file_name}"))
    }
}
