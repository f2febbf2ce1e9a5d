use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{validate_key, Bucket, ObjectStore, StorageError};

/// 本地文件存储（由 HTTP 层在 /media 下提供）
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn object_path(&self, bucket: Bucket, key: &str) -> PathBuf {
        self.root.join(bucket.as_str()).join(key)
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    fn backend_name(&self) -> &'static str {
        "local"
    }

    async fn put(
        &self,
        bucket: Bucket,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        validate_key(key)?;

        let dir = self.root.join(bucket.as_str());
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(key);
        tokio::fs::write(&path, &bytes).await?;

        tracing::debug!(
            "Stored {} bytes ({}) at {}",
            bytes.len(),
            content_type,
            path.display()
        );
        Ok(())
    }

    fn public_url(&self, bucket: Bucket, key: &str) -> String {
        format!("{}/media/{}/{}", self.public_base_url, bucket, key)
    }
}
