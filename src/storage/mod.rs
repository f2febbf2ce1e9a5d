use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod local;

pub use local::LocalObjectStore;

/// 存储桶
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Posters,
    Thumbnails,
    Videos,
    Avatars,
}

impl Bucket {
    pub fn as_str(self) -> &'static str {
        match self {
            Bucket::Posters => "posters",
            Bucket::Thumbnails => "thumbnails",
            Bucket::Videos => "videos",
            Bucket::Avatars => "avatars",
        }
    }

    /// Buckets whose objects must decode as images.
    pub fn holds_images(self) -> bool {
        !matches!(self, Bucket::Videos)
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 对象存储错误
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Storage request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),
}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StorageError::Timeout
        } else if let Some(status) = err.status() {
            StorageError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            StorageError::Transport(err.to_string())
        }
    }
}

/// 对象存储接口
#[async_trait]
pub trait ObjectStore: Send + Sync {
    fn backend_name(&self) -> &'static str;

    /// Stores `bytes` under `bucket/key`, replacing nothing: keys are unique
    /// per upload.
    async fn put(
        &self,
        bucket: Bucket,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// Publicly reachable URL of a stored object.
    fn public_url(&self, bucket: Bucket, key: &str) -> String;
}

/// Keys are single path segments: no separators, no dot-prefixed names.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let invalid = key.is_empty()
        || key.starts_with('.')
        || key.contains(['/', '\\'])
        || key.contains("..")
        || key.chars().any(char::is_control);

    if invalid {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}
