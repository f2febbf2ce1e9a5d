use image::ImageFormat;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use super::error::UploadError;
use crate::models::MediaFile;
use crate::storage::{Bucket, ObjectStore};

/// 媒体上传助手
///
/// One attempt per call. `None` input means the field was left empty on
/// purpose and yields `Ok(None)`; every failure is logged and returned.
#[derive(Clone)]
pub struct MediaUploader {
    store: Arc<dyn ObjectStore>,
}

impl MediaUploader {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    pub async fn upload(
        &self,
        bucket: Bucket,
        file: Option<&MediaFile>,
    ) -> Result<Option<String>, UploadError> {
        let Some(file) = file else {
            return Ok(None);
        };

        let (ext, content_type) = classify(bucket, file).map_err(|e| {
            tracing::warn!("Rejected {} for {}: {}", file.file_name, bucket, e);
            e
        })?;

        let key = object_key(&file.bytes, chrono::Utc::now().timestamp_millis(), ext);

        self.store
            .put(bucket, &key, file.bytes.clone(), content_type)
            .await
            .map_err(|source| {
                tracing::error!(
                    "Upload of {} to {} ({}) failed: {}",
                    file.file_name,
                    bucket,
                    self.store.backend_name(),
                    source
                );
                UploadError::Rejected { bucket, source }
            })?;

        let url = self.store.public_url(bucket, &key);
        tracing::info!("Uploaded {} ({} bytes) -> {}", file.file_name, file.len(), url);
        Ok(Some(url))
    }
}

/// `{unix_millis}_{sha256 prefix}.{ext}`
pub fn object_key(bytes: &[u8], unix_millis: i64, ext: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let hash: String = format!("{:x}", hasher.finalize()).chars().take(16).collect();
    format!("{}_{}.{}", unix_millis, hash, ext)
}

/// 根据存储桶确定扩展名和 Content-Type
fn classify(bucket: Bucket, file: &MediaFile) -> Result<(&'static str, &'static str), UploadError> {
    let unsupported = |reason: String| UploadError::UnsupportedMedia { bucket, reason };

    if file.is_empty() {
        return Err(unsupported("file is empty".to_string()));
    }

    if bucket.holds_images() {
        let format = image::guess_format(&file.bytes)
            .map_err(|e| unsupported(format!("not an image: {}", e)))?;
        return match format {
            ImageFormat::Png => Ok(("png", "image/png")),
            ImageFormat::Jpeg => Ok(("jpg", "image/jpeg")),
            ImageFormat::Gif => Ok(("gif", "image/gif")),
            ImageFormat::WebP => Ok(("webp", "image/webp")),
            other => Err(unsupported(format!("image format {:?}", other))),
        };
    }

    match file.extension().as_deref() {
        Some("mp4") => Ok(("mp4", "video/mp4")),
        Some("m4v") => Ok(("m4v", "video/x-m4v")),
        Some("webm") => Ok(("webm", "video/webm")),
        Some("mkv") => Ok(("mkv", "video/x-matroska")),
        Some("mov") => Ok(("mov", "video/quicktime")),
        Some("avi") => Ok(("avi", "video/x-msvideo")),
        Some(other) => Err(unsupported(format!("video extension .{}", other))),
        None => Err(unsupported("video has no extension".to_string())),
    }
}
