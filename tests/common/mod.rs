// 集成测试共用的装置：内存数据库 + 临时目录存储 + 固定时长探测器

#![allow(dead_code)]

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

use jumpflix_backend::database::Database;
use jumpflix_backend::models::MediaFile;
use jumpflix_backend::services::{
    AuthoringWorkflow, CatalogService, DurationDecodeError, DurationProbe, MediaUploader,
};
use jumpflix_backend::storage::{Bucket, LocalObjectStore, ObjectStore, StorageError};

pub const BASE_URL: &str = "http://localhost:3000";

/// Reports the same duration for every file, except `corrupt*` files (no
/// readable container) and `blank*` files (NaN duration).
pub struct FixedProbe(pub f64);

#[async_trait]
impl DurationProbe for FixedProbe {
    async fn probe_seconds(&self, file: &MediaFile) -> Result<f64, DurationDecodeError> {
        if file.file_name.starts_with("corrupt") {
            return Err(DurationDecodeError::ProbeFailed {
                exit_code: Some(1),
                stderr: "moov atom not found".to_string(),
            });
        }
        if file.file_name.starts_with("blank") {
            return Ok(f64::NAN);
        }
        Ok(self.0)
    }
}

/// Local store that rejects everything sent to one bucket.
pub struct FailingStore {
    pub inner: LocalObjectStore,
    pub failing: Bucket,
}

#[async_trait]
impl ObjectStore for FailingStore {
    fn backend_name(&self) -> &'static str {
        "failing"
    }

    async fn put(
        &self,
        bucket: Bucket,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        if bucket == self.failing {
            return Err(StorageError::Http {
                status: 500,
                message: "storage unavailable".to_string(),
            });
        }
        self.inner.put(bucket, key, bytes, content_type).await
    }

    fn public_url(&self, bucket: Bucket, key: &str) -> String {
        self.inner.public_url(bucket, key)
    }
}

pub struct Harness {
    pub database: Database,
    pub catalog: CatalogService,
    pub uploader: MediaUploader,
    pub probe: Arc<dyn DurationProbe>,
    pub storage: TempDir,
}

impl Harness {
    pub async fn new() -> Self {
        let storage = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(storage.path(), BASE_URL);
        Self::with_store(storage, Arc::new(store)).await
    }

    /// Uploads to `bucket` fail with HTTP 500.
    pub async fn failing_on(bucket: Bucket) -> Self {
        let storage = tempfile::tempdir().unwrap();
        let store = FailingStore {
            inner: LocalObjectStore::new(storage.path(), BASE_URL),
            failing: bucket,
        };
        Self::with_store(storage, Arc::new(store)).await
    }

    async fn with_store(storage: TempDir, store: Arc<dyn ObjectStore>) -> Self {
        let database = Database::in_memory().await.unwrap();
        let catalog = CatalogService::new(Arc::new(database.row_store()));

        Self {
            database,
            catalog,
            uploader: MediaUploader::new(store),
            probe: Arc::new(FixedProbe(125.0)),
            storage,
        }
    }

    pub fn workflow(&self) -> AuthoringWorkflow {
        AuthoringWorkflow::new(self.catalog.clone(), self.uploader.clone(), self.probe.clone())
    }

    /// Number of files written to the storage directory.
    pub fn stored_files(&self) -> usize {
        fn walk(dir: &Path) -> usize {
            std::fs::read_dir(dir)
                .map(|entries| {
                    entries
                        .flatten()
                        .map(|entry| {
                            let path = entry.path();
                            if path.is_dir() {
                                walk(&path)
                            } else {
                                1
                            }
                        })
                        .sum()
                })
                .unwrap_or(0)
        }
        walk(self.storage.path())
    }
}

pub fn png(name: &str) -> MediaFile {
    let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(2, 2, image::Rgb([0, 128, 255])));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    MediaFile::new(name, buffer)
}

pub fn mp4(name: &str) -> MediaFile {
    MediaFile::new(name, b"\x00\x00\x00\x18ftypmp42fake video payload".to_vec())
}
