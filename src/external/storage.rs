use async_trait::async_trait;

use super::{error_body, SupabaseClient};
use crate::services::SessionContext;
use crate::storage::{validate_key, Bucket, ObjectStore, StorageError};

/// Supabase Storage 对象存储
#[derive(Clone)]
pub struct SupabaseStorage {
    client: SupabaseClient,
    session: SessionContext,
}

impl SupabaseStorage {
    pub fn new(client: SupabaseClient, session: SessionContext) -> Self {
        Self { client, session }
    }
}

#[async_trait]
impl ObjectStore for SupabaseStorage {
    fn backend_name(&self) -> &'static str {
        "supabase"
    }

    async fn put(
        &self,
        bucket: Bucket,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        validate_key(key)?;

        let url = self.client.storage_url(&format!(
            "object/{}/{}",
            bucket,
            urlencoding::encode(key)
        ));
        let token = self.session.access_token();
        let request = self
            .client
            .authorize(self.client.http().post(url), token.as_deref())
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .body(bytes);

        let response = request.send().await?;
        if !response.status().is_success() {
            let (status, message) = error_body(response).await;
            return Err(StorageError::Http { status, message });
        }
        Ok(())
    }

    fn public_url(&self, bucket: Bucket, key: &str) -> String {
        self.client.storage_url(&format!(
            "object/public/{}/{}",
            bucket,
            urlencoding::encode(key)
        ))
    }
}
