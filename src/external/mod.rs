// Supabase 远程网关
//
// 行存储（PostgREST）、对象存储（Storage）和认证（GoTrue）共用一个
// 带超时的 reqwest 客户端

pub mod auth;
pub mod postgrest;
pub mod storage;

use reqwest::{Client, RequestBuilder};
use std::sync::Arc;
use std::time::Duration;

use crate::services::{AuthService, CatalogService, Gateways, MediaUploader, SessionContext};

pub use auth::SupabaseAuth;
pub use postgrest::SupabaseRowStore;
pub use storage::SupabaseStorage;

/// Supabase 项目配置
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    pub timeout: Duration,
}

/// 共享 HTTP 客户端
#[derive(Clone)]
pub struct SupabaseClient {
    http: Client,
    config: SupabaseConfig,
}

impl SupabaseClient {
    pub fn new(config: SupabaseConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(config.timeout).build()?;
        let config = SupabaseConfig {
            url: config.url.trim_end_matches('/').to_string(),
            ..config
        };
        Ok(Self { http, config })
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn base_url(&self) -> &str {
        &self.config.url
    }

    pub fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.config.url, table)
    }

    pub fn storage_url(&self, path: &str) -> String {
        format!("{}/storage/v1/{}", self.config.url, path)
    }

    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.config.url, path)
    }

    /// Adds the project key and a bearer token (the user's when signed in,
    /// the anon key otherwise).
    pub fn authorize(&self, request: RequestBuilder, access_token: Option<&str>) -> RequestBuilder {
        let bearer = access_token.unwrap_or(&self.config.anon_key);
        request
            .header("apikey", &self.config.anon_key)
            .bearer_auth(bearer)
    }
}

/// 远程后端：每个调用者的会话各自绑定一组网关
#[derive(Clone)]
pub struct SupabaseGateways {
    client: SupabaseClient,
}

impl SupabaseGateways {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

impl Gateways for SupabaseGateways {
    fn backend_name(&self) -> &'static str {
        "supabase"
    }

    fn catalog(&self, session: &SessionContext) -> CatalogService {
        CatalogService::new(Arc::new(SupabaseRowStore::new(
            self.client.clone(),
            session.clone(),
        )))
    }

    fn uploader(&self, session: &SessionContext) -> MediaUploader {
        MediaUploader::new(Arc::new(SupabaseStorage::new(
            self.client.clone(),
            session.clone(),
        )))
    }

    fn auth(&self, session: &SessionContext) -> Option<AuthService> {
        Some(AuthService::new(
            Arc::new(SupabaseAuth::new(self.client.clone())),
            session.clone(),
        ))
    }
}

/// Reads a failed response body for error reporting.
pub(crate) async fn error_body(response: reqwest::Response) -> (u16, String) {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    (status, extract_message(&body))
}

/// Supabase services report errors under different keys.
pub(crate) fn extract_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["msg", "message", "error_description", "error"]
                .iter()
                .find_map(|key| value.get(*key).and_then(|v| v.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SupabaseClient {
        SupabaseClient::new(SupabaseConfig {
            url: "https://demo.supabase.co/".to_string(),
            anon_key: "anon".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_urls() {
        let client = client();
        assert_eq!(client.rest_url("movies"), "https://demo.supabase.co/rest/v1/movies");
        assert_eq!(
            client.storage_url("object/posters/a.png"),
            "https://demo.supabase.co/storage/v1/object/posters/a.png"
        );
        assert_eq!(client.auth_url("signup"), "https://demo.supabase.co/auth/v1/signup");
    }

    #[test]
    fn test_extract_message() {
        assert_eq!(extract_message(r#"{"msg":"Invalid login credentials"}"#), "Invalid login credentials");
        assert_eq!(extract_message(r#"{"message":"duplicate key"}"#), "duplicate key");
        assert_eq!(extract_message("gateway down"), "gateway down");
    }
}
