use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{error_body, SupabaseClient};
use crate::services::{AuthClient, AuthError, Session, User};

/// GoTrue 认证客户端
#[derive(Clone)]
pub struct SupabaseAuth {
    client: SupabaseClient,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: Option<i64>,
    expires_in: Option<i64>,
    user: User,
}

impl From<TokenResponse> for Session {
    fn from(token: TokenResponse) -> Self {
        let expires_at = token.expires_at.or_else(|| {
            token
                .expires_in
                .map(|secs| chrono::Utc::now().timestamp() + secs)
        });
        Session {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at,
            user: token.user,
        }
    }
}

impl SupabaseAuth {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, AuthError> {
        let response = request.send().await?;
        if !response.status().is_success() {
            let (status, message) = error_body(response).await;
            return Err(AuthError::Rejected { status, message });
        }
        Ok(response)
    }
}

#[async_trait]
impl AuthClient for SupabaseAuth {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>, AuthError> {
        let request = self
            .client
            .authorize(self.client.http().post(self.client.auth_url("signup")), None)
            .json(&json!({ "email": email, "password": password }));
        let body: Value = self.send(request).await?.json().await?;

        // Without auto-confirm GoTrue answers with the bare user.
        if body.get("access_token").is_none() {
            return Ok(None);
        }
        let token: TokenResponse = serde_json::from_value(body)
            .map_err(|e| AuthError::Gateway(e.into()))?;
        Ok(Some(token.into()))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let request = self
            .client
            .authorize(self.client.http().post(self.client.auth_url("token")), None)
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }));
        let token: TokenResponse = self.send(request).await?.json().await?;
        Ok(token.into())
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let request = self.client.authorize(
            self.client.http().post(self.client.auth_url("logout")),
            Some(access_token),
        );
        self.send(request).await?;
        Ok(())
    }

    async fn recover(&self, email: &str) -> Result<(), AuthError> {
        let request = self
            .client
            .authorize(self.client.http().post(self.client.auth_url("recover")), None)
            .json(&json!({ "email": email }));
        self.send(request).await?;
        Ok(())
    }

    async fn update_password(&self, access_token: &str, password: &str) -> Result<User, AuthError> {
        let request = self
            .client
            .authorize(
                self.client.http().put(self.client.auth_url("user")),
                Some(access_token),
            )
            .json(&json!({ "password": password }));
        Ok(self.send(request).await?.json().await?)
    }

    async fn get_user(&self, access_token: &str) -> Result<User, AuthError> {
        let request = self.client.authorize(
            self.client.http().get(self.client.auth_url("user")),
            Some(access_token),
        );
        Ok(self.send(request).await?.json().await?)
    }
}
