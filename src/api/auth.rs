use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;

use super::error::{ApiError, ApiResult};
use super::response::{success, success_message};
use super::AppState;
use crate::services::{AuthService, SessionContext};

/// `Authorization: Bearer <token>` 请求头（可缺省）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BearerToken(pub Option<String>);

impl BearerToken {
    /// A fresh context holding only this caller's token.
    pub fn context(&self) -> SessionContext {
        SessionContext::with_bearer(self.0.clone())
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(bearer_token(&parts.headers)))
    }
}

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RecoverRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordRequest {
    pub password: String,
}

fn auth_service(state: &AppState, token: &BearerToken) -> ApiResult<AuthService> {
    state
        .gateways
        .auth(&token.context())
        .ok_or_else(|| ApiError::Unavailable("Authentication is not configured".to_string()))
}

/// 注册
pub async fn sign_up(
    State(state): State<AppState>,
    token: BearerToken,
    Json(payload): Json<CredentialsRequest>,
) -> ApiResult<impl IntoResponse> {
    let session = auth_service(&state, &token)?
        .sign_up(&payload.email, &payload.password)
        .await?;

    // 需要邮件确认时后端不返回会话
    let confirmation_required = session.is_none();
    Ok(success(json!({
        "session": session,
        "confirmation_required": confirmation_required,
    })))
}

/// 登录：会话只返回给调用者，服务端不保存
pub async fn sign_in(
    State(state): State<AppState>,
    token: BearerToken,
    Json(payload): Json<CredentialsRequest>,
) -> ApiResult<impl IntoResponse> {
    let session = auth_service(&state, &token)?
        .sign_in(&payload.email, &payload.password)
        .await?;
    Ok(success(session))
}

pub async fn sign_out(
    State(state): State<AppState>,
    token: BearerToken,
) -> ApiResult<impl IntoResponse> {
    auth_service(&state, &token)?.sign_out().await?;
    Ok(success_message("Signed out"))
}

pub async fn recover(
    State(state): State<AppState>,
    token: BearerToken,
    Json(payload): Json<RecoverRequest>,
) -> ApiResult<impl IntoResponse> {
    auth_service(&state, &token)?.recover(&payload.email).await?;
    Ok(success_message("Recovery email sent"))
}

pub async fn update_password(
    State(state): State<AppState>,
    token: BearerToken,
    Json(payload): Json<PasswordRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = auth_service(&state, &token)?
        .update_password(&payload.password)
        .await?;
    Ok(success(user))
}

/// 当前会话（向后端重新校验调用者的令牌）
pub async fn current_session(
    State(state): State<AppState>,
    token: BearerToken,
) -> ApiResult<impl IntoResponse> {
    let user = auth_service(&state, &token)?.current_user().await?;
    Ok(success(json!({ "user": user })))
}
