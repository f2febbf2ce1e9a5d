use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

use crate::database::GatewayError;
use crate::models::UnknownContentType;
use crate::services::{AuthError, CatalogError, DurationDecodeError, UploadError, WorkflowError};

/// 统一的API错误类型
#[derive(Debug)]
pub enum ApiError {
    /// 未找到资源
    NotFound(String),
    /// 验证错误
    Validation(String),
    /// 未登录或凭证无效
    Unauthorized(String),
    /// 冲突错误（状态不允许或并发操作）
    Conflict(String),
    /// 内部服务器错误
    Internal(String),
    /// 外部服务错误
    ExternalService(String),
    /// 功能未启用
    Unavailable(String),
    /// 请求参数错误
    BadRequest(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Validation(msg) => write!(f, "Validation error: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
            ApiError::ExternalService(msg) => write!(f, "External service error: {}", msg),
            ApiError::Unavailable(msg) => write!(f, "Unavailable: {}", msg),
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

/// 从anyhow::Error转换
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<UnknownContentType> for ApiError {
    fn from(err: UnknownContentType) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

fn from_gateway(err: GatewayError, message: String) -> ApiError {
    match err {
        GatewayError::UnknownColumn { .. }
        | GatewayError::InvalidValue(_)
        | GatewayError::UnfilteredWrite(_) => ApiError::Internal(message),
        _ => ApiError::ExternalService(message),
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        let message = err.to_string();
        match err {
            CatalogError::NotFound { .. } => ApiError::NotFound(message),
            CatalogError::Validation(_) => ApiError::Validation(message),
            CatalogError::UnknownContentType(_) => ApiError::BadRequest(message),
            CatalogError::Upload(UploadError::UnsupportedMedia { .. }) => ApiError::Validation(message),
            CatalogError::Upload(UploadError::Rejected { .. }) => ApiError::ExternalService(message),
            CatalogError::DurationDecode(DurationDecodeError::ProbeUnavailable(_)) => {
                ApiError::Internal(message)
            }
            CatalogError::DurationDecode(_) => ApiError::Validation(message),
            CatalogError::Insert { source, .. }
            | CatalogError::Update { source, .. }
            | CatalogError::Delete { source, .. }
            | CatalogError::Query { source, .. } => from_gateway(source, message),
            CatalogError::InsertEmpty(_) => ApiError::ExternalService(message),
            CatalogError::Decode { .. } => ApiError::Internal(message),
        }
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::Catalog(inner) => inner.into(),
            WorkflowError::InvalidTransition { .. } | WorkflowError::SeasonsIncomplete { .. } => {
                ApiError::Conflict(err.to_string())
            }
            WorkflowError::FormMismatch { .. }
            | WorkflowError::MissingFile(_)
            | WorkflowError::SeasonOutOfRange { .. }
            | WorkflowError::EpisodeOutOfRange { .. }
            | WorkflowError::Validation(_) => ApiError::Validation(err.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let message = err.to_string();
        match err {
            AuthError::InvalidEmail(_) | AuthError::WeakPassword(_) => ApiError::Validation(message),
            AuthError::NotSignedIn => ApiError::Unauthorized(message),
            AuthError::Rejected { status, .. } if (400..500).contains(&status) => {
                ApiError::Unauthorized(message)
            }
            AuthError::Rejected { .. } => ApiError::ExternalService(message),
            AuthError::Unavailable(_) => ApiError::Unavailable(message),
            AuthError::Gateway(source) => from_gateway(source, message),
        }
    }
}

/// 实现IntoResponse，将错误转换为HTTP响应
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::NotFound(ref msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::Validation(ref msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg.clone())
            }
            ApiError::Unauthorized(ref msg) => {
                (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone())
            }
            ApiError::Conflict(ref msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ApiError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal server error occurred".to_string(),
                )
            }
            ApiError::ExternalService(ref msg) => {
                tracing::error!("External service error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "external_service_error",
                    msg.clone(),
                )
            }
            ApiError::Unavailable(ref msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "unavailable", msg.clone())
            }
            ApiError::BadRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", msg.clone())
            }
        };

        let body = Json(json!({
            "success": false,
            "error": {
                "type": error_type,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result类型别名
pub type ApiResult<T> = Result<T, ApiError>;
