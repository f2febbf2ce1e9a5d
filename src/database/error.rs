use thiserror::Error;

use crate::models::Relation;

/// 行存储网关错误
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Gateway returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Gateway request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Failed to decode gateway response: {0}")]
    Decode(String),

    #[error("Unknown column '{column}' on {relation}")]
    UnknownColumn { relation: Relation, column: String },

    #[error("Unsupported value for column '{0}'")]
    InvalidValue(String),

    #[error("Refusing to write {0} without a filter")]
    UnfilteredWrite(Relation),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl GatewayError {
    /// Timeouts, transport failures, throttling and 5xx may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Timeout | GatewayError::Transport(_) => true,
            GatewayError::Http { status, .. } => *status == 429 || *status >= 500,
            GatewayError::Database(sqlx::Error::PoolTimedOut) => true,
            _ => false,
        }
    }
}

// 超时、状态码、解码失败分别归类
impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout
        } else if err.is_status() {
            match err.status() {
                Some(status) => GatewayError::Http {
                    status: status.as_u16(),
                    message: err.to_string(),
                },
                None => GatewayError::Transport(err.to_string()),
            }
        } else if err.is_decode() {
            GatewayError::Decode(err.to_string())
        } else {
            GatewayError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Decode(err.to_string())
    }
}
