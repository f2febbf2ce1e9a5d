use axum::{extract::State, response::IntoResponse};
use serde_json::json;

use super::error::{ApiError, ApiResult};
use super::response::success;
use super::AppState;
use crate::services::SessionContext;

/// 健康检查端点
pub async fn health_check(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let database = match state.database {
        Some(ref database) => {
            let stats = database.get_stats().await.map_err(|e| {
                tracing::error!("Health check failed: {}", e);
                ApiError::Internal("Database connection failed".to_string())
            })?;
            Some(stats)
        }
        None => None,
    };

    let auth_status = if state.gateways.auth(&SessionContext::new()).is_some() {
        "available"
    } else {
        "not_configured"
    };

    Ok(success(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "backend": state.gateways.backend_name(),
        "database": database,
        "auth": auth_status,
        "authoring_sessions": state.sessions.len().await,
    })))
}
