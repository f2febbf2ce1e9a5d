use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use super::error::{ApiError, ApiResult};
use super::response::{success, ApiResponse};
use super::{AppState, BearerToken};
use crate::models::ContentType;
use crate::services::BrowseQuery;

#[derive(Debug, Deserialize)]
pub struct BrowseParams {
    pub letter: Option<String>,
    pub page: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

/// 首字母参数：单个字母，统一大写
fn parse_letter(raw: Option<String>) -> ApiResult<Option<char>> {
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return Ok(None);
    };
    let mut chars = raw.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_alphanumeric() => Ok(c.to_uppercase().next()),
        _ => Err(ApiError::BadRequest(format!("Invalid letter filter: {}", raw))),
    }
}

/// 内容类型注册表
pub async fn list_types() -> impl IntoResponse {
    let descriptors: Vec<_> = ContentType::ALL.iter().map(|k| k.descriptor()).collect();
    success(descriptors)
}

/// 按类型浏览（首字母 + 分页）
pub async fn browse(
    Path(kind): Path<String>,
    Query(params): Query<BrowseParams>,
    State(state): State<AppState>,
    token: BearerToken,
) -> ApiResult<impl IntoResponse> {
    let kind: ContentType = kind.parse()?;
    let query = BrowseQuery {
        letter: parse_letter(params.letter)?,
        page: params.page.unwrap_or(1),
        dorama: kind.dorama_flag(),
    };

    let catalog = state.gateways.catalog(&token.context());
    let page = catalog.browse(kind.relation(), &query).await?;
    Ok(success(page))
}

pub async fn search_type(
    Path(kind): Path<String>,
    Query(params): Query<SearchParams>,
    State(state): State<AppState>,
    token: BearerToken,
) -> ApiResult<impl IntoResponse> {
    let kind: ContentType = kind.parse()?;
    let catalog = state.gateways.catalog(&token.context());
    let titles = catalog.search_titles(kind, &params.q).await?;
    Ok(success(titles))
}

/// 全局搜索
pub async fn search_all(
    Query(params): Query<SearchParams>,
    State(state): State<AppState>,
    token: BearerToken,
) -> ApiResult<impl IntoResponse> {
    if params.q.trim().is_empty() {
        return Err(ApiError::Validation("Search query cannot be empty".to_string()));
    }
    let catalog = state.gateways.catalog(&token.context());
    let titles = catalog.search_all(&params.q).await?;
    Ok(success(titles))
}

/// 作品详情（含季和单集）
pub async fn get_details(
    Path((kind, id)): Path<(String, i64)>,
    State(state): State<AppState>,
    token: BearerToken,
) -> ApiResult<impl IntoResponse> {
    let kind: ContentType = kind.parse()?;
    let catalog = state.gateways.catalog(&token.context());
    let details = catalog.get_content_details(id, kind).await?;
    Ok(success(details))
}

pub async fn delete_title(
    Path((kind, id)): Path<(String, i64)>,
    State(state): State<AppState>,
    token: BearerToken,
) -> ApiResult<impl IntoResponse> {
    let kind: ContentType = kind.parse()?;
    let catalog = state.gateways.catalog(&token.context());
    let report = catalog.delete_title(kind, id).await?;

    tracing::info!("Deleted {} {} ({} rows)", kind, id, report.total());
    Ok(ApiResponse::success_with_message(
        report,
        format!("Deleted {} rows", report.total()),
    ))
}
