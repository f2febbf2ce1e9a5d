use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use super::{error_body, SupabaseClient};
use crate::database::query_builder::{validate_predicates, Predicate, Row, RowQuery, SortOrder};
use crate::database::{GatewayError, RowStore};
use crate::models::Relation;
use crate::services::SessionContext;

/// PostgREST 行存储
///
/// Requests carry the calling user's token so row-level security applies.
#[derive(Clone)]
pub struct SupabaseRowStore {
    client: SupabaseClient,
    session: SessionContext,
}

impl SupabaseRowStore {
    pub fn new(client: SupabaseClient, session: SessionContext) -> Self {
        Self { client, session }
    }

    fn request(&self, method: Method, relation: Relation) -> reqwest::RequestBuilder {
        let token = self.session.access_token();
        let request = self
            .client
            .http()
            .request(method, self.client.rest_url(relation.table()));
        self.client.authorize(request, token.as_deref())
    }

    async fn send_for_rows(
        &self,
        relation: Relation,
        request: reqwest::RequestBuilder,
    ) -> Result<Vec<Value>, GatewayError> {
        let response = request.send().await?;
        if !response.status().is_success() {
            let (status, message) = error_body(response).await;
            tracing::error!("PostgREST {} returned {}: {}", relation, status, message);
            return Err(GatewayError::Http { status, message });
        }
        Ok(response.json::<Vec<Value>>().await?)
    }
}

/// PostgREST 过滤参数
pub fn filter_params(predicates: &[Predicate]) -> Result<Vec<(String, String)>, GatewayError> {
    predicates
        .iter()
        .map(|predicate| {
            let param = match predicate {
                Predicate::Eq { column, value } => match value {
                    Value::Null => (column.clone(), "is.null".to_string()),
                    Value::String(s) => (column.clone(), format!("eq.{}", s)),
                    Value::Bool(b) => (column.clone(), format!("eq.{}", b)),
                    Value::Number(n) => (column.clone(), format!("eq.{}", n)),
                    _ => return Err(GatewayError::InvalidValue(column.clone())),
                },
                Predicate::Contains { column, needle } => {
                    (column.clone(), format!("ilike.*{}*", escape_like(needle)))
                }
                Predicate::StartsWith { column, prefix } => {
                    (column.clone(), format!("ilike.{}*", escape_like(prefix)))
                }
            };
            Ok(param)
        })
        .collect()
}

/// Full query string for a select: filters, `order=`, `limit`/`offset`.
pub fn query_params(query: &RowQuery) -> Result<Vec<(String, String)>, GatewayError> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    params.extend(filter_params(&query.predicates)?);

    if !query.order.is_empty() {
        let order = query
            .order
            .iter()
            .map(|(column, order)| match order {
                SortOrder::Asc => format!("{}.asc", column),
                SortOrder::Desc => format!("{}.desc", column),
            })
            .collect::<Vec<_>>()
            .join(",");
        params.push(("order".to_string(), order));
    }
    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    if let Some(offset) = query.offset {
        params.push(("offset".to_string(), offset.to_string()));
    }
    Ok(params)
}

/// LIKE wildcards are escaped; `*` is PostgREST's own wildcard and is dropped.
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '%' | '_' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '*' => {}
            _ => out.push(c),
        }
    }
    out
}

/// Total from a `Content-Range` header such as `0-24/3573` or `*/0`.
pub fn parse_content_range(header: &str) -> Option<u64> {
    header.rsplit('/').next()?.trim().parse().ok()
}

#[async_trait]
impl RowStore for SupabaseRowStore {
    fn backend_name(&self) -> &'static str {
        "supabase"
    }

    async fn insert(&self, relation: Relation, row: Row) -> Result<Vec<Value>, GatewayError> {
        let request = self
            .request(Method::POST, relation)
            .header("Prefer", "return=representation")
            .json(&row);
        self.send_for_rows(relation, request).await
    }

    async fn update(
        &self,
        relation: Relation,
        predicates: &[Predicate],
        patch: Row,
    ) -> Result<u64, GatewayError> {
        if predicates.is_empty() {
            return Err(GatewayError::UnfilteredWrite(relation));
        }
        validate_predicates(relation, predicates)?;
        if patch.is_empty() {
            return self.count(relation, predicates).await;
        }

        let request = self
            .request(Method::PATCH, relation)
            .query(&filter_params(predicates)?)
            .header("Prefer", "return=representation")
            .json(&patch);
        Ok(self.send_for_rows(relation, request).await?.len() as u64)
    }

    async fn delete(&self, relation: Relation, predicates: &[Predicate]) -> Result<u64, GatewayError> {
        if predicates.is_empty() {
            return Err(GatewayError::UnfilteredWrite(relation));
        }
        validate_predicates(relation, predicates)?;

        let request = self
            .request(Method::DELETE, relation)
            .query(&filter_params(predicates)?)
            .header("Prefer", "return=representation");
        Ok(self.send_for_rows(relation, request).await?.len() as u64)
    }

    async fn select(&self, relation: Relation, query: &RowQuery) -> Result<Vec<Value>, GatewayError> {
        query.validate(relation)?;
        let request = self.request(Method::GET, relation).query(&query_params(query)?);
        self.send_for_rows(relation, request).await
    }

    async fn count(&self, relation: Relation, predicates: &[Predicate]) -> Result<u64, GatewayError> {
        validate_predicates(relation, predicates)?;

        let mut params = vec![("select".to_string(), "id".to_string())];
        params.extend(filter_params(predicates)?);

        let response = self
            .request(Method::HEAD, relation)
            .query(&params)
            .header("Prefer", "count=exact")
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, message) = error_body(response).await;
            return Err(GatewayError::Http { status, message });
        }

        response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range)
            .ok_or_else(|| GatewayError::Decode("missing Content-Range total".to_string()))
    }
}
