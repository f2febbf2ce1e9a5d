use async_trait::async_trait;
use serde_json::Value;
use sqlx::{Pool, QueryBuilder, Sqlite};

use super::error::GatewayError;
use super::query_builder::{
    ensure_column, json_projection, push_tail, push_value, push_where, validate_predicates,
    Predicate, Row, RowQuery,
};
use crate::models::Relation;

/// 行存储接口（远程 PostgREST 或本地 SQLite）
///
/// Rows travel as JSON objects keyed by column name so the catalog layer can
/// stay agnostic of the backend.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// 后端名称（用于日志和健康检查）
    fn backend_name(&self) -> &'static str;

    /// Inserts one row and returns the stored representation(s).
    async fn insert(&self, relation: Relation, row: Row) -> Result<Vec<Value>, GatewayError>;

    /// Returns the number of rows touched. Refuses to run without predicates.
    async fn update(
        &self,
        relation: Relation,
        predicates: &[Predicate],
        patch: Row,
    ) -> Result<u64, GatewayError>;

    async fn delete(&self, relation: Relation, predicates: &[Predicate]) -> Result<u64, GatewayError>;

    async fn select(&self, relation: Relation, query: &RowQuery) -> Result<Vec<Value>, GatewayError>;

    async fn count(&self, relation: Relation, predicates: &[Predicate]) -> Result<u64, GatewayError>;
}

/// SQLite 行存储实现
#[derive(Clone)]
pub struct SqliteRowStore {
    pool: Pool<Sqlite>,
}

impl SqliteRowStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    async fn select_by_id(&self, relation: Relation, id: i64) -> Result<Vec<Value>, GatewayError> {
        self.select(relation, &RowQuery::new().eq("id", id)).await
    }
}

#[async_trait]
impl RowStore for SqliteRowStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn insert(&self, relation: Relation, row: Row) -> Result<Vec<Value>, GatewayError> {
        let mut query: QueryBuilder<'static, Sqlite> =
            QueryBuilder::new(format!("INSERT INTO {} ", relation.table()));

        if row.is_empty() {
            query.push("DEFAULT VALUES");
        } else {
            let mut kinds = Vec::with_capacity(row.len());
            for column in row.keys() {
                kinds.push(ensure_column(relation, column)?);
            }

            query.push("(");
            query.push(row.keys().cloned().collect::<Vec<_>>().join(", "));
            query.push(") VALUES (");
            for (i, ((column, value), kind)) in row.iter().zip(kinds).enumerate() {
                if i > 0 {
                    query.push(", ");
                }
                push_value(&mut query, column, kind, value)?;
            }
            query.push(")");
        }
        query.push(" RETURNING id");

        let id: i64 = query.build_query_scalar().fetch_one(&self.pool).await?;
        tracing::debug!("Inserted row {} into {}", id, relation);

        self.select_by_id(relation, id).await
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

        // 空补丁只统计匹配行数
        if patch.is_empty() {
            return self.count(relation, predicates).await;
        }

        let mut query: QueryBuilder<'static, Sqlite> =
            QueryBuilder::new(format!("UPDATE {} SET ", relation.table()));
        for (i, (column, value)) in patch.iter().enumerate() {
            let kind = ensure_column(relation, column)?;
            if i > 0 {
                query.push(", ");
            }
            query.push(format!("{} = ", column));
            push_value(&mut query, column, kind, value)?;
        }
        push_where(&mut query, relation, predicates)?;

        let result = query.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, relation: Relation, predicates: &[Predicate]) -> Result<u64, GatewayError> {
        if predicates.is_empty() {
            return Err(GatewayError::UnfilteredWrite(relation));
        }

        let mut query: QueryBuilder<'static, Sqlite> =
            QueryBuilder::new(format!("DELETE FROM {}", relation.table()));
        push_where(&mut query, relation, predicates)?;

        let result = query.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn select(&self, relation: Relation, row_query: &RowQuery) -> Result<Vec<Value>, GatewayError> {
        row_query.validate(relation)?;

        let mut query: QueryBuilder<'static, Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM {}",
            json_projection(relation),
            relation.table()
        ));
        push_where(&mut query, relation, &row_query.predicates)?;
        push_tail(&mut query, relation, row_query)?;

        let rows: Vec<String> = query.build_query_scalar().fetch_all(&self.pool).await?;
        rows.iter()
            .map(|raw| serde_json::from_str(raw).map_err(GatewayError::from))
            .collect()
    }

    async fn count(&self, relation: Relation, predicates: &[Predicate]) -> Result<u64, GatewayError> {
        let mut query: QueryBuilder<'static, Sqlite> =
            QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", relation.table()));
        push_where(&mut query, relation, predicates)?;

        let count: i64 = query.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count.max(0) as u64)
    }
}
