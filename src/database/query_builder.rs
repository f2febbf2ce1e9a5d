use serde_json::Value;
use sqlx::{QueryBuilder, Sqlite};

use super::error::GatewayError;
use super::schema::{self, ColumnKind};
use crate::models::Relation;

/// 一行数据（列名 -> JSON 值）
pub type Row = serde_json::Map<String, Value>;

/// 过滤条件
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// column = value
    Eq { column: String, value: Value },
    /// Case-insensitive substring match.
    Contains { column: String, needle: String },
    /// Case-insensitive prefix match.
    StartsWith { column: String, prefix: String },
}

impl Predicate {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Eq {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn contains(column: impl Into<String>, needle: impl Into<String>) -> Self {
        Predicate::Contains {
            column: column.into(),
            needle: needle.into(),
        }
    }

    pub fn starts_with(column: impl Into<String>, prefix: impl Into<String>) -> Self {
        Predicate::StartsWith {
            column: column.into(),
            prefix: prefix.into(),
        }
    }

    pub fn column(&self) -> &str {
        match self {
            Predicate::Eq { column, .. }
            | Predicate::Contains { column, .. }
            | Predicate::StartsWith { column, .. } => column,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// 查询描述（过滤 + 排序 + 分页），与后端无关
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowQuery {
    pub predicates: Vec<Predicate>,
    pub order: Vec<(String, SortOrder)>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl RowQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Predicate::eq(column, value))
    }

    pub fn order_by(mut self, column: impl Into<String>, order: SortOrder) -> Self {
        self.order.push((column.into(), order));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Every referenced column must exist on `relation`.
    pub fn validate(&self, relation: Relation) -> Result<(), GatewayError> {
        validate_predicates(relation, &self.predicates)?;
        for (column, _) in &self.order {
            ensure_column(relation, column)?;
        }
        Ok(())
    }
}

pub fn ensure_column(relation: Relation, column: &str) -> Result<ColumnKind, GatewayError> {
    schema::column(relation, column)
        .map(|c| c.kind)
        .ok_or_else(|| GatewayError::UnknownColumn {
            relation,
            column: column.to_string(),
        })
}

pub fn validate_predicates(relation: Relation, predicates: &[Predicate]) -> Result<(), GatewayError> {
    for predicate in predicates {
        ensure_column(relation, predicate.column())?;
    }
    Ok(())
}

// ============ SQLite 语句拼接 ============

/// `json_object(...)` projection so every backend hands rows back as JSON.
pub fn json_projection(relation: Relation) -> String {
    let parts: Vec<String> = schema::columns(relation)
        .iter()
        .map(|c| match c.kind {
            ColumnKind::Bool => format!(
                "'{0}', json(CASE WHEN {0} THEN 'true' ELSE 'false' END)",
                c.name
            ),
            _ => format!("'{0}', {0}", c.name),
        })
        .collect();
    format!("json_object({})", parts.join(", "))
}

/// 按列类型绑定值
pub fn push_value(
    query: &mut QueryBuilder<'static, Sqlite>,
    column: &str,
    kind: ColumnKind,
    value: &Value,
) -> Result<(), GatewayError> {
    let invalid = || GatewayError::InvalidValue(column.to_string());

    if value.is_null() {
        query.push("NULL");
        return Ok(());
    }

    match kind {
        ColumnKind::Integer => {
            let v = match value {
                Value::Bool(b) => i64::from(*b),
                _ => value.as_i64().ok_or_else(invalid)?,
            };
            query.push_bind(v);
        }
        ColumnKind::Real => {
            query.push_bind(value.as_f64().ok_or_else(invalid)?);
        }
        ColumnKind::Text => {
            query.push_bind(value.as_str().ok_or_else(invalid)?.to_string());
        }
        ColumnKind::Bool => {
            query.push_bind(value.as_bool().ok_or_else(invalid)?);
        }
    }
    Ok(())
}

/// 追加 WHERE 子句
pub fn push_where(
    query: &mut QueryBuilder<'static, Sqlite>,
    relation: Relation,
    predicates: &[Predicate],
) -> Result<(), GatewayError> {
    for (i, predicate) in predicates.iter().enumerate() {
        query.push(if i == 0 { " WHERE " } else { " AND " });
        let kind = ensure_column(relation, predicate.column())?;

        match predicate {
            Predicate::Eq { column, value } if value.is_null() => {
                query.push(format!("{} IS NULL", column));
            }
            Predicate::Eq { column, value } => {
                query.push(format!("{} = ", column));
                push_value(query, column, kind, value)?;
            }
            Predicate::Contains { column, needle } => {
                query.push(format!("instr(lower({}), lower(", column));
                query.push_bind(needle.clone());
                query.push(")) > 0");
            }
            Predicate::StartsWith { column, prefix } => {
                query.push(format!("lower(substr({}, 1, length(", column));
                query.push_bind(prefix.clone());
                query.push("))) = lower(");
                query.push_bind(prefix.clone());
                query.push(")");
            }
        }
    }
    Ok(())
}

/// 追加 ORDER BY / LIMIT / OFFSET
/// SQLite 只接受有符号 64 位整数
fn bound(value: u64) -> Result<i64, GatewayError> {
    i64::try_from(value).map_err(|_| GatewayError::InvalidValue(format!("{} is out of range", value)))
}

pub fn push_tail(
    query: &mut QueryBuilder<'static, Sqlite>,
    relation: Relation,
    row_query: &RowQuery,
) -> Result<(), GatewayError> {
    for (i, (column, order)) in row_query.order.iter().enumerate() {
        query.push(if i == 0 { " ORDER BY " } else { ", " });
        let kind = ensure_column(relation, column)?;
        query.push(column.as_str());
        if kind == ColumnKind::Text {
            query.push(" COLLATE NOCASE");
        }
        query.push(match order {
            SortOrder::Asc => " ASC",
            SortOrder::Desc => " DESC",
        });
    }

    let limit = row_query.limit.map(bound).transpose()?;
    let offset = row_query.offset.map(bound).transpose()?;
    match (limit, offset) {
        (Some(limit), offset) => {
            query.push(" LIMIT ");
            query.push_bind(limit);
            if let Some(offset) = offset {
                query.push(" OFFSET ");
                query.push_bind(offset);
            }
        }
        (None, Some(offset)) => {
            query.push(" LIMIT -1 OFFSET ");
            query.push_bind(offset);
        }
        (None, None) => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_where_clause_shape() {
        let mut query = QueryBuilder::new("SELECT 1 FROM movies");
        push_where(
            &mut query,
            Relation::Movies,
            &[Predicate::eq("id", 3), Predicate::contains("title", "man")],
        )
        .unwrap();
        assert_eq!(
            query.sql(),
            "SELECT 1 FROM movies WHERE id = ? AND instr(lower(title), lower(?)) > 0"
        );
    }

    #[test]
    fn test_unknown_column_is_rejected() {
        let query = RowQuery::new().eq("director", "Nolan");
        assert!(matches!(
            query.validate(Relation::Movies),
            Err(GatewayError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn test_text_ordering_is_case_insensitive() {
        let mut query = QueryBuilder::new("SELECT 1 FROM movies");
        let row_query = RowQuery::new()
            .order_by("title", SortOrder::Asc)
            .limit(30)
            .offset(60);
        push_tail(&mut query, Relation::Movies, &row_query).unwrap();
        assert_eq!(
            query.sql(),
            "SELECT 1 FROM movies ORDER BY title COLLATE NOCASE ASC LIMIT ? OFFSET ?"
        );
    }

    #[test]
    fn test_type_mismatch_is_invalid_value() {
        let mut query = QueryBuilder::new("UPDATE movies SET title = ");
        let err = push_value(&mut query, "title", ColumnKind::Text, &json!(5)).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidValue(c) if c == "title"));
    }

    #[test]
    fn test_projection_renders_bools_as_json() {
        let projection = json_projection(Relation::Series);
        assert!(projection.contains("'is_dorama', json(CASE WHEN is_dorama THEN 'true' ELSE 'false' END)"));
        assert!(projection.starts_with("json_object('id', id"));
    }
}
