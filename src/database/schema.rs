use anyhow::Result;
use sqlx::{Pool, Sqlite};

use crate::models::Relation;

/// 列类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Real,
    Text,
    Bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const fn col(name: &'static str, kind: ColumnKind) -> Column {
    Column { name, kind }
}

use ColumnKind::{Bool, Integer, Real, Text};

const MOVIES: &[Column] = &[
    col("id", Integer),
    col("title", Text),
    col("release_year", Integer),
    col("imdb_rating", Real),
    col("synopsis", Text),
    col("poster_url", Text),
    col("thumbnail_url", Text),
    col("video_url", Text),
    col("duration", Integer),
];

const SERIES: &[Column] = &[
    col("id", Integer),
    col("title", Text),
    col("release_year", Integer),
    col("imdb_rating", Real),
    col("synopsis", Text),
    col("poster_url", Text),
    col("is_dorama", Bool),
    col("season_count", Integer),
    col("completed", Bool),
];

const ANIMES: &[Column] = &[
    col("id", Integer),
    col("title", Text),
    col("release_year", Integer),
    col("imdb_rating", Real),
    col("synopsis", Text),
    col("poster_url", Text),
    col("season_count", Integer),
    col("completed", Bool),
];

const SEASONS: &[Column] = &[
    col("id", Integer),
    col("parent_id", Integer),
    col("parent_type", Text),
    col("season_number", Integer),
    col("arc_name", Text),
];

const EPISODES: &[Column] = &[
    col("id", Integer),
    col("season_id", Integer),
    col("episode_number", Integer),
    col("title", Text),
    col("synopsis", Text),
    col("thumbnail_url", Text),
    col("video_url", Text),
    col("duration", Integer),
];

/// 关系的列定义
pub fn columns(relation: Relation) -> &'static [Column] {
    match relation {
        Relation::Movies => MOVIES,
        Relation::Series => SERIES,
        Relation::Animes => ANIMES,
        Relation::Seasons => SEASONS,
        Relation::Episodes => EPISODES,
    }
}

pub fn column(relation: Relation, name: &str) -> Option<&'static Column> {
    columns(relation).iter().find(|c| c.name == name)
}

/// 验证数据库schema完整性
pub async fn verify_schema(pool: &Pool<Sqlite>) -> Result<()> {
    for relation in Relation::ALL {
        let table = relation.table();
        let exists = sqlx::query("SELECT name FROM sqlite_master WHERE type='table' AND name=?")
            .bind(table)
            .fetch_optional(pool)
            .await?;

        if exists.is_none() {
            return Err(anyhow::anyhow!("Required table '{}' does not exist", table));
        }
    }

    let required_indexes = ["idx_seasons_parent", "idx_episodes_season"];

    for index in required_indexes {
        let exists = sqlx::query("SELECT name FROM sqlite_master WHERE type='index' AND name=?")
            .bind(index)
            .fetch_optional(pool)
            .await?;

        if exists.is_none() {
            return Err(anyhow::anyhow!("Required index '{}' does not exist", index));
        }
    }

    tracing::info!("Database schema verification completed successfully");
    Ok(())
}

/// 获取数据库统计信息
pub async fn get_database_stats(pool: &Pool<Sqlite>) -> Result<DatabaseStats> {
    let mut counts = [0i64; 5];
    for (slot, relation) in counts.iter_mut().zip(Relation::ALL) {
        *slot = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", relation.table()))
            .fetch_one(pool)
            .await?;
    }

    let db_size: i64 = sqlx::query_scalar(
        "SELECT page_count * page_size as size FROM pragma_page_count(), pragma_page_size()",
    )
    .fetch_one(pool)
    .await?;

    Ok(DatabaseStats {
        movie_count: counts[0],
        series_count: counts[1],
        anime_count: counts[2],
        season_count: counts[3],
        episode_count: counts[4],
        database_size_bytes: db_size,
    })
}

/// 数据库统计信息
#[derive(Debug, Clone, serde::Serialize)]
pub struct DatabaseStats {
    pub movie_count: i64,
    pub series_count: i64,
    pub anime_count: i64,
    pub season_count: i64,
    pub episode_count: i64,
    pub database_size_bytes: i64,
}

impl DatabaseStats {
    pub fn database_size_mb(&self) -> f64 {
        self.database_size_bytes as f64 / (1024.0 * 1024.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_relation_has_an_id_column() {
        for relation in Relation::ALL {
            let id = column(relation, "id").expect("id column");
            assert_eq!(id.kind, ColumnKind::Integer);
        }
    }

    #[test]
    fn test_anime_has_no_dorama_flag() {
        assert!(column(Relation::Series, "is_dorama").is_some());
        assert!(column(Relation::Animes, "is_dorama").is_none());
    }
}
