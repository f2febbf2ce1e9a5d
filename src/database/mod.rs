use anyhow::Result;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};
use std::str::FromStr;

pub mod error;
pub mod query_builder;
pub mod repository;
pub mod schema;

pub use error::GatewayError;
pub use query_builder::{Predicate, Row, RowQuery, SortOrder};
pub use repository::{RowStore, SqliteRowStore};

#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    pub async fn connect(database_url: &str) -> Result<Self> {
        tracing::info!("Connecting to database: {}", database_url);

        let connect_options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .busy_timeout(std::time::Duration::from_secs(30));

        // SQLite 单写入者，限制为1个连接
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(connect_options)
            .await?;

        Self::bootstrap(pool).await
    }

    /// 内存数据库（测试用）
    pub async fn in_memory() -> Result<Self> {
        let connect_options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        // The database lives as long as its only connection does.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(connect_options)
            .await?;

        Self::bootstrap(pool).await
    }

    async fn bootstrap(pool: Pool<Sqlite>) -> Result<Self> {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&pool).await?;

        schema::verify_schema(&pool).await?;

        let stats = schema::get_database_stats(&pool).await?;
        tracing::info!(
            "Database initialized - Movies: {}, Series: {}, Animes: {}, Episodes: {}, Size: {:.2} MB",
            stats.movie_count,
            stats.series_count,
            stats.anime_count,
            stats.episode_count,
            stats.database_size_mb()
        );

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub fn row_store(&self) -> SqliteRowStore {
        SqliteRowStore::new(self.pool.clone())
    }

    /// 获取数据库统计信息
    pub async fn get_stats(&self) -> Result<schema::DatabaseStats> {
        schema::get_database_stats(&self.pool).await
    }
}
