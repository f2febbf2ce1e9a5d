use axum::extract::DefaultBodyLimit;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use jumpflix_backend::api::{self, AppState, AuthoringRegistry, SessionCleanupTask};
use jumpflix_backend::config::{AppConfig, Backend, ConfigError};
use jumpflix_backend::database::Database;
use jumpflix_backend::external::{SupabaseClient, SupabaseConfig, SupabaseGateways};
use jumpflix_backend::services::{CatalogService, FfprobeDurationProbe, MediaUploader};
use jumpflix_backend::storage::LocalObjectStore;

/// 空闲创作会话的清理间隔
const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load environment variables
    dotenv::dotenv().ok();

    let config = AppConfig::from_env()?;
    let probe = Arc::new(
        FfprobeDurationProbe::new(&config.ffprobe_path).with_timeout(config.ffprobe_timeout),
    );

    // 启动空闲会话清理任务
    let sessions = AuthoringRegistry::new(config.authoring_idle_ttl);
    tokio::spawn(SessionCleanupTask::new(sessions.clone(), SESSION_CLEANUP_INTERVAL).start());

    let app = match config.backend {
        Backend::Sqlite => {
            let database = Database::connect(&config.database_url).await?;
            let store = LocalObjectStore::new(&config.storage_dir, &config.public_base_url);
            tracing::info!("Serving uploaded media from {}", config.storage_dir.display());

            let state = AppState::shared(
                CatalogService::new(Arc::new(database.row_store())),
                MediaUploader::new(Arc::new(store)),
                probe,
            )
            .with_database(database)
            .with_sessions(sessions);

            api::router(state).nest_service("/media", ServeDir::new(&config.storage_dir))
        }
        Backend::Supabase => {
            let settings = config
                .supabase
                .clone()
                .ok_or(ConfigError::Missing("SUPABASE_URL"))?;
            let client = SupabaseClient::new(SupabaseConfig {
                url: settings.url,
                anon_key: settings.anon_key,
                timeout: config.gateway_timeout,
            })?;

            // 每个请求使用调用者自己的令牌
            let state = AppState::new(Arc::new(SupabaseGateways::new(client)), probe)
                .with_sessions(sessions);

            api::router(state)
        }
    };

    let app = app
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("🚀 Server listening on {} ({:?} backend)", addr, config.backend);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
