pub mod auth;
pub mod authoring;
pub mod catalog;
pub mod error;
pub mod health;
pub mod response;
pub mod sessions;

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::database::Database;
use crate::services::{
    AuthoringWorkflow, CatalogService, DurationProbe, Gateways, MediaUploader, SessionContext,
    SharedGateways,
};

pub use auth::BearerToken;
pub use sessions::{AuthoringRegistry, SessionCleanupTask};

#[derive(Clone)]
pub struct AppState {
    /// 按调用者会话构建目录、上传与认证服务
    pub gateways: Arc<dyn Gateways>,
    pub probe: Arc<dyn DurationProbe>,
    pub sessions: AuthoringRegistry,
    /// 仅本地后端持有数据库
    pub database: Option<Database>,
}

impl AppState {
    pub fn new(gateways: Arc<dyn Gateways>, probe: Arc<dyn DurationProbe>) -> Self {
        Self {
            gateways,
            probe,
            sessions: AuthoringRegistry::default(),
            database: None,
        }
    }

    /// 本地后端：目录与上传服务不区分调用者
    pub fn shared(catalog: CatalogService, uploader: MediaUploader, probe: Arc<dyn DurationProbe>) -> Self {
        Self::new(Arc::new(SharedGateways::new(catalog, uploader)), probe)
    }

    pub fn with_database(mut self, database: Database) -> Self {
        self.database = Some(database);
        self
    }

    pub fn with_sessions(mut self, sessions: AuthoringRegistry) -> Self {
        self.sessions = sessions;
        self
    }

    /// The workflow's gateways stay bound to `session` for its lifetime.
    pub fn new_workflow(&self, session: &SessionContext) -> AuthoringWorkflow {
        AuthoringWorkflow::new(
            self.gateways.catalog(session),
            self.gateways.uploader(session),
            self.probe.clone(),
        )
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "JumpFlix Backend API v1.0" }))
        // Health
        .route("/api/health", get(health::health_check))
        // Catalog
        .route("/api/catalog/types", get(catalog::list_types))
        .route("/api/search", get(catalog::search_all))
        .route("/api/catalog/:kind", get(catalog::browse))
        .route("/api/catalog/:kind/search", get(catalog::search_type))
        .route(
            "/api/catalog/:kind/:id",
            get(catalog::get_details).delete(catalog::delete_title),
        )
        // Authoring workflow
        .route("/api/authoring", post(authoring::create_session))
        .route(
            "/api/authoring/:sid",
            get(authoring::get_session).delete(authoring::delete_session),
        )
        .route("/api/authoring/:sid/type", post(authoring::select_type))
        .route("/api/authoring/:sid/edit", post(authoring::begin_edit))
        .route("/api/authoring/:sid/metadata", post(authoring::submit_metadata))
        .route("/api/authoring/:sid/season", post(authoring::choose_season))
        .route("/api/authoring/:sid/episode", post(authoring::save_episode))
        .route("/api/authoring/:sid/episode/select", post(authoring::select_episode))
        .route("/api/authoring/:sid/back", post(authoring::back_to_seasons))
        .route("/api/authoring/:sid/cancel", post(authoring::cancel))
        // Auth
        .route("/api/auth/signup", post(auth::sign_up))
        .route("/api/auth/login", post(auth::sign_in))
        .route("/api/auth/logout", post(auth::sign_out))
        .route("/api/auth/recover", post(auth::recover))
        .route("/api/auth/password", put(auth::update_password))
        .route("/api/auth/session", get(auth::current_session))
        .with_state(state)
}
