use super::catalog::CatalogService;
use super::session::{AuthService, SessionContext};
use super::upload::MediaUploader;

/// 按调用者会话构建服务
///
/// Remote backends bind every gateway call to the caller's token, so the
/// services are assembled per request instead of once per process.
pub trait Gateways: Send + Sync {
    fn backend_name(&self) -> &'static str;

    fn catalog(&self, session: &SessionContext) -> CatalogService;

    fn uploader(&self, session: &SessionContext) -> MediaUploader;

    /// `None` when the backend has no account service.
    fn auth(&self, session: &SessionContext) -> Option<AuthService>;
}

/// 本地后端：所有调用者共用同一组服务，令牌被忽略
#[derive(Clone)]
pub struct SharedGateways {
    catalog: CatalogService,
    uploader: MediaUploader,
}

impl SharedGateways {
    pub fn new(catalog: CatalogService, uploader: MediaUploader) -> Self {
        Self { catalog, uploader }
    }
}

impl Gateways for SharedGateways {
    fn backend_name(&self) -> &'static str {
        self.catalog.backend_name()
    }

    fn catalog(&self, _session: &SessionContext) -> CatalogService {
        self.catalog.clone()
    }

    fn uploader(&self, _session: &SessionContext) -> MediaUploader {
        self.uploader.clone()
    }

    fn auth(&self, _session: &SessionContext) -> Option<AuthService> {
        None
    }
}
