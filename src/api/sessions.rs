use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::time::{Duration, Instant};
use uuid::Uuid;

use crate::services::{AuthoringWorkflow, SessionContext};

/// 默认空闲过期时间
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(60 * 60);

struct Entry {
    workflow: Arc<Mutex<AuthoringWorkflow>>,
    session: SessionContext,
    touched: Instant,
}

/// 进行中的创作会话
///
/// Each entry owns the session context its gateways were built with, so a
/// request only has to rebind the caller's token before driving the workflow.
#[derive(Clone)]
pub struct AuthoringRegistry {
    entries: Arc<RwLock<HashMap<Uuid, Entry>>>,
    idle_ttl: Duration,
}

impl AuthoringRegistry {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            idle_ttl,
        }
    }

    pub fn idle_ttl(&self) -> Duration {
        self.idle_ttl
    }

    pub async fn insert(&self, id: Uuid, workflow: AuthoringWorkflow, session: SessionContext) {
        self.entries.write().await.insert(
            id,
            Entry {
                workflow: Arc::new(Mutex::new(workflow)),
                session,
                touched: Instant::now(),
            },
        );
    }

    /// Looks up a session and marks it as used.
    pub async fn get(&self, id: &Uuid) -> Option<(Arc<Mutex<AuthoringWorkflow>>, SessionContext)> {
        let mut entries = self.entries.write().await;
        let entry = entries.get_mut(id)?;
        entry.touched = Instant::now();
        Some((entry.workflow.clone(), entry.session.clone()))
    }

    pub async fn remove(&self, id: &Uuid) -> bool {
        self.entries.write().await.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Drops sessions idle for longer than the TTL. A session whose step is
    /// still running is kept.
    pub async fn prune(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();

        entries.retain(|id, entry| {
            let idle = now.saturating_duration_since(entry.touched);
            let keep = idle <= self.idle_ttl || entry.workflow.try_lock().is_err();
            if !keep {
                tracing::info!("Expired authoring session {} (idle {:?})", id, idle);
            }
            keep
        });

        before - entries.len()
    }
}

impl Default for AuthoringRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_TTL)
    }
}

/// 定期清理空闲创作会话
pub struct SessionCleanupTask {
    registry: AuthoringRegistry,
    interval: Duration,
}

impl SessionCleanupTask {
    pub fn new(registry: AuthoringRegistry, interval: Duration) -> Self {
        Self { registry, interval }
    }

    /// 启动定期清理任务
    pub async fn start(self) {
        let mut interval = tokio::time::interval(self.interval);

        loop {
            interval.tick().await;
            let removed = self.registry.prune().await;
            tracing::debug!(
                "Authoring session cleanup removed {}, {} remaining",
                removed,
                self.registry.len().await
            );
        }
    }
}
