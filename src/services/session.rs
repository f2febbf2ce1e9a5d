use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

use super::error::AuthError;

/// 最短密码长度
pub const MIN_PASSWORD_LEN: usize = 6;

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid");
}

/// 用户
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// 登录会话
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: User,
}

/// 会话变化事件
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    PasswordRecovery,
    UserUpdated,
}

/// Snapshot published to subscribers on every change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub session: Option<Session>,
    /// Token presented by the caller; the backend validates it on use.
    pub bearer: Option<String>,
    pub last_event: Option<AuthEvent>,
}

/// 会话上下文（按请求或按创作会话创建，不跨调用者共享）
#[derive(Clone)]
pub struct SessionContext {
    tx: Arc<watch::Sender<SessionState>>,
}

impl SessionContext {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionState::default());
        Self { tx: Arc::new(tx) }
    }

    /// 以调用者携带的令牌初始化
    pub fn with_bearer(token: Option<String>) -> Self {
        let context = Self::new();
        context.set_bearer(token);
        context
    }

    /// Rebinds the caller token; an established session is left alone.
    pub fn set_bearer(&self, token: Option<String>) {
        self.tx.send_if_modified(|state| {
            if state.bearer == token {
                return false;
            }
            state.bearer = token;
            true
        });
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().session.clone()
    }

    pub fn access_token(&self) -> Option<String> {
        let state = self.tx.borrow();
        state
            .session
            .as_ref()
            .map(|s| s.access_token.clone())
            .or_else(|| state.bearer.clone())
    }

    pub fn is_signed_in(&self) -> bool {
        self.tx.borrow().session.is_some()
    }

    pub fn publish(&self, event: AuthEvent, session: Option<Session>) {
        tracing::info!(
            "Auth event {:?} (user: {})",
            event,
            session.as_ref().map(|s| s.user.id.as_str()).unwrap_or("-")
        );
        self.tx.send_modify(|state| {
            if event == AuthEvent::SignedOut {
                state.bearer = None;
            }
            state.session = session;
            state.last_event = Some(event);
        });
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

/// 认证后端接口
#[async_trait]
pub trait AuthClient: Send + Sync {
    /// Returns `None` when the account still needs email confirmation.
    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>, AuthError>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;
    async fn recover(&self, email: &str) -> Result<(), AuthError>;
    async fn update_password(&self, access_token: &str, password: &str) -> Result<User, AuthError>;
    async fn get_user(&self, access_token: &str) -> Result<User, AuthError>;
}

pub fn validate_email(email: &str) -> Result<(), AuthError> {
    if EMAIL_RE.is_match(email.trim()) {
        Ok(())
    } else {
        Err(AuthError::InvalidEmail(email.to_string()))
    }
}

pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::WeakPassword(MIN_PASSWORD_LEN));
    }
    Ok(())
}

/// 认证服务：校验输入、调用后端并更新会话上下文
#[derive(Clone)]
pub struct AuthService {
    client: Arc<dyn AuthClient>,
    session: SessionContext,
}

impl AuthService {
    pub fn new(client: Arc<dyn AuthClient>, session: SessionContext) -> Self {
        Self { client, session }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>, AuthError> {
        validate_email(email)?;
        validate_password(password)?;

        let session = self.client.sign_up(email.trim(), password).await?;
        if let Some(ref session) = session {
            self.session.publish(AuthEvent::SignedIn, Some(session.clone()));
        }
        Ok(session)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        validate_email(email)?;

        let session = self.client.sign_in(email.trim(), password).await.map_err(|e| {
            tracing::warn!("Sign in failed for {}: {}", email, e);
            e
        })?;
        self.session.publish(AuthEvent::SignedIn, Some(session.clone()));
        Ok(session)
    }

    /// Revokes the caller's token; the local context is cleared even when the
    /// remote call fails.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let token = self.session.access_token().ok_or(AuthError::NotSignedIn)?;
        let result = self.client.sign_out(&token).await;
        self.session.publish(AuthEvent::SignedOut, None);
        result
    }

    pub async fn recover(&self, email: &str) -> Result<(), AuthError> {
        validate_email(email)?;
        self.client.recover(email.trim()).await?;
        self.session
            .publish(AuthEvent::PasswordRecovery, self.session.current());
        Ok(())
    }

    pub async fn update_password(&self, password: &str) -> Result<User, AuthError> {
        validate_password(password)?;
        let token = self.session.access_token().ok_or(AuthError::NotSignedIn)?;

        let user = self.client.update_password(&token, password).await?;
        let session = self.session.current().map(|mut s| {
            s.user = user.clone();
            s
        });
        self.session.publish(AuthEvent::UserUpdated, session);
        Ok(user)
    }

    /// Re-validates the caller's token against the backend.
    pub async fn current_user(&self) -> Result<User, AuthError> {
        let token = self.session.access_token().ok_or(AuthError::NotSignedIn)?;
        self.client.get_user(&token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FakeAuth {
        calls: Mutex<Vec<String>>,
    }

    fn session(email: &str) -> Session {
        Session {
            access_token: "token-1".to_string(),
            refresh_token: None,
            expires_at: None,
            user: User {
                id: "u1".to_string(),
                email: Some(email.to_string()),
            },
        }
    }

    #[async_trait]
    impl AuthClient for FakeAuth {
        async fn sign_up(&self, email: &str, _: &str) -> Result<Option<Session>, AuthError> {
            self.calls.lock().unwrap().push(format!("signup:{email}"));
            Ok(None)
        }
        async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
            if password == "wrong-password" {
                return Err(AuthError::Rejected {
                    status: 400,
                    message: "Invalid login credentials".to_string(),
                });
            }
            Ok(session(email))
        }
        async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
            self.calls.lock().unwrap().push(format!("logout:{token}"));
            Ok(())
        }
        async fn recover(&self, _: &str) -> Result<(), AuthError> {
            Ok(())
        }
        async fn update_password(&self, _: &str, _: &str) -> Result<User, AuthError> {
            Ok(session("a@b.co").user)
        }
        async fn get_user(&self, _: &str) -> Result<User, AuthError> {
            Ok(session("a@b.co").user)
        }
    }

    fn service() -> AuthService {
        AuthService::new(
            Arc::new(FakeAuth {
                calls: Mutex::new(Vec::new()),
            }),
            SessionContext::new(),
        )
    }

    #[test]
    fn test_email_and_password_rules() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("user@example").is_err());
        assert!(validate_email("no spaces@x.com").is_err());
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
    }

    #[tokio::test]
    async fn test_sign_in_publishes_session() {
        let service = service();
        let mut rx = service.session().subscribe();

        service.sign_in("user@example.com", "secret1").await.unwrap();

        assert!(rx.has_changed().unwrap());
        let state = rx.borrow_and_update().clone();
        assert_eq!(state.last_event, Some(AuthEvent::SignedIn));
        assert_eq!(service.session().access_token().as_deref(), Some("token-1"));
    }

    #[tokio::test]
    async fn test_failed_sign_in_keeps_signed_out() {
        let service = service();
        let result = service.sign_in("user@example.com", "wrong-password").await;
        assert!(matches!(result, Err(AuthError::Rejected { status: 400, .. })));
        assert!(!service.session().is_signed_in());
    }

    #[tokio::test]
    async fn test_sign_out_clears_session() {
        let service = service();
        assert!(matches!(service.sign_out().await, Err(AuthError::NotSignedIn)));

        service.sign_in("user@example.com", "secret1").await.unwrap();
        service.sign_out().await.unwrap();
        assert!(service.session().current().is_none());
    }

    #[tokio::test]
    async fn test_contexts_do_not_share_tokens() {
        let fake = Arc::new(FakeAuth {
            calls: Mutex::new(Vec::new()),
        });
        let alice = AuthService::new(fake.clone(), SessionContext::new());
        let anonymous = AuthService::new(fake.clone(), SessionContext::with_bearer(None));

        alice.sign_in("alice@example.com", "secret1").await.unwrap();

        assert!(anonymous.session().access_token().is_none());
        assert!(matches!(anonymous.current_user().await, Err(AuthError::NotSignedIn)));
        assert!(matches!(anonymous.sign_out().await, Err(AuthError::NotSignedIn)));
        assert!(alice.session().is_signed_in());
        assert!(fake.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sign_out_revokes_presented_bearer() {
        let fake = Arc::new(FakeAuth {
            calls: Mutex::new(Vec::new()),
        });
        let context = SessionContext::with_bearer(Some("token-9".to_string()));
        let service = AuthService::new(fake.clone(), context.clone());

        assert_eq!(context.access_token().as_deref(), Some("token-9"));
        service.sign_out().await.unwrap();

        assert_eq!(*fake.calls.lock().unwrap(), vec!["logout:token-9".to_string()]);
        assert!(context.access_token().is_none());
    }

    #[test]
    fn test_rebinding_bearer_keeps_signed_in_session() {
        let context = SessionContext::with_bearer(Some("first".to_string()));
        context.set_bearer(Some("second".to_string()));
        assert_eq!(context.access_token().as_deref(), Some("second"));

        context.publish(AuthEvent::SignedIn, Some(session("a@b.co")));
        context.set_bearer(None);
        assert_eq!(context.access_token().as_deref(), Some("token-1"));
    }

    #[tokio::test]
    async fn test_update_password_requires_session() {
        let service = service();
        assert!(matches!(
            service.update_password("new-secret").await,
            Err(AuthError::NotSignedIn)
        ));
    }
}
