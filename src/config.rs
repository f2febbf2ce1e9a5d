use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// 配置错误
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },

    #[error("{0} is required for the supabase backend")]
    Missing(&'static str),
}

/// 行存储 / 对象存储后端
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    Supabase,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SupabaseSettings {
    pub url: String,
    pub anon_key: String,
}

/// 应用配置（来自环境变量）
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub backend: Backend,
    pub database_url: String,
    pub storage_dir: PathBuf,
    pub public_base_url: String,
    pub supabase: Option<SupabaseSettings>,
    pub gateway_timeout: Duration,
    pub ffprobe_path: PathBuf,
    pub ffprobe_timeout: Duration,
    /// 创作会话空闲多久后被清理
    pub authoring_idle_ttl: Duration,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests need not touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let port = parse("PORT", &get("PORT", "3000"))?;

        let backend = match get("BACKEND", "sqlite").to_ascii_lowercase().as_str() {
            "sqlite" | "local" => Backend::Sqlite,
            "supabase" => Backend::Supabase,
            other => {
                return Err(ConfigError::Invalid {
                    key: "BACKEND",
                    value: other.to_string(),
                })
            }
        };

        let supabase = match (lookup("SUPABASE_URL"), lookup("SUPABASE_ANON_KEY")) {
            (Some(url), Some(anon_key)) if !url.is_empty() && !anon_key.is_empty() => {
                url::Url::parse(&url).map_err(|_| ConfigError::Invalid {
                    key: "SUPABASE_URL",
                    value: url.clone(),
                })?;
                Some(SupabaseSettings { url, anon_key })
            }
            _ => None,
        };

        if backend == Backend::Supabase && supabase.is_none() {
            let missing = if lookup("SUPABASE_URL").map_or(true, |v| v.is_empty()) {
                "SUPABASE_URL"
            } else {
                "SUPABASE_ANON_KEY"
            };
            return Err(ConfigError::Missing(missing));
        }

        let timeout_secs: u64 = parse("GATEWAY_TIMEOUT_SECS", &get("GATEWAY_TIMEOUT_SECS", "30"))?;
        let max_upload_mb: usize = parse("MAX_UPLOAD_MB", &get("MAX_UPLOAD_MB", "1024"))?;
        let ffprobe_secs: u64 = parse("FFPROBE_TIMEOUT_SECS", &get("FFPROBE_TIMEOUT_SECS", "60"))?;
        let idle_secs: u64 = parse(
            "AUTHORING_IDLE_TTL_SECS",
            &get("AUTHORING_IDLE_TTL_SECS", "3600"),
        )?;

        Ok(Self {
            host: get("HOST", "0.0.0.0"),
            port,
            backend,
            database_url: get("DATABASE_URL", "sqlite:./jumpflix.db?mode=rwc"),
            storage_dir: PathBuf::from(get("STORAGE_DIR", "./storage")),
            public_base_url: get("PUBLIC_BASE_URL", "http://localhost:3000"),
            supabase,
            gateway_timeout: Duration::from_secs(timeout_secs),
            ffprobe_path: PathBuf::from(get("FFPROBE_PATH", "ffprobe")),
            ffprobe_timeout: Duration::from_secs(ffprobe_secs),
            authoring_idle_ttl: Duration::from_secs(idle_secs),
            max_upload_bytes: max_upload_mb * 1024 * 1024,
        })
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}
