use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    /// When false the remote stores report "not connected" and every write goes local.
    pub remote_enabled: bool,
    pub remote_timeout_ms: u64,
    pub local_store_dir: PathBuf,
    pub search_limit: usize,
    pub default_weekly_budget: u32,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "teadiary".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "teadiary-users".into()),
            ttl_minutes: env_or("JWT_TTL_MINUTES", 60),
            refresh_ttl_minutes: env_or("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14),
        };
        Ok(Self {
            database_url,
            jwt,
            remote_enabled: env_or("REMOTE_ENABLED", true),
            remote_timeout_ms: env_or("REMOTE_TIMEOUT_MS", 3000),
            local_store_dir: std::env::var("LOCAL_STORE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
            search_limit: env_or("SEARCH_LIMIT", 10),
            default_weekly_budget: env_or("DEFAULT_WEEKLY_BUDGET", 3500),
        })
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
