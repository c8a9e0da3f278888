use anyhow::{Context, anyhow, bail};
use chrono::Duration;
use std::{env, fmt, str::FromStr, time::Duration as StdDuration};
use warden_core::{PoolSettings, TokenSettings};

use super::db::validate_database_url;

/// One year. Longer access tokens are refused at startup.
pub const MAX_ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 365 * 24 * 60;

/// Server configuration loaded from environment variables (and a `.env`
/// file when one is present).
#[derive(Debug, Clone)]
pub struct Config {
    // Database settings
    pub database_url: Option<String>,
    pub pool: PoolConfig,

    // Token settings
    pub token: TokenConfig,
}

/// Pool sizing as operators express it: a steady pool plus overflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub size: u32,
    pub max_overflow: u32,
    pub timeout_secs: u64,
    pub recycle_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            size: 5,
            max_overflow: 10,
            timeout_secs: 30,
            recycle_secs: 1800,
        }
    }
}

impl PoolConfig {
    pub fn to_settings(&self) -> PoolSettings {
        PoolSettings {
            max_connections: self.size.saturating_add(self.max_overflow),
            min_connections: self.size,
            acquire_timeout: StdDuration::from_secs(self.timeout_secs),
            max_lifetime: StdDuration::from_secs(self.recycle_secs),
            ..PoolSettings::default()
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct TokenConfig {
    pub secret_key: String,
    pub algorithm: String,
    pub access_token_expire_minutes: i64,
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret_key", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field(
                "access_token_expire_minutes",
                &self.access_token_expire_minutes,
            )
            .finish()
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = PoolConfig::default();
        let pool = PoolConfig {
            size: parse_var(&lookup, "DB_POOL_SIZE", defaults.size)?,
            max_overflow: parse_var(&lookup, "DB_MAX_OVERFLOW", defaults.max_overflow)?,
            timeout_secs: parse_var(&lookup, "DB_POOL_TIMEOUT_SECS", defaults.timeout_secs)?,
            recycle_secs: parse_var(&lookup, "DB_POOL_RECYCLE_SECS", defaults.recycle_secs)?,
        };
        if pool.size == 0 {
            bail!("DB_POOL_SIZE must be at least 1");
        }
        if pool.size.checked_add(pool.max_overflow).is_none() {
            bail!("DB_POOL_SIZE + DB_MAX_OVERFLOW exceeds {}", u32::MAX);
        }

        let access_token_expire_minutes = parse_var(
            &lookup,
            "ACCESS_TOKEN_EXPIRE_MINUTES",
            TokenSettings::DEFAULT_EXPIRY_MINUTES,
        )?;
        if access_token_expire_minutes <= 0 {
            bail!("ACCESS_TOKEN_EXPIRE_MINUTES must be positive");
        }
        if access_token_expire_minutes > MAX_ACCESS_TOKEN_EXPIRE_MINUTES {
            bail!(
                "ACCESS_TOKEN_EXPIRE_MINUTES must be at most {MAX_ACCESS_TOKEN_EXPIRE_MINUTES}"
            );
        }

        Ok(Self {
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            pool,
            token: TokenConfig {
                secret_key: lookup("JWT_SECRET_KEY").unwrap_or_default(),
                algorithm: lookup("HASH_ALGORITHM").unwrap_or_default(),
                access_token_expire_minutes,
            },
        })
    }

    /// The validated database URL; commands that touch storage need one.
    pub fn require_database_url(&self) -> anyhow::Result<&str> {
        let url = self
            .database_url
            .as_deref()
            .ok_or_else(|| anyhow!("DATABASE_URL must be set"))?;
        validate_database_url(url)?;
        Ok(url)
    }

    pub fn pool_settings(&self) -> PoolSettings {
        self.pool.to_settings()
    }

    /// Token settings as handed to the token service. Empty secret or
    /// algorithm values pass through so the service can reject them.
    pub fn token_settings(&self) -> TokenSettings {
        TokenSettings::new(self.token.secret_key.clone(), self.token.algorithm.clone())
            .with_default_expiry(
                Duration::try_minutes(self.token.access_token_expire_minutes)
                    .unwrap_or(Duration::MAX),
            )
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        _ => Ok(default),
    }
}
