use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub init_retries: u32,
    pub init_delay_ms: u64,
}

impl DbConfig {
    pub fn init_delay(&self) -> Duration {
        Duration::from_millis(self.init_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    pub batch_size: usize, // rows per multi-row INSERT
    pub count: u64,        // users created by create-db
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub db: DbConfig,
    pub seed: SeedConfig,
}

pub const MAX_BATCH_SIZE: usize = 5000;

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup; missing keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db = DbConfig {
            url: lookup("DATABASE_URL").unwrap_or_else(|| "sqlite://users.db".into()),
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            init_retries: parse_or(&lookup, "DB_INIT_RETRIES", 5)?,
            init_delay_ms: parse_or(&lookup, "DB_INIT_DELAY_MS", 1000)?,
        };
        let batch_size: usize = parse_or(&lookup, "BATCH_SIZE", 1000)?;
        let seed = SeedConfig {
            batch_size: batch_size.clamp(1, MAX_BATCH_SIZE),
            count: parse_or(&lookup, "SEED_COUNT", 10_000)?,
        };
        Ok(Self { db, seed })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}
