use std::{str::FromStr, time::Duration};

use anyhow::Context;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};
use tracing::{error, info, warn};

use crate::{
    auth::{error::StoreError, repo::SqliteCredentialStore, store::CredentialStore},
    config::AppConfig,
};

/// Opens a pool for `url`, creating the database file if it is missing.
pub async fn connect(url: &str, max_connections: u32) -> Result<SqlitePool, StoreError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect_with(options)
        .await?;
    Ok(pool)
}

async fn try_open(config: &AppConfig) -> Result<SqliteCredentialStore, StoreError> {
    let pool = connect(&config.db.url, config.db.max_connections).await?;
    let store = SqliteCredentialStore::new(pool, config.seed.batch_size);
    store.initialize().await?;
    Ok(store)
}

/// Connects and creates the schema, retrying up to `DB_INIT_RETRIES` times.
pub async fn open_store(config: &AppConfig) -> anyhow::Result<SqliteCredentialStore> {
    let attempts = config.db.init_retries.max(1);
    let mut attempt = 1;
    loop {
        match try_open(config).await {
            Ok(store) => {
                info!(attempt, url = %config.db.url, "database initialized");
                return Ok(store);
            }
            Err(e) if attempt < attempts => {
                warn!(attempt, attempts, error = %e, "database init failed; retrying");
                tokio::time::sleep(config.db.init_delay()).await;
                attempt += 1;
            }
            Err(e) => {
                error!(attempts, error = %e, "exhausted database init attempts");
                return Err(e).context("initialize database");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str, retries: &str) -> AppConfig {
        let url = url.to_string();
        let retries = retries.to_string();
        AppConfig::from_lookup(move |key| match key {
            "DATABASE_URL" => Some(url.clone()),
            "DB_MAX_CONNECTIONS" => Some("1".into()),
            "DB_INIT_RETRIES" => Some(retries.clone()),
            "DB_INIT_DELAY_MS" => Some("0".into()),
            _ => None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn open_store_initializes_schema() {
        let store = open_store(&config("sqlite::memory:", "1")).await.expect("open");
        store.ping().await.expect("ping");
        assert_eq!(store.seed_users(3).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn open_store_gives_up_after_retries() {
        let cfg = config("sqlite:///definitely/not/a/dir/users.db", "2");
        let err = open_store(&cfg).await.unwrap_err();
        assert!(err.to_string().contains("initialize database"));
    }
}
