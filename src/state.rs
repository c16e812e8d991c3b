use std::sync::Arc;

use crate::auth::store::CredentialStore;
use crate::config::AppConfig;
use crate::db;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CredentialStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let store = Arc::new(db::open_store(&config).await?) as Arc<dyn CredentialStore>;
        Ok(Self::from_parts(store, config))
    }

    pub fn from_parts(store: Arc<dyn CredentialStore>, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }
}

#[cfg(test)]
impl AppState {
    /// Default config with a custom create-db seed count.
    pub(crate) fn for_tests(store: Arc<dyn CredentialStore>, seed_count: u64) -> Self {
        let mut config = AppConfig::from_lookup(|_| None).expect("default config");
        config.seed.count = seed_count;
        Self::from_parts(store, Arc::new(config))
    }
}
