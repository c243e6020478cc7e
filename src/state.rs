use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::auth::password::{HashCost, PasswordCodec};
use crate::auth::session::SessionGate;
use crate::config::{AppConfig, StoreBackend};
use crate::db;
use crate::store::{memory::MemoryStore, sql::SqlStore, Store};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub sessions: Arc<SessionGate>,
}

impl AppState {
    /// Picks the backend once, from configuration.
    pub async fn init(config: &AppConfig) -> anyhow::Result<Self> {
        let codec = PasswordCodec::new(HashCost::Production);

        let store: Arc<dyn Store> = match config.backend {
            StoreBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL is required for the postgres backend")?;
                let pool = db::connect(url).await?;
                db::migrate(&pool).await?;
                Arc::new(SqlStore::new(pool, codec.clone()))
            }
            StoreBackend::Memory => Arc::new(MemoryStore::new(codec.clone())),
        };
        info!(backend = ?config.backend, "store ready");

        let sessions = Arc::new(SessionGate::new(&config.session, codec));
        Ok(Self::from_parts(store, sessions))
    }

    pub fn from_parts(store: Arc<dyn Store>, sessions: Arc<SessionGate>) -> Self {
        Self { store, sessions }
    }

    /// In-memory state with cheap hashing, for handler tests.
    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::config::SessionConfig;

        let codec = PasswordCodec::new(HashCost::Fast);
        let session = SessionConfig {
            secret: "test".into(),
            issuer: "test".into(),
            audience: "test".into(),
            ttl_hours: 72,
        };
        let sessions = Arc::new(SessionGate::new(&session, codec.clone()));
        Self::from_parts(Arc::new(MemoryStore::new(codec)), sessions)
    }
}
