use std::sync::Arc;

use crate::auth::repo::{MemoryUserStore, PgUserStore, UserStore};
use crate::config::{AppConfig, JwtConfig};
use crate::db;
use crate::sweets::repo::{MemorySweetStore, PgSweetStore, SweetStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub sweets: Arc<dyn SweetStore>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        Self::from_config(config).await
    }

    /// Postgres when `DATABASE_URL` is set, otherwise process memory.
    pub async fn from_config(config: Arc<AppConfig>) -> anyhow::Result<Self> {
        let Some(url) = config.database_url.as_deref() else {
            tracing::warn!("DATABASE_URL not set; using in-memory store, data is lost on exit");
            return Ok(Self::in_memory(config));
        };

        let pool = db::connect(url, config.db_max_connections).await?;
        db::migrate(&pool).await?;

        Ok(Self {
            users: Arc::new(PgUserStore::new(pool.clone())) as Arc<dyn UserStore>,
            sweets: Arc::new(PgSweetStore::new(pool)) as Arc<dyn SweetStore>,
            config,
        })
    }

    pub fn in_memory(config: Arc<AppConfig>) -> Self {
        Self {
            config,
            users: Arc::new(MemoryUserStore::default()) as Arc<dyn UserStore>,
            sweets: Arc::new(MemorySweetStore::default()) as Arc<dyn SweetStore>,
        }
    }

    /// In-memory state with a fixed test signing key.
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            database_url: None,
            db_max_connections: 1,
            jwt: JwtConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
            },
            host: "127.0.0.1".into(),
            port: 0,
            cors_allowed_origins: Vec::new(),
        });
        Self::in_memory(config)
    }
}
