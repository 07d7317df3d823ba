use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use crate::error::AppError;
use crate::services::DiscussionBoard;
use crate::store::{RemoteStore, SqliteStore, StoreConfig, SupabaseHttpClient};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Supabase,
    Sqlite,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub backend: StoreBackend,
    pub database_url: String,
    pub public_base_url: String,
    pub fanout_width: usize,
    pub upload_limit_bytes: usize,
}

impl AppConfig {
    /// Default object size limit of the hosted store.
    pub const DEFAULT_UPLOAD_LIMIT: usize = 50 * 1024 * 1024;

    pub fn new_from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = match lookup("STORE_BACKEND").as_deref() {
            None | Some("supabase") => StoreBackend::Supabase,
            Some("sqlite") => StoreBackend::Sqlite,
            Some(other) => {
                return Err(AppError::Config(format!("unknown STORE_BACKEND: {}", other)));
            }
        };

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| "127.0.0.1:3000".to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AppError::Config(format!("invalid BIND_ADDR: {}", e)))?;

        let fanout_width = match lookup("FANOUT_WIDTH") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(width) if width >= 1 => width,
                _ => return Err(AppError::Config(format!("invalid FANOUT_WIDTH: {}", raw))),
            },
            None => DiscussionBoard::DEFAULT_FANOUT,
        };

        let upload_limit_bytes = match lookup("UPLOAD_LIMIT_BYTES") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(limit) if limit >= 1 => limit,
                _ => return Err(AppError::Config(format!("invalid UPLOAD_LIMIT_BYTES: {}", raw))),
            },
            None => Self::DEFAULT_UPLOAD_LIMIT,
        };

        Ok(Self {
            bind_addr,
            backend,
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://teamboard.db?mode=rwc".to_string()),
            public_base_url: lookup("PUBLIC_BASE_URL")
                .unwrap_or_else(|| "http://127.0.0.1:3000".to_string()),
            fanout_width,
            upload_limit_bytes,
        })
    }

    pub async fn build_store(&self) -> Result<Arc<dyn RemoteStore>, AppError> {
        match self.backend {
            StoreBackend::Supabase => {
                let config = StoreConfig::new_from_env()?;
                info!("using hosted store at {}", config.url);
                Ok(Arc::new(SupabaseHttpClient::new(config)?))
            }
            StoreBackend::Sqlite => {
                let store = SqliteStore::connect(&self.database_url, &self.public_base_url).await?;
                Ok(Arc::new(store))
            }
        }
    }
}
