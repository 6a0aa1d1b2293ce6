//! Application state for the Tripdesk server.
//!
//! Holds the shared resources handed to handlers through Axum's state.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::crypto::Encryptor;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::services::Services;

/// Development key, used only when `TRIPDESK_ENCRYPTION_KEY` is unset.
const DEV_ENCRYPTION_KEY: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: DbPool,

    /// Application configuration
    pub config: Arc<AppConfig>,

    pub services: Services,

    /// Server start time for uptime calculation
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Build the state and every service. Fails on a malformed encryption key.
    pub fn new(db: DbPool, config: AppConfig) -> AppResult<Self> {
        let config = Arc::new(config);
        let encryptor = encryptor_for(&config)?;
        Ok(Self {
            services: Services::new(db.clone(), config.clone(), encryptor),
            db,
            config,
            start_time: std::time::Instant::now(),
        })
    }

    /// Get the server uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

fn encryptor_for(config: &AppConfig) -> AppResult<Encryptor> {
    match config.encryption_key.as_deref() {
        Some(key) => Encryptor::from_base64(key),
        None => {
            tracing::warn!(
                "TRIPDESK_ENCRYPTION_KEY not set, using the development key (not secure for production)"
            );
            Encryptor::from_base64(DEV_ENCRYPTION_KEY)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::db::pool::create_lazy_pool;
    use crate::error::AppError;

    #[tokio::test]
    async fn test_state_with_dev_key() {
        let pool = create_lazy_pool(&DatabaseConfig::default());
        let state = AppState::new(pool, AppConfig::default()).unwrap();
        assert!(state.uptime_seconds() < 5);
    }

    #[tokio::test]
    async fn test_bad_key_is_config_error() {
        let pool = create_lazy_pool(&DatabaseConfig::default());
        let config = AppConfig {
            encryption_key: Some("c2hvcnQ=".to_string()),
            ..AppConfig::default()
        };
        assert!(matches!(AppState::new(pool, config), Err(AppError::Config(_))));
    }

    #[test]
    fn test_dev_key_is_valid() {
        assert!(Encryptor::from_base64(DEV_ENCRYPTION_KEY).is_ok());
    }
}
