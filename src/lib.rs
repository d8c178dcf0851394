//! Basket
//!
//! Client-side state for a shopping list and budget tracker.
//!
//! Layered architecture:
//! - domain: entities and validation rules
//! - repository: key-value persistence and per-user snapshots
//! - store: application state, actions, the pure reducer and its effects
//! - session: auth reconciliation, remote sync and bootstrap ordering
//! - remote: backend API and category suggestion clients
//! - services: currency detection
//! - stats: spending aggregates

use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

pub mod config;
pub mod domain;
pub mod remote;
pub mod repository;
pub mod services;
pub mod session;
pub mod stats;
pub mod store;

use config::{AppConfig, ConfigError};
use remote::{suggest_category, CategorySuggester, HttpCategorySuggester, HttpRemoteApi, RemoteError};
use repository::{init_db, DbState, SnapshotRepository, SqliteStore, StorageError};
use services::{CurrencyResolver, GeoLocator, HttpIpLocator, HttpReverseGeocoder};
use session::{AuthState, Coordinator, CoordinatorError, SyncOutcome};
use store::Store;

pub use rolling_logger::LoggerHandle;

const APP_NAME: &str = "basket";

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Session(#[from] CoordinatorError),
}

/// Everything a host needs, wired from one [`AppConfig`]
pub struct App {
    config: AppConfig,
    db_state: DbState,
    coordinator: Coordinator,
    suggester: Option<Arc<dyn CategorySuggester>>,
    logger: Option<LoggerHandle>,
}

impl App {
    /// Load configuration from `config_path` and open the app
    pub async fn open_from(config_path: &Path) -> Result<Self, AppError> {
        let config = AppConfig::load(config_path)?;
        Self::open(config, None).await
    }

    /// Open storage, wire the remote clients and load the local snapshot.
    /// `device` enables position-based currency detection.
    pub async fn open(config: AppConfig, device: Option<Arc<dyn GeoLocator>>) -> Result<Self, AppError> {
        let logger = match rolling_logger::init_logger(&config.log_dir, APP_NAME) {
            Ok(handle) => Some(handle),
            Err(e) => {
                // A host may already have installed its own subscriber
                tracing::warn!(error = %e, "file logger not installed");
                None
            }
        };

        let db_state = init_db(&config.db_path).await?;
        let snapshots = SnapshotRepository::new(Arc::new(SqliteStore::new(&db_state)), config.storage_prefix.clone());
        let store = Arc::new(Store::new(snapshots, config.policy()));

        let remote = Arc::new(HttpRemoteApi::new(&config.api_base_url, config.request_timeout())?);

        let lookup_client = reqwest::Client::builder()
            .timeout(config.geolocation_timeout())
            .build()
            .map_err(RemoteError::from)?;
        let mut resolver = CurrencyResolver::new(config.geolocation_timeout())
            .with_ip(Arc::new(HttpIpLocator::new(lookup_client.clone())));
        if let Some(device) = device {
            resolver = resolver.with_device(device, Arc::new(HttpReverseGeocoder::new(lookup_client)));
        }

        let suggester = match &config.suggestion_url {
            Some(url) => {
                let suggester: Arc<dyn CategorySuggester> =
                    Arc::new(HttpCategorySuggester::new(url, config.request_timeout())?);
                Some(suggester)
            }
            None => None,
        };

        let coordinator = Coordinator::new(store, remote, resolver);
        let user_id = coordinator.bootstrap().await?;
        tracing::info!(%user_id, path = %config.db_path.display(), "opened");

        Ok(Self {
            config,
            db_state,
            coordinator,
            suggester,
            logger,
        })
    }

    /// Resolve the backend session and pull remote data. An unreachable
    /// backend leaves the local identity in place.
    pub async fn start(&self) -> Result<SyncOutcome, AppError> {
        match self.coordinator.refresh_session().await {
            Ok(outcome) => Ok(outcome),
            Err(CoordinatorError::Remote(e)) => {
                tracing::warn!(error = %e, "session check failed");
                self.coordinator.assume_local_session().await?;
                Ok(self.coordinator.sync().await?)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Forward an auth signal from the host and sync if it settled
    pub async fn auth_changed(&self, auth: &AuthState) -> Result<SyncOutcome, AppError> {
        if auth.is_loading {
            return Ok(SyncOutcome::Idle);
        }
        self.coordinator.on_auth_changed(auth).await?;
        Ok(self.coordinator.sync().await?)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<Store> {
        self.coordinator.store()
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    /// Category id for a new item; `None` without a suggestion service
    pub async fn suggest_category(&self, item_name: &str) -> Option<String> {
        let suggester = self.suggester.as_ref()?;
        let categories = self.store().state().await.categories;
        suggest_category(suggester.as_ref(), item_name, &categories).await
    }

    /// Most recent log lines, oldest first
    pub fn recent_log_lines(&self) -> Vec<String> {
        self.logger.as_ref().map(LoggerHandle::recent_lines).unwrap_or_default()
    }

    /// Release the database connection
    pub async fn close(&self) {
        self.db_state.close().await;
        tracing::info!("storage closed");
    }
}
