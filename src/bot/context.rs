//! Shared bot state
//!
//! One `BotContext` per process, created at startup and handed to the
//! dispatcher. Each piece of mutable state sits behind its own async mutex;
//! the registry mutex also serializes insert and update. The registry mutex
//! is shared (`Arc`) so a blocking task can own the guard while it writes
//! the spreadsheet.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::Instant;

use super::rate_limit::RateLimiter;
use super::stats::CommandStats;
use crate::backup::BackupManager;
use crate::config::BotConfig;
use crate::observability::{log_event_with_fields, Event};
use crate::routes::RouteRegistry;
use crate::storage::{SheetStore, StorageError, XlsxStore};

/// Transport readiness
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// No connection yet, or the connection dropped
    Offline,
    /// Connected at this instant; commands wait for the grace period
    ConnectedAt(Instant),
}

pub struct BotContext {
    config: BotConfig,
    pub registry: Arc<Mutex<RouteRegistry>>,
    pub rate_limiter: Mutex<RateLimiter>,
    pub stats: Mutex<CommandStats>,
    readiness: Mutex<Readiness>,
}

impl BotContext {
    pub fn new(config: BotConfig, store: Arc<dyn SheetStore>) -> Self {
        let window = config.rate_limit_window();
        Self {
            config,
            registry: Arc::new(Mutex::new(RouteRegistry::new(store))),
            rate_limiter: Mutex::new(RateLimiter::new(window)),
            stats: Mutex::new(CommandStats::new()),
            readiness: Mutex::new(Readiness::Offline),
        }
    }

    /// Context backed by the `.xlsx` file and backup directory in `config`.
    pub fn from_config(config: BotConfig) -> Self {
        let store = xlsx_store(&config);
        Self::new(config, Arc::new(store))
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    /// Loads the registry on a blocking thread.
    ///
    /// The registry lock is released while the file is read, so commands
    /// arriving meanwhile get `NotReady` instead of waiting.
    pub async fn load_routes(&self) {
        let store = self.registry.lock().await.begin_loading();

        let result = tokio::task::spawn_blocking(move || store.load())
            .await
            .unwrap_or_else(|e| {
                Err(StorageError::read_failed_no_source(format!(
                    "load task failed: {}",
                    e
                )))
            });

        self.registry.lock().await.finish_loading(result);
    }

    pub async fn mark_ready(&self, now: Instant) {
        *self.readiness.lock().await = Readiness::ConnectedAt(now);
        log_event_with_fields(
            Event::TransportReady,
            &[("grace_ms", &self.config.ready_grace_ms.to_string())],
        );
    }

    pub async fn mark_disconnected(&self) {
        *self.readiness.lock().await = Readiness::Offline;
    }

    /// Whether commands may be served at `now`.
    pub async fn is_ready(&self, now: Instant) -> bool {
        match *self.readiness.lock().await {
            Readiness::Offline => false,
            Readiness::ConnectedAt(since) => {
                now.saturating_duration_since(since) >= self.config.ready_grace()
            }
        }
    }
}

/// `XlsxStore` for the paths in `config`.
pub fn xlsx_store(config: &BotConfig) -> XlsxStore {
    let backups = BackupManager::new(&config.backup_dir, config.max_backups);
    XlsxStore::new(&config.data_file, backups)
}
