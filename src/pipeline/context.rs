// src/pipeline/context.rs

//! Builds the runtime collaborators from configuration.

use std::sync::Arc;

use crate::error::Result;
use crate::models::Config;
use crate::pipeline::{ChangeDetector, SharedDetector};
use crate::services::{
    CatalogExtractor, Fetcher, HttpFetcher, LogSink, NotificationSink, TelegramSink,
};
use crate::storage::LocalStateStore;

/// Shared services for one process.
pub struct AppContext {
    pub config: Config,
    pub fetcher: Arc<dyn Fetcher>,
    pub extractor: Arc<CatalogExtractor>,
    pub sink: Arc<dyn NotificationSink>,
}

impl AppContext {
    /// Wire up HTTP, parsing and delivery.
    ///
    /// Telegram is used when configured, unless `dry_run` is set; otherwise
    /// messages go to the log.
    pub fn from_config(config: Config, dry_run: bool) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config.fetch, &config.proxy)?;
        let extractor =
            CatalogExtractor::new(&config.catalog.selectors, &config.catalog.base_url)?;

        let sink: Arc<dyn NotificationSink> = if dry_run {
            log::info!("Dry run: notifications are written to the log");
            Arc::new(LogSink)
        } else if config.notify.telegram.is_configured() {
            Arc::new(TelegramSink::new(&config.notify.telegram)?)
        } else {
            log::warn!("Telegram is not configured; notifications are written to the log");
            Arc::new(LogSink)
        };

        Ok(Self {
            config,
            fetcher: Arc::new(fetcher),
            extractor: Arc::new(extractor),
            sink,
        })
    }

    /// Lock and load the known state, then build the single-flight detector.
    ///
    /// Fails with `PersistError::Locked` while another process holds the
    /// state file; the lock is released when the detector is dropped.
    pub async fn open_detector(&self) -> Result<SharedDetector> {
        let store = LocalStateStore::open_exclusive(&self.config.storage.state_file).await?;
        let detector = ChangeDetector::open(
            &self.config,
            Arc::clone(&self.fetcher),
            Arc::clone(&self.extractor),
            Box::new(store),
            Arc::clone(&self.sink),
        )
        .await;
        Ok(SharedDetector::new(detector))
    }
}
