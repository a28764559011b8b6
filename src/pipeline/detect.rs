// src/pipeline/detect.rs

//! Change detection cycle.
//!
//! One cycle: fetch the catalog, extract entries, diff them against the known
//! state, persist the new state, then hand the events to the sink. State is
//! saved before any event is delivered, so a delivery failure can lose a
//! notification but never makes the same change fire twice.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::Result;
use crate::models::{
    CatalogEntry, ChangeEvent, CoinDetails, Config, EnrichConfig, KnownState, MessageTemplates,
};
use crate::services::{CatalogExtractor, Fetcher, NotificationSink, enrich_entries};
use crate::storage::StateStore;
use crate::utils::log::preview;

/// Classify `entries` against `state`, updating it in place.
///
/// Events follow extraction order. Keys missing from `entries` are left alone.
/// Entries migrated from a legacy file without a recorded availability adopt
/// the observed one without producing an event.
pub fn classify(state: &mut KnownState, entries: Vec<CatalogEntry>) -> Vec<ChangeEvent> {
    let mut events = Vec::new();

    for entry in entries {
        let previous = state.get(&entry.key).map(|known| known.availability);
        match previous {
            None => {
                state.record(entry.key.clone(), entry.availability);
                events.push(ChangeEvent::NewItem(entry));
            }
            Some(None) => {
                state.record(entry.key.clone(), entry.availability);
            }
            Some(Some(previous)) if previous != entry.availability => {
                state.record(entry.key.clone(), entry.availability);
                events.push(ChangeEvent::StatusChanged { entry, previous });
            }
            Some(Some(_)) => {}
        }
    }

    events
}

/// Outcome of one detection cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Entries extracted from the catalog page
    pub entries_seen: usize,
    pub new_items: usize,
    pub status_changes: usize,
    /// Messages accepted by the sink
    pub delivered: usize,
    /// Messages the sink gave up on
    pub delivery_failures: usize,
}

impl CycleReport {
    pub fn event_count(&self) -> usize {
        self.new_items + self.status_changes
    }

    /// One-line human-readable summary.
    pub fn summary(&self) -> String {
        let mut text = format!(
            "{} new item(s), {} status change(s) across {} listed item(s)",
            self.new_items, self.status_changes, self.entries_seen
        );
        if self.delivery_failures > 0 {
            text.push_str(&format!(
                "; {} notification(s) not delivered",
                self.delivery_failures
            ));
        }
        text
    }
}

/// Owns the known state and runs detection cycles against it.
pub struct ChangeDetector {
    catalog_url: String,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<CatalogExtractor>,
    store: Box<dyn StateStore>,
    sink: Arc<dyn NotificationSink>,
    templates: MessageTemplates,
    enrich: EnrichConfig,
    empty_alert_after: u32,
    empty_streak: u32,
    state: KnownState,
}

impl ChangeDetector {
    /// Load the known state from `store` and build a detector around it.
    pub async fn open(
        config: &Config,
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<CatalogExtractor>,
        store: Box<dyn StateStore>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        let state = store.load().await;
        Self {
            catalog_url: config.catalog.url.clone(),
            fetcher,
            extractor,
            store,
            sink,
            templates: config.notify.templates.clone(),
            enrich: config.enrich.clone(),
            empty_alert_after: config.detector.empty_alert_after,
            empty_streak: 0,
            state,
        }
    }

    /// The last durably saved state.
    pub fn state(&self) -> &KnownState {
        &self.state
    }

    /// Cycles in a row that extracted nothing.
    pub fn consecutive_empty_cycles(&self) -> u32 {
        self.empty_streak
    }

    fn empty_alert_due(&self) -> bool {
        self.empty_alert_after > 0 && self.empty_streak >= self.empty_alert_after
    }

    /// Run one full cycle.
    ///
    /// Fetch and persist failures abort the cycle with the state unchanged.
    /// Delivery failures are logged and counted.
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        log::info!("Checking catalog {}", self.catalog_url);
        let html = self.fetcher.fetch(&self.catalog_url).await?;

        let entries = match self.extractor.try_extract_entries(&html) {
            Ok(entries) if entries.is_empty() => {
                self.note_empty_cycle("no complete entries on the page", &html);
                return Ok(CycleReport::default());
            }
            Ok(entries) => entries,
            Err(e) => {
                self.note_empty_cycle(&e.to_string(), &html);
                return Ok(CycleReport::default());
            }
        };

        let mut report = CycleReport {
            entries_seen: entries.len(),
            ..CycleReport::default()
        };
        self.empty_streak = 0;
        log::info!("Found {} catalog entries", entries.len());

        let mut next = self.state.clone();
        let events = classify(&mut next, entries);
        if next != self.state {
            self.store.save(&next).await?;
            self.state = next;
        }

        report.new_items = events.iter().filter(|e| e.is_new_item()).count();
        report.status_changes = events.len() - report.new_items;
        if events.is_empty() {
            log::info!("No new items or status changes");
            return Ok(report);
        }

        let details = self.details_for(&events).await;
        for (event, details) in events.iter().zip(details) {
            let text = event.render(&self.templates, details.as_ref());
            match self.sink.deliver(&text).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.delivery_failures += 1;
                    log::error!(
                        "Failed to deliver notification for {}: {}",
                        event.entry().key,
                        e
                    );
                }
            }
        }

        Ok(report)
    }

    async fn details_for(&self, events: &[ChangeEvent]) -> Vec<Option<CoinDetails>> {
        if !self.enrich.on_notify {
            return vec![None; events.len()];
        }
        enrich_entries(
            self.fetcher.as_ref(),
            &self.extractor,
            events.iter().map(ChangeEvent::entry),
            self.enrich.batch_size,
        )
        .await
    }

    fn note_empty_cycle(&mut self, reason: &str, html: &str) {
        self.empty_streak += 1;
        let page = preview(html, 300);
        if self.empty_alert_due() {
            log::error!(
                "No catalog entries for {} consecutive cycles ({}); the site may be serving a challenge page. Page: {}",
                self.empty_streak,
                reason,
                page
            );
        } else {
            log::warn!("No catalog entries ({}), skipping cycle. Page: {}", reason, page);
        }
    }
}

/// Single-flight handle shared by the scheduler and on-demand callers.
///
/// Cycles queue on the inner lock, so two never touch the state at once.
#[derive(Clone)]
pub struct SharedDetector {
    inner: Arc<Mutex<ChangeDetector>>,
}

impl SharedDetector {
    pub fn new(detector: ChangeDetector) -> Self {
        Self {
            inner: Arc::new(Mutex::new(detector)),
        }
    }

    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let mut detector = self.inner.lock().await;
        detector.run_cycle().await
    }

    /// Snapshot of the last saved state.
    pub async fn known_state(&self) -> KnownState {
        self.inner.lock().await.state().clone()
    }
}
