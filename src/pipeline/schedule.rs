// src/pipeline/schedule.rs

//! Periodic watch loop.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};
use tokio::time::MissedTickBehavior;

use crate::models::{ActiveWindow, ScheduleConfig};
use crate::pipeline::{CycleReport, SharedDetector};

/// What happened on one timer tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Outside the active window; nothing ran
    Skipped,
    Completed(CycleReport),
    Failed(String),
    /// The cycle task panicked; the loop keeps going
    Panicked,
}

/// Runs detection cycles on a fixed interval.
pub struct Scheduler {
    detector: SharedDetector,
    interval: Duration,
    window: Option<ActiveWindow>,
}

impl Scheduler {
    pub fn new(detector: SharedDetector, config: &ScheduleConfig) -> Self {
        Self {
            detector,
            interval: Duration::from_secs(config.interval_secs.max(1)),
            window: config.enforce_window.then(|| config.window.clone()),
        }
    }

    /// Whether a tick at `now` should run a cycle.
    pub fn is_active<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> bool {
        self.window
            .as_ref()
            .is_none_or(|window| window.contains(now))
    }

    /// Run one tick against the local clock.
    pub async fn tick(&self) -> TickOutcome {
        self.tick_at(&Local::now()).await
    }

    async fn tick_at<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> TickOutcome {
        if !self.is_active(now) {
            log::debug!("Outside active window, skipping check");
            return TickOutcome::Skipped;
        }

        let detector = self.detector.clone();
        let handle = tokio::spawn(async move { detector.run_cycle().await });

        match handle.await {
            Ok(Ok(report)) => {
                log::info!("Check complete: {}", report.summary());
                TickOutcome::Completed(report)
            }
            Ok(Err(e)) => {
                log::error!("Check failed: {}", e);
                TickOutcome::Failed(e.to_string())
            }
            Err(e) if e.is_panic() => {
                log::error!("Check panicked; continuing with the next tick");
                TickOutcome::Panicked
            }
            Err(e) => {
                log::error!("Check task did not finish: {}", e);
                TickOutcome::Failed(e.to_string())
            }
        }
    }

    /// Tick until `shutdown` resolves. The first tick fires immediately.
    ///
    /// A cycle already in progress is allowed to finish before returning.
    pub async fn run<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        log::info!(
            "Watching every {}s{}",
            self.interval.as_secs(),
            if self.window.is_some() {
                " within the active window"
            } else {
                ""
            }
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    log::info!("Shutdown requested, stopping watch loop");
                    break;
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Availability;
    use crate::pipeline::testing::{
        MemoryStore, RecordingSink, StubFetcher, catalog_html, detector, test_config,
    };
    use chrono::FixedOffset;
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    async fn scheduler(
        config: &ScheduleConfig,
        fetcher: Arc<StubFetcher>,
        sink: Arc<RecordingSink>,
    ) -> Scheduler {
        let detector = detector(
            &test_config(),
            fetcher,
            Arc::new(MemoryStore::default()),
            sink,
        )
        .await;
        Scheduler::new(SharedDetector::new(detector), config)
    }

    fn at(day: u32, hour: u32) -> DateTime<FixedOffset> {
        // June 2025: the 1st is a Sunday, the 2nd a Monday
        FixedOffset::east_opt(3 * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 6, day, hour, 0, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn skips_outside_window_without_fetching() {
        let fetcher = StubFetcher::serving(catalog_html(&[("/a.html", Availability::InStock)]));
        let sink = Arc::new(RecordingSink::default());
        let scheduler = scheduler(&ScheduleConfig::default(), fetcher.clone(), sink.clone()).await;

        assert_eq!(scheduler.tick_at(&at(1, 12)).await, TickOutcome::Skipped);
        assert_eq!(scheduler.tick_at(&at(2, 7)).await, TickOutcome::Skipped);
        assert_eq!(scheduler.tick_at(&at(2, 23)).await, TickOutcome::Skipped);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);

        let outcome = scheduler.tick_at(&at(2, 8)).await;
        assert!(matches!(outcome, TickOutcome::Completed(ref r) if r.new_items == 1));
        assert_eq!(sink.messages().len(), 1);
    }

    #[tokio::test]
    async fn window_can_be_disabled() {
        let config = ScheduleConfig {
            enforce_window: false,
            ..ScheduleConfig::default()
        };
        let fetcher = StubFetcher::serving(catalog_html(&[]));
        let scheduler = scheduler(&config, fetcher, Arc::new(RecordingSink::default())).await;

        assert!(scheduler.is_active(&at(1, 3)));
    }

    #[tokio::test]
    async fn panicking_cycle_does_not_stop_later_ticks() {
        let config = ScheduleConfig {
            enforce_window: false,
            ..ScheduleConfig::default()
        };
        let fetcher = StubFetcher::serving(catalog_html(&[("/a.html", Availability::InStock)]));
        let sink = Arc::new(RecordingSink::default());
        let scheduler = scheduler(&config, fetcher.clone(), sink.clone()).await;

        fetcher.panic.store(true, Ordering::SeqCst);
        assert_eq!(scheduler.tick().await, TickOutcome::Panicked);

        fetcher.panic.store(false, Ordering::SeqCst);
        let outcome = scheduler.tick().await;
        assert!(matches!(outcome, TickOutcome::Completed(ref r) if r.new_items == 1));
        assert_eq!(sink.messages().len(), 1);
    }

    #[tokio::test]
    async fn failed_cycle_is_reported() {
        let config = ScheduleConfig {
            enforce_window: false,
            ..ScheduleConfig::default()
        };
        let fetcher = StubFetcher::serving(String::new());
        fetcher.set(Err(crate::error::FetchError::transient("connection reset")));
        let scheduler = scheduler(&config, fetcher, Arc::new(RecordingSink::default())).await;

        assert!(matches!(scheduler.tick().await, TickOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn run_fires_immediately_and_stops_on_shutdown() {
        let config = ScheduleConfig {
            interval_secs: 3600,
            enforce_window: false,
            ..ScheduleConfig::default()
        };
        let fetcher = StubFetcher::serving(catalog_html(&[
            ("/a.html", Availability::InStock),
            ("/b.html", Availability::OutOfStock),
        ]));
        let sink = Arc::new(RecordingSink::default());
        let scheduler = scheduler(&config, fetcher.clone(), sink.clone()).await;

        scheduler
            .run(tokio::time::sleep(Duration::from_millis(200)))
            .await;

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(sink.messages().len(), 2);
    }
}
