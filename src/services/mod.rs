//! Service layer for the catalog watcher.
//!
//! This module contains the collaborators of the change detector:
//! - Page retrieval (`Fetcher`, `HttpFetcher`)
//! - Markup parsing (`CatalogExtractor`)
//! - Detail lookups in bounded batches (`enrich_entries`)
//! - Message delivery (`NotificationSink`, `TelegramSink`, `LogSink`)

mod enrich;
mod extract;
mod fetch;
mod notify;

pub use enrich::enrich_entries;
pub use extract::CatalogExtractor;
pub use fetch::{FetchRoute, Fetcher, HttpFetcher};
pub use notify::{LogSink, NotificationSink, TelegramSink};
