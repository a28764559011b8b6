// src/models/mod.rs

//! Domain models for the catalog watcher.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod entry;
mod event;
mod selectors;
mod state;
mod window;

// Re-export all public types
pub use config::{
    CatalogConfig, Config, DetectorConfig, ENV_CHAT_ID, ENV_PROXY_API_KEY, ENV_TELEGRAM_TOKEN,
    EnrichConfig, FetchConfig, MessageTemplates, NotifyConfig, ProxyConfig, ScheduleConfig,
    StorageConfig, TelegramConfig,
};
pub use entry::{Availability, CatalogEntry, CoinDetails};
pub use event::{ChangeEvent, escape_html};
pub use selectors::CatalogSelectors;
pub use state::{KnownEntry, KnownState, StateCounts};
pub use window::ActiveWindow;
