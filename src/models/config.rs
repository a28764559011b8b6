//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{ActiveWindow, CatalogSelectors};

/// Environment variable holding the rendering-proxy API key.
pub const ENV_PROXY_API_KEY: &str = "ZEN_API_KEY";
/// Environment variable holding the Telegram bot token.
pub const ENV_TELEGRAM_TOKEN: &str = "TELEGRAM_TOKEN";
/// Environment variable holding the recipient chat id.
pub const ENV_CHAT_ID: &str = "CHAT_ID";

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Catalog location and markup layout
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// HTTP and retry behavior
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Optional rendering/proxy service
    #[serde(default)]
    pub proxy: ProxyConfig,

    /// Known-state persistence
    #[serde(default)]
    pub storage: StorageConfig,

    /// Timer and operating window
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Change detector tuning
    #[serde(default)]
    pub detector: DetectorConfig,

    /// Detail-page enrichment
    #[serde(default)]
    pub enrich: EnrichConfig,

    /// Messaging channel and message templates
    #[serde(default)]
    pub notify: NotifyConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Fill secrets from the process environment when set.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty(ENV_PROXY_API_KEY) {
            self.proxy.api_key = Some(key);
        }
        if let Some(token) = non_empty(ENV_TELEGRAM_TOKEN) {
            self.notify.telegram.token = Some(token);
        }
        if let Some(chat_id) = non_empty(ENV_CHAT_ID) {
            self.notify.telegram.chat_id = Some(chat_id);
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.catalog.url)
            .map_err(|e| AppError::validation(format!("catalog.url: {e}")))?;
        url::Url::parse(&self.catalog.base_url)
            .map_err(|e| AppError::validation(format!("catalog.base_url: {e}")))?;
        if self.catalog.selectors.marker.trim().is_empty() {
            return Err(AppError::validation("catalog.selectors.marker is empty"));
        }
        if self.fetch.user_agent.trim().is_empty() {
            return Err(AppError::validation("fetch.user_agent is empty"));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(AppError::validation("fetch.timeout_secs must be > 0"));
        }
        if self.fetch.max_attempts == 0 {
            return Err(AppError::validation("fetch.max_attempts must be > 0"));
        }
        if self.proxy.api_key.is_some() {
            url::Url::parse(&self.proxy.endpoint)
                .map_err(|e| AppError::validation(format!("proxy.endpoint: {e}")))?;
        }
        if self.schedule.interval_secs == 0 {
            return Err(AppError::validation("schedule.interval_secs must be > 0"));
        }
        let window = &self.schedule.window;
        if window.start_hour >= window.end_hour || window.end_hour > 24 {
            return Err(AppError::validation(
                "schedule.window hours must satisfy start_hour < end_hour <= 24",
            ));
        }
        if self.enrich.batch_size == 0 {
            return Err(AppError::validation("enrich.batch_size must be > 0"));
        }
        if self.notify.telegram.max_attempts == 0 {
            return Err(AppError::validation(
                "notify.telegram.max_attempts must be > 0",
            ));
        }
        Ok(())
    }
}

/// Where the catalog lives and how it is laid out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Listing page to watch
    #[serde(default = "defaults::catalog_url")]
    pub url: String,

    /// Base for resolving relative item links
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    #[serde(default)]
    pub selectors: CatalogSelectors,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: defaults::catalog_url(),
            base_url: defaults::base_url(),
            selectors: CatalogSelectors::default(),
        }
    }
}

/// HTTP client and retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Browser-like User-Agent header
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Accept-Language header
    #[serde(default = "defaults::accept_language")]
    pub accept_language: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Attempts per fetch, including the first
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Delay after a non-2xx response
    #[serde(default = "defaults::retry_delay")]
    pub retry_delay_ms: u64,

    /// Delay after a 429 response
    #[serde(default = "defaults::rate_limit_delay")]
    pub rate_limit_delay_ms: u64,

    /// Delay after a transport error or empty body
    #[serde(default = "defaults::network_error_delay")]
    pub network_error_delay_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            accept_language: defaults::accept_language(),
            timeout_secs: defaults::timeout(),
            max_attempts: defaults::max_attempts(),
            retry_delay_ms: defaults::retry_delay(),
            rate_limit_delay_ms: defaults::rate_limit_delay(),
            network_error_delay_ms: defaults::network_error_delay(),
        }
    }
}

/// Rendering/proxy API settings. Without an API key pages are fetched directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default = "defaults::proxy_endpoint")]
    pub endpoint: String,

    /// Overridden by `ZEN_API_KEY`
    #[serde(default)]
    pub api_key: Option<String>,

    /// Query parameter carrying the API key
    #[serde(default = "defaults::proxy_key_param")]
    pub key_param: String,

    /// Query parameter carrying the target URL
    #[serde(default = "defaults::proxy_url_param")]
    pub url_param: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::proxy_endpoint(),
            api_key: None,
            key_param: defaults::proxy_key_param(),
            url_param: defaults::proxy_url_param(),
        }
    }
}

/// Known-state file location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "defaults::state_file")]
    pub state_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_file: defaults::state_file(),
        }
    }
}

/// Timer settings for `watch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Seconds between scheduled cycles
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,

    /// Skip ticks outside `window`
    #[serde(default = "defaults::enforce_window")]
    pub enforce_window: bool,

    #[serde(default)]
    pub window: ActiveWindow,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::interval(),
            enforce_window: defaults::enforce_window(),
            window: ActiveWindow::default(),
        }
    }
}

/// Change detector tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Consecutive empty extractions before logging at error level
    #[serde(default = "defaults::empty_alert_after")]
    pub empty_alert_after: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            empty_alert_after: defaults::empty_alert_after(),
        }
    }
}

/// Detail-page lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichConfig {
    /// Fetch item pages for change notifications
    #[serde(default)]
    pub on_notify: bool,

    /// Concurrent detail fetches
    #[serde(default = "defaults::batch_size")]
    pub batch_size: usize,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            on_notify: false,
            batch_size: defaults::batch_size(),
        }
    }
}

/// Messaging channel settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NotifyConfig {
    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub templates: MessageTemplates,
}

/// Telegram Bot API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default = "defaults::telegram_api_base")]
    pub api_base: String,

    /// Overridden by `TELEGRAM_TOKEN`
    #[serde(default)]
    pub token: Option<String>,

    /// Overridden by `CHAT_ID`
    #[serde(default)]
    pub chat_id: Option<String>,

    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "defaults::telegram_retry_delay")]
    pub retry_delay_ms: u64,
}

impl TelegramConfig {
    pub fn is_configured(&self) -> bool {
        self.token.is_some() && self.chat_id.is_some()
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: defaults::telegram_api_base(),
            token: None,
            chat_id: None,
            max_attempts: defaults::max_attempts(),
            retry_delay_ms: defaults::telegram_retry_delay(),
        }
    }
}

/// Message templates, see `ChangeEvent::render` for placeholders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageTemplates {
    #[serde(default = "defaults::new_item_template")]
    pub new_item: String,

    #[serde(default = "defaults::status_changed_template")]
    pub status_changed: String,
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self {
            new_item: defaults::new_item_template(),
            status_changed: defaults::status_changed_template(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Catalog defaults
    pub fn catalog_url() -> String {
        "https://coins.bank.gov.ua/catalog.html".into()
    }
    pub fn base_url() -> String {
        "https://coins.bank.gov.ua".into()
    }

    // Fetch defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".into()
    }
    pub fn accept_language() -> String {
        "uk-UA,uk;q=0.9,en;q=0.8".into()
    }
    pub fn timeout() -> u64 {
        60
    }
    pub fn max_attempts() -> u32 {
        3
    }
    pub fn retry_delay() -> u64 {
        1000
    }
    pub fn rate_limit_delay() -> u64 {
        3000
    }
    pub fn network_error_delay() -> u64 {
        1500
    }

    // Proxy defaults
    pub fn proxy_endpoint() -> String {
        "https://api.zenscrape.com/v1/get".into()
    }
    pub fn proxy_key_param() -> String {
        "apikey".into()
    }
    pub fn proxy_url_param() -> String {
        "url".into()
    }

    // Storage defaults
    pub fn state_file() -> PathBuf {
        PathBuf::from("data/knownCoins.json")
    }

    // Schedule defaults
    pub fn interval() -> u64 {
        30 * 60
    }
    pub fn enforce_window() -> bool {
        true
    }

    pub fn empty_alert_after() -> u32 {
        3
    }

    pub fn batch_size() -> usize {
        5
    }

    // Notify defaults
    pub fn telegram_api_base() -> String {
        "https://api.telegram.org".into()
    }
    pub fn telegram_retry_delay() -> u64 {
        5000
    }
    pub fn new_item_template() -> String {
        "<b>🆕 Нова монета!</b>\n<a href=\"{link}\">{name}</a>\nЦіна: {price}\nСтатус: {status}"
            .into()
    }
    pub fn status_changed_template() -> String {
        "<b>🔄 Зміна статусу</b>\n<a href=\"{link}\">{name}</a>\n{previous} → {status}\nЦіна: {price}"
            .into()
    }
}
