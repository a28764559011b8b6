//! In-memory collaborators for pipeline tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{DeliveryError, FetchError, PersistError};
use crate::models::{Availability, CatalogSelectors, Config, KnownState, MessageTemplates};
use crate::pipeline::ChangeDetector;
use crate::services::{CatalogExtractor, Fetcher, NotificationSink};
use crate::storage::StateStore;

/// Catalog page listing `items` as `(relative link, availability)`.
pub fn catalog_html(items: &[(&str, Availability)]) -> String {
    let products: String = items
        .iter()
        .map(|(key, availability)| {
            let basket = match availability {
                Availability::InStock => r#"<span class="main-basked-icon add2cart"></span>"#,
                Availability::OutOfStock => {
                    r#"<span class="main-basked-icon gray" title="Вибачте товару немає"></span>"#
                }
                Availability::Unknown => "",
            };
            format!(
                r#"<div class="p_description"><div class="product__name"><a class="model_product" href="{key}">Coin {key}</a></div><span class="new_price">100 грн</span>{basket}</div>"#
            )
        })
        .collect();
    format!("<html><body>{products}</body></html>")
}

pub const DETAILS_HTML: &str =
    r#"<div class="basked_product_bank"><p>5 000</p><p>2025</p><p>срібло</p></div>"#;

/// Serves the current catalog page for URLs containing "catalog" and a
/// fixed details page for everything else.
pub struct StubFetcher {
    page: Mutex<Result<String, FetchError>>,
    pub calls: AtomicUsize,
    pub panic: AtomicBool,
}

impl StubFetcher {
    pub fn serving(html: String) -> Arc<Self> {
        Arc::new(Self {
            page: Mutex::new(Ok(html)),
            calls: AtomicUsize::new(0),
            panic: AtomicBool::new(false),
        })
    }

    pub fn set(&self, page: Result<String, FetchError>) {
        *self.page.lock().unwrap() = page;
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.panic.load(Ordering::SeqCst) {
            panic!("fetcher exploded");
        }
        if url.contains("catalog") {
            self.page.lock().unwrap().clone()
        } else {
            Ok(DETAILS_HTML.to_string())
        }
    }
}

/// State store that keeps every save and can be told to fail.
#[derive(Default)]
pub struct MemoryStore {
    pub initial: KnownState,
    pub saved: Mutex<Vec<KnownState>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl StateStore for Arc<MemoryStore> {
    async fn load(&self) -> KnownState {
        self.initial.clone()
    }

    async fn save(&self, state: &KnownState) -> Result<(), PersistError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PersistError::Io(std::io::Error::other("disk full")));
        }
        self.saved.lock().unwrap().push(state.clone());
        Ok(())
    }
}

/// Records delivered messages; rejects those containing `fail_on`.
#[derive(Default)]
pub struct RecordingSink {
    pub messages: Mutex<Vec<String>>,
    pub fail_on: Option<String>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for Arc<RecordingSink> {
    async fn deliver(&self, text: &str) -> Result<(), DeliveryError> {
        if self
            .fail_on
            .as_deref()
            .is_some_and(|needle| text.contains(needle))
        {
            return Err(DeliveryError::transient("chat unavailable"));
        }
        self.messages.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Default config with bare templates that are easy to assert on.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.notify.templates = MessageTemplates {
        new_item: "NEW {name}".to_string(),
        status_changed: "CHANGED {name} {status}".to_string(),
    };
    config
}

pub fn extractor(config: &Config) -> Arc<CatalogExtractor> {
    Arc::new(CatalogExtractor::new(&CatalogSelectors::default(), &config.catalog.base_url).unwrap())
}

pub async fn detector(
    config: &Config,
    fetcher: Arc<StubFetcher>,
    store: Arc<MemoryStore>,
    sink: Arc<RecordingSink>,
) -> ChangeDetector {
    ChangeDetector::open(
        config,
        fetcher,
        extractor(config),
        Box::new(store),
        Arc::new(sink),
    )
    .await
}
