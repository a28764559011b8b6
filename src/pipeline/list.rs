// src/pipeline/list.rs

//! Catalog listing. Read-only: the known state is never touched.

use crate::error::Result;
use crate::models::{CatalogEntry, CoinDetails};
use crate::services::{CatalogExtractor, Fetcher, enrich_entries};
use crate::utils::log;

/// One catalog line, optionally with detail-page data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub entry: CatalogEntry,
    pub details: Option<CoinDetails>,
}

impl Listing {
    /// Single-line rendering for terminal output.
    pub fn line(&self) -> String {
        let mut line = format!(
            "{} | {} | {} | {}",
            self.entry.display_name,
            self.entry.price,
            self.entry.availability.label(),
            self.entry.detail_link
        );
        if let Some(details) = &self.details {
            for (label, value) in details.fields() {
                line.push_str(&format!(" | {label}: {value}"));
            }
        }
        line
    }
}

/// Fetch the catalog and return its entries in page order.
///
/// With `batch_size`, every entry is enriched from its detail page.
pub async fn run_list(
    catalog_url: &str,
    fetcher: &dyn Fetcher,
    extractor: &CatalogExtractor,
    batch_size: Option<usize>,
) -> Result<Vec<Listing>> {
    log::header("Catalog listing");

    let html = fetcher.fetch(catalog_url).await?;
    let entries = extractor.extract_entries(&html);
    if entries.is_empty() {
        ::log::warn!(
            "No catalog entries found. Page: {}",
            log::preview(&html, 300)
        );
        return Ok(Vec::new());
    }

    let details = match batch_size {
        Some(batch_size) => enrich_entries(fetcher, extractor, &entries, batch_size).await,
        None => vec![None; entries.len()],
    };

    let listings: Vec<Listing> = entries
        .into_iter()
        .zip(details)
        .map(|(entry, details)| Listing { entry, details })
        .collect();

    for listing in &listings {
        log::sub_item(&listing.line());
    }
    ::log::info!("{} item(s) listed", listings.len());

    Ok(listings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, FetchError};
    use crate::models::Availability;
    use crate::pipeline::testing::{StubFetcher, catalog_html, extractor, test_config};
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn lists_entries_in_page_order() {
        let config = test_config();
        let fetcher = StubFetcher::serving(catalog_html(&[
            ("/b.html", Availability::OutOfStock),
            ("/a.html", Availability::InStock),
        ]));

        let listings = run_list(
            &config.catalog.url,
            fetcher.as_ref(),
            &extractor(&config),
            None,
        )
        .await
        .unwrap();

        let keys: Vec<&str> = listings.iter().map(|l| l.entry.key.as_str()).collect();
        assert_eq!(keys, vec!["/b.html", "/a.html"]);
        assert!(listings.iter().all(|l| l.details.is_none()));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            listings[1].line(),
            "Coin /a.html | 100 грн | В наявності | https://coins.bank.gov.ua/a.html"
        );
    }

    #[tokio::test]
    async fn details_are_fetched_per_entry() {
        let config = test_config();
        let fetcher = StubFetcher::serving(catalog_html(&[
            ("/a.html", Availability::InStock),
            ("/b.html", Availability::InStock),
        ]));

        let listings = run_list(
            &config.catalog.url,
            fetcher.as_ref(),
            &extractor(&config),
            Some(5),
        )
        .await
        .unwrap();

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
        let details = listings[0].details.as_ref().unwrap();
        assert_eq!(details.year, "2025");
        assert!(listings[0].line().ends_with(" | Рік: 2025 | Матеріал: срібло"));
    }

    #[tokio::test]
    async fn fetch_failure_is_an_error() {
        let config = test_config();
        let fetcher = StubFetcher::serving(String::new());
        fetcher.set(Err(FetchError::transient("timeout")));

        let result = run_list(
            &config.catalog.url,
            fetcher.as_ref(),
            &extractor(&config),
            None,
        )
        .await;

        assert!(matches!(result, Err(AppError::Fetch(_))));
    }
}
