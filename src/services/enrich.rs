// src/services/enrich.rs

//! Detail-page enrichment.
//!
//! Fetches item pages concurrently, bounded by the batch width. Results come
//! back in input order and a failed lookup only affects its own entry.

use futures::stream::{self, StreamExt};

use crate::models::{CatalogEntry, CoinDetails};
use crate::services::{CatalogExtractor, Fetcher};

/// Fetch details for every entry; `None` where the lookup failed.
pub async fn enrich_entries<'a, I>(
    fetcher: &dyn Fetcher,
    extractor: &CatalogExtractor,
    entries: I,
    batch_size: usize,
) -> Vec<Option<CoinDetails>>
where
    I: IntoIterator<Item = &'a CatalogEntry>,
{
    let lookups: Vec<_> = entries
        .into_iter()
        .map(|entry| lookup_details(fetcher, extractor, entry))
        .collect();

    stream::iter(lookups)
        .buffered(batch_size.max(1))
        .collect()
        .await
}

async fn lookup_details(
    fetcher: &dyn Fetcher,
    extractor: &CatalogExtractor,
    entry: &CatalogEntry,
) -> Option<CoinDetails> {
    match fetcher.fetch(&entry.detail_link).await {
        Ok(html) => Some(extractor.extract_details(&html)),
        Err(error) => {
            log::warn!(
                "Failed to fetch details for {} ({}): {}",
                entry.display_name,
                entry.detail_link,
                error
            );
            None
        }
    }
}
