// src/services/extract.rs

//! Record extractor.
//!
//! Turns catalog markup into `CatalogEntry` values and item pages into
//! `CoinDetails`, using configured CSS selectors.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, ParseError, Result};
use crate::models::{Availability, CatalogEntry, CatalogSelectors, CoinDetails};
use crate::utils::{normalize_whitespace, resolve_url};

/// Parsed selectors for the catalog layout.
#[derive(Debug, Clone)]
pub struct CatalogExtractor {
    marker: String,
    product_name: Selector,
    container: Selector,
    link: Selector,
    link_attr: String,
    price: Selector,
    basket: Selector,
    in_stock_class: String,
    disabled_class: String,
    out_of_stock_title: String,
    details: Selector,
    base_url: Url,
}

impl CatalogExtractor {
    /// Compile the configured selectors.
    pub fn new(selectors: &CatalogSelectors, base_url: &str) -> Result<Self> {
        Ok(Self {
            marker: selectors.marker.clone(),
            product_name: Self::parse_selector(&selectors.product_name)?,
            container: Self::parse_selector(&selectors.container)?,
            link: Self::parse_selector(&selectors.link)?,
            link_attr: selectors.link_attr.clone(),
            price: Self::parse_selector(&selectors.price)?,
            basket: Self::parse_selector(&selectors.basket)?,
            in_stock_class: selectors.in_stock_class.clone(),
            disabled_class: selectors.disabled_class.clone(),
            out_of_stock_title: selectors.out_of_stock_title.clone(),
            details: Self::parse_selector(&selectors.details)?,
            base_url: Url::parse(base_url)
                .map_err(|e| AppError::validation(format!("catalog.base_url: {e}")))?,
        })
    }

    /// Extract listed entries in document order.
    ///
    /// Pages without the listing marker yield no entries.
    pub fn extract_entries(&self, html: &str) -> Vec<CatalogEntry> {
        self.try_extract_entries(html).unwrap_or_default()
    }

    /// Like `extract_entries`, but reports a missing listing marker.
    pub fn try_extract_entries(
        &self,
        html: &str,
    ) -> std::result::Result<Vec<CatalogEntry>, ParseError> {
        if !html.contains(&self.marker) {
            return Err(ParseError::MissingMarker {
                marker: self.marker.clone(),
            });
        }

        let document = Html::parse_document(html);
        let entries = document
            .select(&self.product_name)
            .filter_map(|name_elem| self.enclosing_container(name_elem))
            .filter_map(|container| self.parse_entry(container))
            .collect();
        Ok(entries)
    }

    /// Extract the attribute paragraphs of an item page.
    ///
    /// Four or more paragraphs map to denomination, mintage, year, material;
    /// fewer map to mintage, year, material. Missing positions stay empty.
    pub fn extract_details(&self, html: &str) -> CoinDetails {
        let document = Html::parse_document(html);
        let params: Vec<String> = document
            .select(&self.details)
            .map(|p| normalize_whitespace(&p.text().collect::<String>()))
            .collect();

        let at = |i: usize| params.get(i).cloned().unwrap_or_default();
        if params.len() >= 4 {
            CoinDetails {
                denomination: at(0),
                mintage: at(1),
                year: at(2),
                material: at(3),
            }
        } else {
            CoinDetails {
                denomination: String::new(),
                mintage: at(0),
                year: at(1),
                material: at(2),
            }
        }
    }

    fn enclosing_container<'a>(&self, elem: ElementRef<'a>) -> Option<ElementRef<'a>> {
        elem.ancestors()
            .filter_map(ElementRef::wrap)
            .find(|ancestor| self.container.matches(ancestor))
    }

    fn parse_entry(&self, container: ElementRef<'_>) -> Option<CatalogEntry> {
        let link_elem = container.select(&self.link).next()?;
        let display_name = normalize_whitespace(&link_elem.text().collect::<String>());
        let key = link_elem
            .value()
            .attr(&self.link_attr)
            .unwrap_or("")
            .trim()
            .to_string();
        let price = container
            .select(&self.price)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        if display_name.is_empty() || key.is_empty() || price.is_empty() {
            log::debug!(
                "Skipping incomplete entry (name={:?}, link={:?}, price={:?})",
                display_name,
                key,
                price
            );
            return None;
        }

        let availability = container
            .select(&self.basket)
            .next()
            .map(|basket| self.availability_of(basket))
            .unwrap_or(Availability::Unknown);
        let detail_link = resolve_url(&self.base_url, &key);

        Some(CatalogEntry {
            key,
            display_name,
            price,
            availability,
            detail_link,
        })
    }

    fn availability_of(&self, basket: ElementRef<'_>) -> Availability {
        let element = basket.value();
        let has_class = |name: &str| element.classes().any(|c| c == name);

        if has_class(&self.in_stock_class) {
            Availability::InStock
        } else if has_class(&self.disabled_class)
            && element
                .attr("title")
                .is_some_and(|title| title.contains(&self.out_of_stock_title))
        {
            Availability::OutOfStock
        } else {
            Availability::Unknown
        }
    }

    fn parse_selector(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
    }
}
