//! Catalog entry data structures.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether a catalog item can currently be bought.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    InStock,
    OutOfStock,
    Unknown,
}

impl Availability {
    /// Label shown to subscribers.
    pub fn label(&self) -> &'static str {
        match self {
            Availability::InStock => "В наявності",
            Availability::OutOfStock => "Відсутній",
            Availability::Unknown => "Невідомо",
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Availability::InStock => "in_stock",
            Availability::OutOfStock => "out_of_stock",
            Availability::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One listing scraped from the catalog page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Stable identity: the relative link exactly as listed
    pub key: String,

    /// Item name as displayed
    pub display_name: String,

    /// Formatted price text, never parsed
    pub price: String,

    /// Availability derived from the basket icon
    pub availability: Availability,

    /// Absolute URL of the item page
    pub detail_link: String,
}

/// Extended attributes read from an item page.
///
/// Empty strings stand for "not present on the page".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoinDetails {
    pub denomination: String,
    pub mintage: String,
    pub year: String,
    pub material: String,
}

impl CoinDetails {
    pub fn is_empty(&self) -> bool {
        self.denomination.is_empty()
            && self.mintage.is_empty()
            && self.year.is_empty()
            && self.material.is_empty()
    }

    /// Labelled, non-empty fields in display order.
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        [
            ("Номінал", self.denomination.as_str()),
            ("Тираж", self.mintage.as_str()),
            ("Рік", self.year.as_str()),
            ("Матеріал", self.material.as_str()),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .collect()
    }
}
