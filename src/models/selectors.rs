// src/models/selectors.rs

//! CSS selectors and markers for scraping the catalog.

use serde::{Deserialize, Serialize};

/// Selectors describing the catalog listing and item page layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSelectors {
    /// Raw substring whose absence marks the page as unusable
    #[serde(default = "defaults::marker")]
    pub marker: String,

    /// Selector for each product name element
    #[serde(default = "defaults::product_name")]
    pub product_name: String,

    /// Selector for the description container enclosing a product name
    #[serde(default = "defaults::container")]
    pub container: String,

    /// Selector for the name/link anchor within the container
    #[serde(default = "defaults::link")]
    pub link: String,

    /// HTML attribute holding the relative link
    #[serde(default = "defaults::link_attr")]
    pub link_attr: String,

    /// Selector for the price element within the container
    #[serde(default = "defaults::price")]
    pub price: String,

    /// Selector for the basket icon within the container
    #[serde(default = "defaults::basket")]
    pub basket: String,

    /// Basket class meaning "can be added to cart"
    #[serde(default = "defaults::in_stock_class")]
    pub in_stock_class: String,

    /// Basket class meaning "disabled"
    #[serde(default = "defaults::disabled_class")]
    pub disabled_class: String,

    /// Tooltip fragment that confirms a disabled basket is out of stock
    #[serde(default = "defaults::out_of_stock_title")]
    pub out_of_stock_title: String,

    /// Selector for the attribute paragraphs on an item page
    #[serde(default = "defaults::details")]
    pub details: String,
}

impl Default for CatalogSelectors {
    fn default() -> Self {
        Self {
            marker: defaults::marker(),
            product_name: defaults::product_name(),
            container: defaults::container(),
            link: defaults::link(),
            link_attr: defaults::link_attr(),
            price: defaults::price(),
            basket: defaults::basket(),
            in_stock_class: defaults::in_stock_class(),
            disabled_class: defaults::disabled_class(),
            out_of_stock_title: defaults::out_of_stock_title(),
            details: defaults::details(),
        }
    }
}

mod defaults {
    pub fn marker() -> String {
        "product__name".into()
    }
    pub fn product_name() -> String {
        ".product__name".into()
    }
    pub fn container() -> String {
        "div.p_description".into()
    }
    pub fn link() -> String {
        "a.model_product".into()
    }
    pub fn link_attr() -> String {
        "href".into()
    }
    pub fn price() -> String {
        "span.new_price".into()
    }
    pub fn basket() -> String {
        "span.main-basked-icon".into()
    }
    pub fn in_stock_class() -> String {
        "add2cart".into()
    }
    pub fn disabled_class() -> String {
        "gray".into()
    }
    pub fn out_of_stock_title() -> String {
        "Вибачте товару немає".into()
    }
    pub fn details() -> String {
        ".basked_product_bank p".into()
    }
}
