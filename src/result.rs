//! Product and scrape result types.

use serde::{Deserialize, Serialize};

use crate::ScrapeError;

/// A normalized product listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub title: String,
    /// Price in the listing currency, discounted when a discount applies.
    pub price: f64,
    pub image_url: String,
    pub shop_name: String,
    pub rating: f64,
    pub review_count: u64,
    pub product_url: String,
}

/// What one page iteration produced.
#[derive(Debug)]
pub enum PageOutcome {
    /// The page yielded this many products.
    Products(usize),
    /// The page parsed but held no products; pagination ends here.
    Empty,
    /// Every attempt to fetch the page failed; the page contributes nothing.
    Failed(ScrapeError),
}

impl PageOutcome {
    /// Returns whether pagination should stop after this page.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PageOutcome::Empty)
    }
}

/// Final result of one scrape invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Product>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub latency_ms: u64,
    pub pages_scraped: u32,
    pub total_results: usize,
}

impl ScrapeResult {
    /// A finished scrape, possibly with some pages having failed.
    pub fn completed(products: Vec<Product>, pages_scraped: u32, latency_ms: u64) -> Self {
        Self {
            success: true,
            total_results: products.len(),
            data: Some(products),
            error: None,
            latency_ms,
            pages_scraped,
        }
    }

    /// An aborted scrape. Products gathered before the failure are kept.
    pub fn failed(
        error: impl Into<String>,
        partial: Vec<Product>,
        pages_scraped: u32,
        latency_ms: u64,
    ) -> Self {
        Self {
            success: false,
            total_results: partial.len(),
            data: Some(partial),
            error: Some(error.into()),
            latency_ms,
            pages_scraped,
        }
    }

    /// Returns the products, or an empty slice when absent.
    pub fn products(&self) -> &[Product] {
        self.data.as_deref().unwrap_or(&[])
    }

    /// Mean latency per scraped page in milliseconds.
    pub fn average_latency_per_page(&self) -> f64 {
        if self.pages_scraped == 0 {
            0.0
        } else {
            self.latency_ms as f64 / self.pages_scraped as f64
        }
    }
}
