//! Pagination orchestration.

use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::ScraperConfig;
use crate::fetcher::{PageFetcher, RetryingFetcher};
use crate::proxy::ProxyRotator;
use crate::random::{DelayRange, RandomSource, ThreadRandom};
use crate::result::{PageOutcome, Product, ScrapeResult};
use crate::scanner::PageScanner;
use crate::transport::HttpTransport;
use crate::Result;

/// Query parameter carrying the 1-based page number.
pub const CURSOR_PARAM: &str = "cursor";

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub target_url: String,
    pub page_number: u32,
}

impl PageRequest {
    pub fn new(target_url: impl Into<String>, page_number: u32) -> Self {
        Self {
            target_url: target_url.into(),
            page_number,
        }
    }

    /// Returns the target URL with `cursor` set to the page number.
    ///
    /// Other query pairs are kept. An unparseable target URL is returned
    /// unchanged.
    pub fn url(&self) -> String {
        let Ok(mut url) = Url::parse(&self.target_url) else {
            return self.target_url.clone();
        };

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != CURSOR_PARAM)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        url.query_pairs_mut()
            .clear()
            .extend_pairs(pairs)
            .append_pair(CURSOR_PARAM, &self.page_number.to_string());

        url.to_string()
    }
}

/// Walks result pages one at a time until exhaustion or the page limit.
///
/// A page whose fetch fails after all retries is logged and skipped; an
/// empty page ends pagination. Pages are fetched strictly in sequence with
/// a jittered pause between them.
pub struct Scraper {
    fetcher: Arc<dyn PageFetcher>,
    scanner: PageScanner,
    random: Arc<dyn RandomSource>,
    page_delay: DelayRange,
}

impl Scraper {
    /// Creates a scraper over the given fetcher with a 1-3s page delay.
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            scanner: PageScanner::new(),
            random: Arc::new(ThreadRandom),
            page_delay: DelayRange::new(1000, 3000),
        }
    }

    /// Wires the full proxied, retrying HTTP pipeline from configuration.
    pub fn from_config(config: &ScraperConfig) -> Result<Self> {
        config.validate()?;

        let proxies = Arc::new(ProxyRotator::new(config.proxies.clone())?);
        let transport = Arc::new(HttpTransport::new(config.request_timeout));
        let fetcher = RetryingFetcher::new(transport, proxies)
            .with_max_retries(config.max_retries)
            .with_retry_delay(config.retry_delay);

        Ok(Self::new(Arc::new(fetcher)).with_page_delay(config.page_delay))
    }

    /// Sets the random source for page delay jitter.
    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    /// Sets the bounds of the inter-page delay.
    pub fn with_page_delay(mut self, page_delay: DelayRange) -> Self {
        self.page_delay = page_delay;
        self
    }

    /// Scrapes up to `max_pages` pages of `target_url`.
    ///
    /// Always returns a result. `success` is false only when an error
    /// outside the per-page failure policy aborts the loop.
    ///
    /// The jittered page delay runs between pages only: it is skipped after
    /// an empty page and after page `max_pages`, since nothing follows either.
    pub async fn run(&self, target_url: &str, max_pages: u32) -> ScrapeResult {
        let start = Instant::now();
        let mut products = Vec::new();
        let mut pages_scraped = 0;

        info!("Starting scrape for: {} (max {} pages)", target_url, max_pages);

        for page in 1..=max_pages {
            let request = PageRequest::new(target_url, page);
            let outcome = match self.scrape_page(&request, &mut products).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Scraping failed on page {}: {}", page, e);
                    return ScrapeResult::failed(
                        e.to_string(),
                        products,
                        pages_scraped,
                        elapsed_ms(start),
                    );
                }
            };
            pages_scraped = page;

            match &outcome {
                PageOutcome::Products(count) => info!("Found {} products on page {}", count, page),
                PageOutcome::Empty => info!("No more products found on page {}", page),
                PageOutcome::Failed(e) => warn!("Failed page {}: {}", page, e),
            }

            if outcome.is_terminal() {
                break;
            }
            if page < max_pages {
                let delay = self.page_delay.sample(self.random.as_ref());
                debug!("Waiting {:?} before page {}", delay, page + 1);
                tokio::time::sleep(delay).await;
            }
        }

        let result = ScrapeResult::completed(products, pages_scraped, elapsed_ms(start));
        info!(
            "Scrape finished: {} products from {} pages in {}ms",
            result.total_results, result.pages_scraped, result.latency_ms
        );
        result
    }

    /// Fetches and scans one page, appending its products.
    ///
    /// Transient fetch failures become [`PageOutcome::Failed`]; any other
    /// error is returned and aborts the scrape.
    async fn scrape_page(&self, request: &PageRequest, products: &mut Vec<Product>) -> Result<PageOutcome> {
        let url = request.url();
        debug!("Scraping page {}: {}", request.page_number, url);

        match self.fetcher.fetch(&url).await {
            Ok(body) => {
                let found = self.scanner.scan(&body);
                if found.is_empty() {
                    return Ok(PageOutcome::Empty);
                }
                let count = found.len();
                products.extend(found);
                Ok(PageOutcome::Products(count))
            }
            Err(e) if e.is_transient() => Ok(PageOutcome::Failed(e)),
            Err(e) => Err(e),
        }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
