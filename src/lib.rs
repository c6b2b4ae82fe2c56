//! # naver-scraper
//!
//! A resilient scraper for paginated product listings.
//!
//! Every request leaves through the next proxy of a round-robin pool and
//! presents a freshly randomized header fingerprint. Transient failures are
//! retried with jittered backoff, and pages are walked sequentially with
//! jittered pacing until the listing runs out or the page limit is hit.
//!
//! - Proxy rotation with an atomic cursor
//! - Per-request fingerprint randomization
//! - Bounded, iterative retry with jitter
//! - Tolerant normalization of raw listing entries
//! - An axum front door with validation and rate limiting
//!
//! ## Example
//!
//! ```rust,no_run
//! use naver_scraper::{Scraper, ScraperConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ScraperConfig::from_env()?;
//!     let scraper = Scraper::from_config(&config)?;
//!
//!     let result = scraper
//!         .run("https://search.shopping.naver.com/api/search?query=keyboard", 5)
//!         .await;
//!
//!     for product in result.products() {
//!         println!("{}: {} ({})", product.id, product.title, product.price);
//!     }
//!     Ok(())
//! }
//! ```

mod error;
mod result;
mod scanner;
mod scrape;

pub mod config;
pub mod fetcher;
pub mod fingerprint;
pub mod proxy;
pub mod random;
pub mod server;
pub mod transport;
pub mod validation;

pub use config::ScraperConfig;
pub use error::{Result, ScrapeError};
pub use fetcher::{PageFetcher, RetryingFetcher};
pub use fingerprint::{FingerprintGenerator, FingerprintProfile};
pub use proxy::{ProxyEndpoint, ProxyRotator};
pub use random::{DelayRange, RandomSource, ThreadRandom};
pub use result::{PageOutcome, Product, ScrapeResult};
pub use scanner::PageScanner;
pub use scrape::{PageRequest, Scraper, CURSOR_PARAM};
pub use transport::{HttpTransport, Transport};
