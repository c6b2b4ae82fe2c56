//! Scraper configuration loaded from the environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::proxy::ProxyEndpoint;
use crate::random::DelayRange;
use crate::{Result, ScrapeError};

/// Upper bound accepted for the page count of a single scrape.
pub const MAX_PAGES_LIMIT: u32 = 50;
/// Page count used when a request does not specify one.
pub const DEFAULT_PAGES: u32 = 20;

/// Resolved settings for the fetch engine and the front door.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Proxies in rotation order.
    pub proxies: Vec<ProxyEndpoint>,
    /// Retries after the first attempt of each page fetch.
    pub max_retries: u32,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Pause between pages.
    pub page_delay: DelayRange,
    /// Pause between retries of one request.
    pub retry_delay: DelayRange,
    /// Port the HTTP front door listens on.
    pub port: u16,
    /// Seconds to replenish one scrape request slot per client IP.
    pub scrape_limit_replenish_secs: u64,
    /// Scrape requests a client IP may burst before being limited.
    pub scrape_limit_burst: u32,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            proxies: vec![ProxyEndpoint::new("proxy.example.net", 9999, "scraper", "changeme")
                .with_country("kr")],
            max_retries: 3,
            request_timeout: Duration::from_millis(30_000),
            page_delay: DelayRange::new(1000, 3000),
            retry_delay: DelayRange::new(2000, 5000),
            port: 3001,
            scrape_limit_replenish_secs: 6,
            scrape_limit_burst: 10,
        }
    }
}

impl ScraperConfig {
    /// Loads configuration from environment variables, reading `.env` if present.
    ///
    /// Unparseable numbers fall back to their defaults. A malformed
    /// `PROXY_LIST` entry is an error.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();

        let proxies = match env::var("PROXY_LIST") {
            Ok(list) if !list.trim().is_empty() => list
                .split(',')
                .filter(|entry| !entry.trim().is_empty())
                .map(str::parse::<ProxyEndpoint>)
                .collect::<Result<Vec<ProxyEndpoint>>>()?,
            _ => {
                let fallback = &defaults.proxies[0];
                vec![ProxyEndpoint::new(
                    var_or("PROXY_HOST", &fallback.host),
                    parse_or("PROXY_PORT", fallback.port),
                    var_or("PROXY_USERNAME", &fallback.username),
                    var_or("PROXY_PASSWORD", &fallback.password),
                )
                .with_country(var_or("PROXY_COUNTRY", &fallback.country_code))]
            }
        };

        let config = Self {
            proxies,
            max_retries: parse_or("MAX_RETRIES", defaults.max_retries),
            request_timeout: Duration::from_millis(parse_or(
                "REQUEST_TIMEOUT",
                defaults.request_timeout.as_millis() as u64,
            )),
            page_delay: DelayRange::new(
                parse_or("PAGE_DELAY_MIN_MS", defaults.page_delay.min_ms),
                parse_or("PAGE_DELAY_MAX_MS", defaults.page_delay.max_ms),
            ),
            retry_delay: DelayRange::new(
                parse_or("RETRY_DELAY_MIN_MS", defaults.retry_delay.min_ms),
                parse_or("RETRY_DELAY_MAX_MS", defaults.retry_delay.max_ms),
            ),
            port: parse_or("PORT", defaults.port),
            scrape_limit_replenish_secs: parse_or(
                "SCRAPE_LIMIT_REPLENISH_SECS",
                defaults.scrape_limit_replenish_secs,
            ),
            scrape_limit_burst: parse_or("SCRAPE_LIMIT_BURST", defaults.scrape_limit_burst),
        };

        config.validate()?;
        Ok(config)
    }

    /// Replaces the proxy list.
    pub fn with_proxies(mut self, proxies: Vec<ProxyEndpoint>) -> Self {
        self.proxies = proxies;
        self
    }

    /// Sets the retry bound.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the inter-page delay bounds.
    pub fn with_page_delay(mut self, delay: DelayRange) -> Self {
        self.page_delay = delay;
        self
    }

    /// Sets the inter-retry delay bounds.
    pub fn with_retry_delay(mut self, delay: DelayRange) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Checks the settings the engine cannot run without.
    pub fn validate(&self) -> Result<()> {
        if self.proxies.is_empty() {
            return Err(ScrapeError::Config("no proxies configured".to_string()));
        }
        if self.request_timeout.is_zero() {
            return Err(ScrapeError::Config("request timeout must be positive".to_string()));
        }
        for (name, range) in [("page", self.page_delay), ("retry", self.retry_delay)] {
            if range.min_ms > range.max_ms {
                return Err(ScrapeError::Config(format!(
                    "{} delay minimum {}ms exceeds maximum {}ms",
                    name, range.min_ms, range.max_ms
                )));
            }
        }
        if self.scrape_limit_replenish_secs == 0 || self.scrape_limit_burst == 0 {
            return Err(ScrapeError::Config("rate limit settings must be positive".to_string()));
        }
        Ok(())
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T: FromStr + Copy>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {}={:?}", key, raw);
            default
        }),
        Err(_) => default,
    }
}
