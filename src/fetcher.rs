//! Page fetching with proxy rotation, fingerprinting and bounded retry.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::fingerprint::FingerprintGenerator;
use crate::proxy::ProxyRotator;
use crate::random::{DelayRange, RandomSource, ThreadRandom};
use crate::transport::Transport;
use crate::Result;

/// Trait for fetching the raw JSON body of one result page.
///
/// All configuration (proxies, retries, timeouts) is set at construction
/// time; `fetch` is a simple URL-in, JSON-out interface.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches the raw response for the given page URL.
    async fn fetch(&self, url: &str) -> Result<Value>;
}

/// Issues one logical GET, retrying transient failures.
///
/// Each attempt draws a fresh proxy and fingerprint. After a transient
/// failure it sleeps a jittered delay and tries again, up to
/// `max_retries` retries. Non-transient errors are returned at once.
pub struct RetryingFetcher {
    transport: Arc<dyn Transport>,
    proxies: Arc<ProxyRotator>,
    fingerprints: FingerprintGenerator,
    random: Arc<dyn RandomSource>,
    max_retries: u32,
    retry_delay: DelayRange,
}

impl RetryingFetcher {
    /// Creates a fetcher with 3 retries and a 2-5s retry delay.
    pub fn new(transport: Arc<dyn Transport>, proxies: Arc<ProxyRotator>) -> Self {
        let random: Arc<dyn RandomSource> = Arc::new(ThreadRandom);
        Self {
            transport,
            proxies,
            fingerprints: FingerprintGenerator::with_random(Arc::clone(&random)),
            random,
            max_retries: 3,
            retry_delay: DelayRange::new(2000, 5000),
        }
    }

    /// Sets the random source used for fingerprints and retry jitter.
    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.fingerprints = FingerprintGenerator::with_random(Arc::clone(&random));
        self.random = random;
        self
    }

    /// Replaces the fingerprint generator.
    pub fn with_fingerprints(mut self, fingerprints: FingerprintGenerator) -> Self {
        self.fingerprints = fingerprints;
        self
    }

    /// Sets the number of retries after the first attempt.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the bounds of the inter-retry delay.
    pub fn with_retry_delay(mut self, retry_delay: DelayRange) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Returns the configured retry bound.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

#[async_trait]
impl PageFetcher for RetryingFetcher {
    async fn fetch(&self, url: &str) -> Result<Value> {
        let mut retries = 0;

        loop {
            let proxy = self.proxies.next();
            let fingerprint = self.fingerprints.generate();
            debug!("GET {} via {}:{}", url, proxy.host, proxy.port);

            match self.transport.get(url, &proxy, &fingerprint).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_transient() && retries < self.max_retries => {
                    retries += 1;
                    warn!("Retry {}/{} for {}: {}", retries, self.max_retries, url, e);
                    tokio::time::sleep(self.retry_delay.sample(self.random.as_ref())).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
