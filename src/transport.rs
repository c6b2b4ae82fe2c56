//! Single-attempt HTTP transport using reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::fingerprint::FingerprintProfile;
use crate::proxy::ProxyEndpoint;
use crate::{Result, ScrapeError};

/// Performs exactly one GET through one proxy with one fingerprint.
///
/// Retrying and rotation live above this trait in
/// [`RetryingFetcher`](crate::fetcher::RetryingFetcher).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetches `url` and decodes the body as JSON.
    async fn get(&self, url: &str, proxy: &ProxyEndpoint, fingerprint: &FingerprintProfile) -> Result<Value>;
}

/// Transport that builds a proxied reqwest client per request.
pub struct HttpTransport {
    timeout: Duration,
}

impl HttpTransport {
    /// Creates a transport with the given per-request timeout.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn client_for(&self, proxy: &ProxyEndpoint) -> Result<Client> {
        Client::builder()
            .timeout(self.timeout)
            .proxy(proxy.to_reqwest()?)
            .build()
            .map_err(|e| ScrapeError::Other(format!("Failed to create HTTP client: {}", e)))
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, proxy: &ProxyEndpoint, fingerprint: &FingerprintProfile) -> Result<Value> {
        let client = self.client_for(proxy)?;

        let response = client
            .get(url)
            .headers(fingerprint.headers.clone())
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status(status.as_u16()));
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_timeout() {
                ScrapeError::Timeout
            } else {
                ScrapeError::Decode(e.to_string())
            }
        })
    }
}

fn classify(err: reqwest::Error) -> ScrapeError {
    if err.is_timeout() {
        ScrapeError::Timeout
    } else {
        ScrapeError::Http(err)
    }
}
