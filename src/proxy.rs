//! Proxy endpoints and round-robin rotation.
//!
//! Every outbound request is tunneled through the next proxy in a fixed,
//! ordered list so consecutive requests leave from different origins.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};

use reqwest::Proxy as ReqwestProxy;
use tracing::debug;

use crate::{Result, ScrapeError};

/// A single authenticated HTTP proxy.
#[derive(Clone, PartialEq, Eq)]
pub struct ProxyEndpoint {
    /// Proxy host (IP or domain)
    pub host: String,
    /// Proxy port
    pub port: u16,
    /// Username embedded in the proxy URL
    pub username: String,
    /// Password embedded in the proxy URL
    pub password: String,
    /// Exit country advertised by the provider (e.g. "kr")
    pub country_code: String,
}

impl ProxyEndpoint {
    /// Creates a new proxy endpoint.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            password: password.into(),
            country_code: String::new(),
        }
    }

    /// Sets the exit country code.
    pub fn with_country(mut self, country_code: impl Into<String>) -> Self {
        self.country_code = country_code.into();
        self
    }

    /// Returns the credential-embedded proxy URL.
    pub fn url(&self) -> String {
        format!(
            "http://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port
        )
    }

    /// Builds the reqwest proxy routing all schemes through this endpoint.
    pub fn to_reqwest(&self) -> Result<ReqwestProxy> {
        ReqwestProxy::all(self.url())
            .map_err(|e| ScrapeError::Config(format!("Invalid proxy {}:{}: {}", self.host, self.port, e)))
    }
}

// Keeps credentials out of logs.
impl fmt::Debug for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyEndpoint")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("country_code", &self.country_code)
            .finish()
    }
}

impl FromStr for ProxyEndpoint {
    type Err = ScrapeError;

    /// Parses `user:pass@host:port`, with or without an `http://` prefix.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let with_scheme = if s.contains("://") {
            s.to_string()
        } else {
            format!("http://{}", s)
        };
        let url = url::Url::parse(&with_scheme)?;

        if url.scheme() != "http" {
            return Err(ScrapeError::Config(format!(
                "Unsupported proxy protocol: {}",
                url.scheme()
            )));
        }

        let host = url
            .host_str()
            .ok_or_else(|| ScrapeError::Config("Missing proxy host".to_string()))?;
        let port = url
            .port()
            .ok_or_else(|| ScrapeError::Config(format!("Missing proxy port for {}", host)))?;
        let password = url
            .password()
            .ok_or_else(|| ScrapeError::Config(format!("Missing proxy credentials for {}", host)))?;

        Ok(ProxyEndpoint::new(host, port, url.username(), password))
    }
}

/// Strict round-robin rotation over a fixed list of proxies.
///
/// The cursor is atomic, so a single rotator can be shared between
/// concurrent scrapes.
pub struct ProxyRotator {
    endpoints: Vec<ProxyEndpoint>,
    cursor: AtomicUsize,
}

impl ProxyRotator {
    /// Creates a rotator. Fails if `endpoints` is empty.
    pub fn new(endpoints: Vec<ProxyEndpoint>) -> Result<Self> {
        if endpoints.is_empty() {
            return Err(ScrapeError::Config(
                "at least one proxy endpoint is required".to_string(),
            ));
        }
        Ok(Self {
            endpoints,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Returns the endpoint under the cursor and advances it.
    pub fn next(&self) -> ProxyEndpoint {
        let len = self.endpoints.len();
        let index = self
            .cursor
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |i| Some((i + 1) % len))
            .unwrap_or_else(|i| i);

        let endpoint = &self.endpoints[index];
        debug!("Using proxy: {}:{}", endpoint.host, endpoint.port);
        endpoint.clone()
    }

    /// Returns the number of configured endpoints.
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Always false; an empty rotator cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Returns the configured endpoints in rotation order.
    pub fn endpoints(&self) -> &[ProxyEndpoint] {
        &self.endpoints
    }
}
