//! Randomized request fingerprints.

use std::sync::Arc;

use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CONNECTION, USER_AGENT,
};

use crate::random::{RandomSource, ThreadRandom};
use crate::{Result, ScrapeError};

/// Desktop browser user agents.
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
];

/// Accept-Language values a Korean shopping visitor plausibly sends.
pub const DEFAULT_ACCEPT_LANGUAGES: &[&str] = &[
    "ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7",
    "en-US,en;q=0.9,ko;q=0.8",
    "ja-JP,ja;q=0.9,en-US;q=0.8,en;q=0.7",
];

const ACCEPT_VALUE: &str = "application/json, text/plain, */*";
const ACCEPT_ENCODING_VALUE: &str = "gzip, deflate, br";
const CONNECTION_VALUE: &str = "keep-alive";

/// The headers presented by one request.
#[derive(Debug, Clone)]
pub struct FingerprintProfile {
    pub user_agent: String,
    pub accept_language: String,
    pub headers: HeaderMap,
}

/// Draws a fresh [`FingerprintProfile`] for every request.
pub struct FingerprintGenerator {
    user_agents: Vec<String>,
    accept_languages: Vec<String>,
    random: Arc<dyn RandomSource>,
}

impl FingerprintGenerator {
    /// Creates a generator with the built-in pools and the thread RNG.
    pub fn new() -> Self {
        Self::with_random(Arc::new(ThreadRandom))
    }

    /// Creates a generator with the built-in pools and the given random source.
    pub fn with_random(random: Arc<dyn RandomSource>) -> Self {
        Self {
            user_agents: DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect(),
            accept_languages: DEFAULT_ACCEPT_LANGUAGES.iter().map(|s| s.to_string()).collect(),
            random,
        }
    }

    /// Replaces both pools. Each must be non-empty and contain only valid header values.
    pub fn with_pools(mut self, user_agents: Vec<String>, accept_languages: Vec<String>) -> Result<Self> {
        if user_agents.is_empty() || accept_languages.is_empty() {
            return Err(ScrapeError::Config(
                "fingerprint pools must not be empty".to_string(),
            ));
        }
        if let Some(bad) = user_agents
            .iter()
            .chain(accept_languages.iter())
            .find(|v| HeaderValue::from_str(v).is_err())
        {
            return Err(ScrapeError::Config(format!("invalid header value: {:?}", bad)));
        }
        self.user_agents = user_agents;
        self.accept_languages = accept_languages;
        Ok(self)
    }

    /// Picks a user agent and language uniformly and builds the header set.
    pub fn generate(&self) -> FingerprintProfile {
        let user_agent = self.user_agents[self.random.index(self.user_agents.len())].clone();
        let accept_language =
            self.accept_languages[self.random.index(self.accept_languages.len())].clone();

        let mut headers = HeaderMap::new();
        // Pool entries are validated on construction.
        if let Ok(value) = HeaderValue::from_str(&user_agent) {
            headers.insert(USER_AGENT, value);
        }
        if let Ok(value) = HeaderValue::from_str(&accept_language) {
            headers.insert(ACCEPT_LANGUAGE, value);
        }
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static(ACCEPT_ENCODING_VALUE));
        headers.insert(CONNECTION, HeaderValue::from_static(CONNECTION_VALUE));

        FingerprintProfile {
            user_agent,
            accept_language,
            headers,
        }
    }
}

impl Default for FingerprintGenerator {
    fn default() -> Self {
        Self::new()
    }
}
