//! Validation of incoming scrape requests.

use tracing::warn;
use url::Url;

use crate::config::{DEFAULT_PAGES, MAX_PAGES_LIMIT};

/// Host fragment every accepted target URL must contain.
const ALLOWED_HOST: &str = "shopping.naver.com";

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub url: String,
    pub max_pages: u32,
}

/// Returns whether `raw` is a URL on the shopping domain.
pub fn validate_url(raw: &str) -> bool {
    match Url::parse(raw) {
        Ok(url) => match url.host_str() {
            Some(host) if host.contains(ALLOWED_HOST) => true,
            host => {
                warn!("Invalid domain: {:?}", host);
                false
            }
        },
        Err(e) => {
            warn!("URL validation failed: {}", e);
            false
        }
    }
}

/// Parses a page count, clamping it to `limit`.
///
/// Returns `None` for non-numeric, non-finite or non-positive input.
pub fn validate_pages(raw: &str, limit: u32) -> Option<u32> {
    let value: f64 = raw.trim().parse().ok()?;
    if !value.is_finite() || value.trunc() <= 0.0 {
        return None;
    }
    Some(value.trunc().min(limit as f64) as u32)
}

/// Validates the raw `url` and `pages` parameters of a scrape request.
///
/// A missing `pages` defaults to 20. All problems are collected rather
/// than stopping at the first.
pub fn validate_request(url: Option<&str>, pages: Option<&str>) -> Result<ValidatedRequest, Vec<String>> {
    let mut errors = Vec::new();

    let url = match url.map(str::trim).filter(|u| !u.is_empty()) {
        None => {
            errors.push("URL parameter is required".to_string());
            None
        }
        Some(u) if validate_url(u) => Some(u.to_string()),
        Some(_) => {
            errors.push("Invalid Naver URL format".to_string());
            None
        }
    };

    let max_pages = match pages.filter(|p| !p.trim().is_empty()) {
        None => Some(DEFAULT_PAGES),
        Some(p) => {
            let parsed = validate_pages(p, MAX_PAGES_LIMIT);
            if parsed.is_none() {
                errors.push("Invalid pages parameter".to_string());
            }
            parsed
        }
    };

    match (url, max_pages) {
        (Some(url), Some(max_pages)) if errors.is_empty() => Ok(ValidatedRequest { url, max_pages }),
        _ => Err(errors),
    }
}
