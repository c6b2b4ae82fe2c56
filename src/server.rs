//! HTTP front door exposing the scraper.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::ScraperConfig;
use crate::result::Product;
use crate::scrape::Scraper;
use crate::validation::validate_request;
use crate::{Result, ScrapeError};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub scraper: Arc<Scraper>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(scraper: Arc<Scraper>) -> Self {
        Self {
            scraper,
            started_at: Instant::now(),
        }
    }
}

/// Query parameters of `GET /naver`.
#[derive(Debug, Default, Deserialize)]
pub struct ScrapeParams {
    pub url: Option<String>,
    pub pages: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SuccessMetadata {
    total_products: usize,
    pages_scraped: u32,
    latency: u64,
    average_latency_per_page: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FailureMetadata {
    pages_scraped: u32,
    latency: u64,
}

#[derive(Serialize)]
struct SuccessBody<'a> {
    success: bool,
    data: &'a [Product],
    metadata: SuccessMetadata,
}

#[derive(Serialize)]
struct FailureBody {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<FailureMetadata>,
}

impl FailureBody {
    fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            details: None,
            metadata: None,
        }
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    uptime: f64,
}

/// Builds the router: `/naver` (rate limited), `/health`, and a JSON 404.
pub fn build_app(state: AppState, config: &ScraperConfig) -> Result<Router> {
    // One request slot per client IP every `replenish` seconds, with a burst allowance.
    // Clients are keyed by X-Forwarded-For / X-Real-IP, falling back to the peer address.
    let rate_limit_config = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(config.scrape_limit_replenish_secs)
            .burst_size(config.scrape_limit_burst)
            .key_extractor(SmartIpKeyExtractor)
            .use_headers()
            .finish()
            .ok_or_else(|| ScrapeError::Config("invalid rate limit settings".to_string()))?,
    );

    let rate_limit_layer = GovernorLayer {
        config: rate_limit_config,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    Ok(Router::new()
        .route("/naver", get(scrape_handler).layer(rate_limit_layer))
        .route("/health", get(health_handler))
        .fallback(not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Validates the query, runs the scrape and maps the result to a response.
pub async fn scrape_handler(
    State(state): State<AppState>,
    Query(params): Query<ScrapeParams>,
) -> Response {
    let request = match validate_request(params.url.as_deref(), params.pages.as_deref()) {
        Ok(request) => request,
        Err(details) => {
            warn!("Invalid request: {:?}", details);
            let body = FailureBody {
                details: Some(details),
                ..FailureBody::new("Invalid request parameters")
            };
            return (StatusCode::BAD_REQUEST, Json(body)).into_response();
        }
    };

    info!("Starting scrape: url={} max_pages={}", request.url, request.max_pages);
    let result = state.scraper.run(&request.url, request.max_pages).await;

    if result.success {
        info!(
            "Scrape completed: products={} pages={} latency={}ms",
            result.total_results, result.pages_scraped, result.latency_ms
        );
        let body = SuccessBody {
            success: true,
            data: result.products(),
            metadata: SuccessMetadata {
                total_products: result.total_results,
                pages_scraped: result.pages_scraped,
                latency: result.latency_ms,
                average_latency_per_page: result.average_latency_per_page(),
            },
        };
        (StatusCode::OK, Json(body)).into_response()
    } else {
        let message = result.error.clone().unwrap_or_default();
        error!("Scrape failed: {}", message);
        let body = FailureBody {
            metadata: Some(FailureMetadata {
                pages_scraped: result.pages_scraped,
                latency: result.latency_ms,
            }),
            ..FailureBody::new(message)
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

/// Liveness probe.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        uptime: state.started_at.elapsed().as_secs_f64(),
    })
}

async fn not_found(method: Method, uri: axum::http::Uri) -> Response {
    warn!("404: {} {}", method, uri);
    (StatusCode::NOT_FOUND, Json(FailureBody::new("Endpoint not found"))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::PageFetcher;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    /// Returns one product on page 1 and nothing afterwards.
    struct OnePageFetcher;

    #[async_trait]
    impl PageFetcher for OnePageFetcher {
        async fn fetch(&self, url: &str) -> Result<Value> {
            if url.contains("cursor=1") {
                Ok(json!({ "data": [{ "card": { "product": { "nvMid": "42", "productName": "Desk lamp", "salePrice": 19900 } } }] }))
            } else {
                Ok(json!({ "data": [] }))
            }
        }
    }

    struct BrokenFetcher;

    #[async_trait]
    impl PageFetcher for BrokenFetcher {
        async fn fetch(&self, _url: &str) -> Result<Value> {
            Err(ScrapeError::Other("fetch pipeline misconfigured".to_string()))
        }
    }

    fn app(fetcher: Arc<dyn PageFetcher>, config: &ScraperConfig) -> Router {
        let scraper = Scraper::new(fetcher).with_page_delay(crate::random::DelayRange::new(0, 0));
        build_app(AppState::new(Arc::new(scraper)), config).unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        request_from(uri, "203.0.113.7")
    }

    fn request_from(uri: &str, client_ip: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("x-forwarded-for", client_ip)
            .body(Body::empty())
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = app(Arc::new(OnePageFetcher), &ScraperConfig::default());
        let response = app.oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert!(body["timestamp"].is_string());
        assert!(body["uptime"].is_number());
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let app = app(Arc::new(OnePageFetcher), &ScraperConfig::default());
        let response = app.oneshot(get_request("/nope")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"], "Endpoint not found");
    }

    #[tokio::test]
    async fn test_scrape_invalid_params() {
        let app = app(Arc::new(OnePageFetcher), &ScraperConfig::default());
        let response = app
            .oneshot(get_request("/naver?url=https%3A%2F%2Fexample.com&pages=0"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Invalid request parameters");
        assert_eq!(
            body["details"],
            json!(["Invalid Naver URL format", "Invalid pages parameter"])
        );
    }

    #[tokio::test]
    async fn test_scrape_success() {
        let app = app(Arc::new(OnePageFetcher), &ScraperConfig::default());
        let response = app
            .oneshot(get_request(
                "/naver?url=https%3A%2F%2Fsearch.shopping.naver.com%2Fapi%3Fq%3Dlamp&pages=5",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"][0]["id"], "42");
        assert_eq!(body["data"][0]["price"], 19900.0);
        assert_eq!(body["metadata"]["totalProducts"], 1);
        assert_eq!(body["metadata"]["pagesScraped"], 2);
        assert!(body["metadata"]["averageLatencyPerPage"].is_number());
    }

    #[tokio::test]
    async fn test_scrape_failure_maps_to_500() {
        let app = app(Arc::new(BrokenFetcher), &ScraperConfig::default());
        let response = app
            .oneshot(get_request("/naver?url=https%3A%2F%2Fshopping.naver.com%2Fx&pages=2"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "fetch pipeline misconfigured");
        assert_eq!(body["metadata"]["pagesScraped"], 0);
    }

    #[tokio::test]
    async fn test_scrape_rate_limited() {
        let config = ScraperConfig {
            scrape_limit_burst: 1,
            scrape_limit_replenish_secs: 60,
            ..ScraperConfig::default()
        };
        let app = app(Arc::new(OnePageFetcher), &config);
        let uri = "/naver?url=https%3A%2F%2Fshopping.naver.com%2Fx&pages=1";

        let first = app.clone().oneshot(get_request(uri)).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app.oneshot(get_request(uri)).await.unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_rate_limit_is_per_forwarded_client() {
        let config = ScraperConfig {
            scrape_limit_burst: 1,
            scrape_limit_replenish_secs: 60,
            ..ScraperConfig::default()
        };
        let app = app(Arc::new(OnePageFetcher), &config);
        let uri = "/naver?url=https%3A%2F%2Fshopping.naver.com%2Fx&pages=1";

        let first = app.clone().oneshot(request_from(uri, "198.51.100.1")).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let other_client = app.clone().oneshot(request_from(uri, "198.51.100.2")).await.unwrap();
        assert_eq!(other_client.status(), StatusCode::OK);

        let repeat = app.oneshot(request_from(uri, "198.51.100.1")).await.unwrap();
        assert_eq!(repeat.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_build_app_rejects_zero_burst() {
        let config = ScraperConfig {
            scrape_limit_burst: 0,
            ..ScraperConfig::default()
        };
        let scraper = Scraper::new(Arc::new(OnePageFetcher));
        assert!(build_app(AppState::new(Arc::new(scraper)), &config).is_err());
    }
}
