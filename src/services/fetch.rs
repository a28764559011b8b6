// src/services/fetch.rs

//! Fetch gateway.
//!
//! Retrieves pages either directly or through a rendering proxy that takes
//! the target URL as a query parameter. Each call retries a bounded number of
//! times with a delay chosen by the kind of failure.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use url::Url;

use crate::error::FetchError;
use crate::models::{FetchConfig, ProxyConfig};
use crate::utils::http::create_async_client;

/// Anything that can turn a URL into page text.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// How outbound requests reach the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRoute {
    Direct,
    Proxy {
        endpoint: Url,
        api_key: String,
        key_param: String,
        url_param: String,
    },
}

impl FetchRoute {
    /// Proxy when an API key is configured, direct otherwise.
    pub fn from_config(proxy: &ProxyConfig) -> Result<Self, FetchError> {
        match &proxy.api_key {
            Some(api_key) => {
                let endpoint = Url::parse(&proxy.endpoint)
                    .map_err(|e| FetchError::invalid_url(&proxy.endpoint, e))?;
                Ok(Self::Proxy {
                    endpoint,
                    api_key: api_key.clone(),
                    key_param: proxy.key_param.clone(),
                    url_param: proxy.url_param.clone(),
                })
            }
            None => Ok(Self::Direct),
        }
    }

    /// The URL actually requested for `target`.
    pub fn request_url(&self, target: &str) -> Result<Url, FetchError> {
        let target_url = Url::parse(target).map_err(|e| FetchError::invalid_url(target, e))?;
        match self {
            Self::Direct => Ok(target_url),
            Self::Proxy {
                endpoint,
                api_key,
                key_param,
                url_param,
            } => {
                let mut url = endpoint.clone();
                url.query_pairs_mut()
                    .append_pair(key_param, api_key)
                    .append_pair(url_param, target_url.as_str());
                Ok(url)
            }
        }
    }

    pub fn is_proxied(&self) -> bool {
        matches!(self, Self::Proxy { .. })
    }
}

/// Why a single attempt failed; decides the pause before the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
enum AttemptFailure {
    RateLimited,
    Status(StatusCode),
    Network(String),
    EmptyBody,
}

impl AttemptFailure {
    fn delay(&self, config: &FetchConfig) -> Duration {
        let ms = match self {
            AttemptFailure::RateLimited => config.rate_limit_delay_ms,
            AttemptFailure::Status(_) => config.retry_delay_ms,
            AttemptFailure::Network(_) | AttemptFailure::EmptyBody => {
                config.network_error_delay_ms
            }
        };
        Duration::from_millis(ms)
    }

    fn describe(&self) -> String {
        match self {
            AttemptFailure::RateLimited => "rate limited (429)".to_string(),
            AttemptFailure::Status(status) => format!("HTTP status {status}"),
            AttemptFailure::Network(message) => format!("network error: {message}"),
            AttemptFailure::EmptyBody => "empty response body".to_string(),
        }
    }
}

/// Retrying HTTP fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    route: FetchRoute,
    config: FetchConfig,
}

impl HttpFetcher {
    /// Create a fetcher from fetch and proxy settings.
    pub fn new(config: &FetchConfig, proxy: &ProxyConfig) -> Result<Self, FetchError> {
        let client = create_async_client(config)?;
        let route = FetchRoute::from_config(proxy)?;
        if route.is_proxied() {
            log::info!("Fetching through rendering proxy {}", proxy.endpoint);
        } else {
            log::info!("No proxy API key configured, fetching directly");
        }
        Ok(Self::with_client(client, route, config.clone()))
    }

    pub fn with_client(client: Client, route: FetchRoute, config: FetchConfig) -> Self {
        Self {
            client,
            route,
            config,
        }
    }

    async fn attempt(&self, request_url: &Url) -> Result<String, AttemptFailure> {
        let response = self
            .client
            .get(request_url.clone())
            .send()
            .await
            .map_err(|e| AttemptFailure::Network(e.without_url().to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AttemptFailure::RateLimited);
        }
        if !status.is_success() {
            return Err(AttemptFailure::Status(status));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AttemptFailure::Network(e.without_url().to_string()))?;
        if body.trim().is_empty() {
            return Err(AttemptFailure::EmptyBody);
        }
        Ok(body)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let request_url = self.route.request_url(url)?;
        let attempts = self.config.max_attempts.max(1);
        let mut last = FetchError::transient("no attempt made");

        for attempt in 1..=attempts {
            log::debug!("Fetch attempt {}/{} -> {}", attempt, attempts, url);
            match self.attempt(&request_url).await {
                Ok(body) => {
                    log::debug!("Fetched {} ({} bytes)", url, body.len());
                    return Ok(body);
                }
                Err(failure) => {
                    log::warn!(
                        "Fetch attempt {}/{} for {} failed: {}",
                        attempt,
                        attempts,
                        url,
                        failure.describe()
                    );
                    if attempt < attempts {
                        tokio::time::sleep(failure.delay(&self.config)).await;
                    }
                    last = FetchError::transient(failure.describe());
                }
            }
        }

        Err(FetchError::Exhausted {
            url: url.to_string(),
            attempts,
            last: Box::new(last),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_config() -> FetchConfig {
        FetchConfig {
            retry_delay_ms: 1,
            rate_limit_delay_ms: 1,
            network_error_delay_ms: 1,
            timeout_secs: 5,
            ..FetchConfig::default()
        }
    }

    fn direct_fetcher() -> HttpFetcher {
        HttpFetcher::new(&fast_config(), &ProxyConfig::default()).unwrap()
    }

    #[test]
    fn direct_route_without_api_key() {
        let route = FetchRoute::from_config(&ProxyConfig::default()).unwrap();
        assert_eq!(route, FetchRoute::Direct);
        assert_eq!(
            route.request_url("https://coins.bank.gov.ua/catalog.html").unwrap().as_str(),
            "https://coins.bank.gov.ua/catalog.html"
        );
    }

    #[test]
    fn proxy_route_encodes_target() {
        let proxy = ProxyConfig {
            api_key: Some("secret".to_string()),
            ..ProxyConfig::default()
        };
        let route = FetchRoute::from_config(&proxy).unwrap();
        let url = route
            .request_url("https://coins.bank.gov.ua/catalog.html?page=2&x=1")
            .unwrap();

        assert_eq!(url.host_str(), Some("api.zenscrape.com"));
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("apikey".to_string(), "secret".to_string()),
                (
                    "url".to_string(),
                    "https://coins.bank.gov.ua/catalog.html?page=2&x=1".to_string()
                ),
            ]
        );
        assert!(!url.as_str().contains("page=2&x=1"));
    }

    #[test]
    fn invalid_target_is_rejected() {
        let err = FetchRoute::Direct.request_url("not a url").unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn returns_body_and_sends_browser_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/catalog.html"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let body = direct_fetcher()
            .fetch(&format!("{}/catalog.html", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "<html>ok</html>");

        let requests = server.received_requests().await.unwrap();
        let headers = &requests[0].headers;
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };
        assert_eq!(
            header("accept-language").as_deref(),
            Some("uk-UA,uk;q=0.9,en;q=0.8")
        );
        assert_eq!(header("user-agent"), Some(FetchConfig::default().user_agent));
    }

    #[tokio::test]
    async fn retries_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>third</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let body = direct_fetcher()
            .fetch(&format!("{}/flaky", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "<html>third</html>");
    }

    #[tokio::test]
    async fn exhausts_after_configured_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/limited"))
            .respond_with(ResponseTemplate::new(429))
            .expect(3)
            .mount(&server)
            .await;

        let url = format!("{}/limited", server.uri());
        let err = direct_fetcher().fetch(&url).await.unwrap_err();
        match err {
            FetchError::Exhausted {
                url: failed,
                attempts,
                last,
            } => {
                assert_eq!(failed, url);
                assert_eq!(attempts, 3);
                assert_eq!(
                    *last,
                    FetchError::transient(AttemptFailure::RateLimited.describe())
                );
                assert!(last.to_string().contains("429"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_body_counts_as_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/empty"))
            .respond_with(ResponseTemplate::new(200).set_body_string("   "))
            .expect(3)
            .mount(&server)
            .await;

        let err = direct_fetcher()
            .fetch(&format!("{}/empty", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Exhausted { .. }));
    }

    #[tokio::test]
    async fn proxied_request_carries_key_and_target() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/get"))
            .and(query_param("apikey", "secret"))
            .and(query_param("url", "https://coins.bank.gov.ua/catalog.html"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxied</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let proxy = ProxyConfig {
            endpoint: format!("{}/v1/get", server.uri()),
            api_key: Some("secret".to_string()),
            ..ProxyConfig::default()
        };
        let fetcher = HttpFetcher::new(&fast_config(), &proxy).unwrap();
        let body = fetcher
            .fetch("https://coins.bank.gov.ua/catalog.html")
            .await
            .unwrap();
        assert_eq!(body, "<html>proxied</html>");
    }

    #[test]
    fn delay_depends_on_failure_kind() {
        let config = FetchConfig::default();
        assert_eq!(
            AttemptFailure::RateLimited.delay(&config),
            Duration::from_millis(3000)
        );
        assert_eq!(
            AttemptFailure::Status(StatusCode::FORBIDDEN).delay(&config),
            Duration::from_millis(1000)
        );
        assert_eq!(
            AttemptFailure::Network("reset".into()).delay(&config),
            Duration::from_millis(1500)
        );
    }
}
