// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue};

use crate::error::FetchError;
use crate::models::FetchConfig;

/// Create a configured asynchronous HTTP client.
///
/// Every request carries the browser-like User-Agent and Accept-Language
/// headers from `config`.
pub fn create_async_client(config: &FetchConfig) -> Result<reqwest::Client, FetchError> {
    let mut headers = HeaderMap::new();
    let language = HeaderValue::from_str(&config.accept_language)
        .map_err(|e| FetchError::Client(format!("invalid Accept-Language: {e}")))?;
    headers.insert(ACCEPT_LANGUAGE, language);

    reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| FetchError::Client(e.to_string()))
}
