//! TCS courier shipment tracking client.
//!
//! The response body is passed through as JSON; its shape belongs to TCS.
//! Successful lookups are cached for 5 minutes.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use secrecy::ExposeSecret;
use serde_json::Value;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::config::TcsConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const TRACKING_PATH: &str = "track/v1/shipments/detail";

/// Errors from the TCS tracking API.
#[derive(Debug, Error)]
pub enum TcsError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// TCS answered with a non-success status.
    #[error("TCS returned HTTP {0}")]
    Status(u16),

    /// Body was not JSON.
    #[error("parse error: {0}")]
    Parse(String),

    /// Configured base URL cannot be used.
    #[error("invalid TCS base URL: {0}")]
    BaseUrl(String),
}

/// Client for TCS shipment tracking.
#[derive(Clone)]
pub struct TcsClient {
    inner: Arc<TcsClientInner>,
}

struct TcsClientInner {
    client: reqwest::Client,
    endpoint: Url,
    api_key: Option<String>,
    cache: Cache<String, Value>,
}

impl TcsClient {
    /// Create a new TCS client.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be built.
    pub fn new(config: &TcsConfig) -> Result<Self, TcsError> {
        let endpoint = tracking_endpoint(&config.base_url)?;

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300))
            .build();

        Ok(Self {
            inner: Arc::new(TcsClientInner {
                client,
                endpoint,
                api_key: config
                    .api_key
                    .as_ref()
                    .map(|key| key.expose_secret().to_string()),
                cache,
            }),
        })
    }

    /// Look up a consignment number.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, TCS answers with a non-success
    /// status or the body is not JSON.
    #[instrument(skip(self))]
    pub async fn track(&self, consignment: &str) -> Result<Value, TcsError> {
        let consignment = consignment.trim();
        if let Some(hit) = self.inner.cache.get(consignment).await {
            tracing::debug!("TCS tracking cache hit");
            return Ok(hit);
        }

        let mut request = self
            .inner
            .client
            .get(self.inner.endpoint.clone())
            .query(&[("consignee", consignment)])
            .header("Accept", "application/json");
        if let Some(key) = &self.inner.api_key {
            request = request.header("X-IBM-Client-Id", key);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                status = %status,
                body = %body.chars().take(200).collect::<String>(),
                "TCS tracking returned non-success status"
            );
            return Err(TcsError::Status(status.as_u16()));
        }

        let value: Value =
            serde_json::from_str(&body).map_err(|e| TcsError::Parse(e.to_string()))?;
        self.inner
            .cache
            .insert(consignment.to_string(), value.clone())
            .await;

        Ok(value)
    }
}

fn tracking_endpoint(base_url: &str) -> Result<Url, TcsError> {
    let mut base = Url::parse(base_url).map_err(|e| TcsError::BaseUrl(e.to_string()))?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(TcsError::BaseUrl(format!("unsupported scheme {}", base.scheme())));
    }
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(TRACKING_PATH)
        .map_err(|e| TcsError::BaseUrl(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_base_without_slash() {
        let url = tracking_endpoint("https://api.tcscourier.com").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.tcscourier.com/track/v1/shipments/detail"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let url = tracking_endpoint("https://sandbox.example.com/tcs/").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sandbox.example.com/tcs/track/v1/shipments/detail"
        );
        let url = tracking_endpoint("https://sandbox.example.com/tcs").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sandbox.example.com/tcs/track/v1/shipments/detail"
        );
    }

    #[test]
    fn test_endpoint_rejects_bad_urls() {
        assert!(matches!(
            tracking_endpoint("not a url"),
            Err(TcsError::BaseUrl(_))
        ));
        assert!(matches!(
            tracking_endpoint("ftp://tcs.example.com"),
            Err(TcsError::BaseUrl(_))
        ));
    }
}
