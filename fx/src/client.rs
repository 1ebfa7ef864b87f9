//! Client for the remote pricing source: endpoint construction plus the
//! retry loop shared by every remote call.

use std::sync::Arc;

use ratewise_common::CurrencyPair;
use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

use crate::cancel::Cancellation;
use crate::config::{FxConfig, RetryPolicy};
use crate::credentials::ApiKeyProvider;
use crate::error::{FxError, FxResult};
use crate::transport::HttpTransport;

const LATEST_PATH: &str = "v3/latest";
const CURRENCIES_PATH: &str = "v3/currencies";

/// Authenticated client with retry and backoff.
pub struct ApiClient {
    base_url: Url,
    api_key: String,
    transport: Arc<dyn HttpTransport>,
    retry: RetryPolicy,
}

impl ApiClient {
    /// Create a client. Fails when no usable API key is available or the
    /// base URL is invalid.
    pub fn new(
        config: &FxConfig,
        credentials: &dyn ApiKeyProvider,
        transport: Arc<dyn HttpTransport>,
    ) -> FxResult<Self> {
        let api_key = credentials
            .load_api_key()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| FxError::Configuration("API key is missing or empty".to_string()))?;

        let base_url = Url::parse(config.api_base_url.trim()).map_err(|e| {
            FxError::Configuration(format!(
                "invalid API base URL {:?}: {}",
                config.api_base_url, e
            ))
        })?;

        if base_url.cannot_be_a_base() {
            return Err(FxError::Configuration(format!(
                "API base URL {:?} cannot carry a path",
                config.api_base_url
            )));
        }

        Ok(Self {
            base_url,
            api_key,
            transport,
            retry: config.retry.clone(),
        })
    }

    /// `GET {base}/v3/latest?apikey=..&base_currency=..&currencies=..`
    pub fn latest_url(&self, pair: &CurrencyPair) -> FxResult<Url> {
        for currency in [&pair.base, &pair.quote] {
            if !currency.is_well_formed() {
                return Err(FxError::InvalidRequest(format!(
                    "currency code {:?} cannot be placed in a request",
                    currency.code()
                )));
            }
        }

        let mut url = self.endpoint(LATEST_PATH);
        url.query_pairs_mut()
            .append_pair("apikey", &self.api_key)
            .append_pair("base_currency", pair.base.code())
            .append_pair("currencies", pair.quote.code());
        Ok(url)
    }

    /// `GET {base}/v3/currencies?apikey=..`
    pub fn currencies_url(&self) -> Url {
        let mut url = self.endpoint(CURRENCIES_PATH);
        url.query_pairs_mut().append_pair("apikey", &self.api_key);
        url
    }

    /// Fetch `url` with retries and decode the body as JSON.
    ///
    /// Malformed JSON is reported as [`FxError::Decode`] without retrying.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        cancel: &Cancellation,
    ) -> FxResult<T> {
        let body = self.get_with_retry(url, cancel).await?;

        serde_json::from_slice(&body).map_err(|e| {
            warn!(path = url.path(), error = %e, "Failed to decode response");
            FxError::Decode(e.to_string())
        })
    }

    async fn get_with_retry(&self, url: &Url, cancel: &Cancellation) -> FxResult<Vec<u8>> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut failed = 0;

        loop {
            if cancel.is_cancelled() {
                debug!(path = url.path(), "Cancelled before request");
                return Err(FxError::Cancelled);
            }

            debug!(
                path = url.path(),
                attempt = failed + 1,
                max_attempts,
                "Sending request"
            );

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FxError::Cancelled),
                outcome = self.send_once(url) => outcome,
            };

            let err = match outcome {
                Ok(body) => return Ok(body),
                Err(e) if !e.is_retryable() => {
                    warn!(path = url.path(), error = %e, "Request failed, not retrying");
                    return Err(e);
                }
                Err(e) => e,
            };

            failed += 1;
            if failed >= max_attempts {
                error!(
                    path = url.path(),
                    attempts = failed,
                    error = %err,
                    "All attempts failed"
                );
                return Err(FxError::RetriesExhausted {
                    attempts: failed,
                    last: Box::new(err),
                });
            }

            let delay = self.retry.delay_for(failed - 1);
            warn!(
                path = url.path(),
                attempt = failed,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Request failed, retrying"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FxError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    async fn send_once(&self, url: &Url) -> FxResult<Vec<u8>> {
        let response = self
            .transport
            .get(url)
            .await
            .map_err(|e| FxError::Network(e.to_string()))?;

        if !response.is_success() {
            return Err(FxError::Http {
                status: response.status,
            });
        }

        Ok(response.body)
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        url.set_query(None);
        // `cannot_be_a_base` was rejected in `new`, so segments are available.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(path.split('/'));
        }
        url
    }
}
