//! Rate fetcher trait and the HTTP implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ratewise_common::CurrencyPair;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::cancel::Cancellation;
use crate::client::ApiClient;
use crate::error::{FxError, FxResult};

/// Something that can obtain a fresh rate for a pair.
#[async_trait]
pub trait RateFetcher: Send + Sync {
    /// Get the fetcher name.
    fn name(&self) -> &str;

    /// Fetch the current rate: units of quote per one unit of base.
    async fn fetch_rate(&self, pair: &CurrencyPair, cancel: &Cancellation) -> FxResult<Decimal>;
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    data: HashMap<String, QuoteValue>,
}

#[derive(Debug, Deserialize)]
struct QuoteValue {
    value: Decimal,
}

/// Fetches rates from the `/v3/latest` endpoint.
pub struct HttpRateFetcher {
    client: Arc<ApiClient>,
}

impl HttpRateFetcher {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RateFetcher for HttpRateFetcher {
    fn name(&self) -> &str {
        "currencyapi"
    }

    #[instrument(skip(self, cancel), fields(pair = %pair))]
    async fn fetch_rate(&self, pair: &CurrencyPair, cancel: &Cancellation) -> FxResult<Decimal> {
        let url = self.client.latest_url(pair)?;
        let response: LatestResponse = self.client.get_json(&url, cancel).await?;

        let quote = response.data.get(pair.quote.code()).ok_or_else(|| {
            FxError::Data(format!("response has no rate for {}", pair.quote))
        })?;

        if quote.value <= Decimal::ZERO {
            return Err(FxError::Data(format!(
                "non-positive rate {} for {}",
                quote.value, pair
            )));
        }

        debug!(rate = %quote.value, "Fetched rate");
        Ok(quote.value)
    }
}

/// Scripted fetcher for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateFetcher {
    results: parking_lot::Mutex<std::collections::VecDeque<FxResult<Decimal>>>,
    fallback: fn() -> FxResult<Decimal>,
    delay: Option<std::time::Duration>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRateFetcher {
    /// Every call returns whatever `fallback` produces.
    pub fn new(fallback: fn() -> FxResult<Decimal>) -> Self {
        Self {
            results: parking_lot::Mutex::new(std::collections::VecDeque::new()),
            fallback,
            delay: None,
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// A fetcher that always fails as if the device were offline.
    pub fn offline() -> Self {
        Self::new(|| {
            Err(FxError::RetriesExhausted {
                attempts: 5,
                last: Box::new(FxError::Network("not connected".to_string())),
            })
        })
    }

    /// Queue a one-off result served before the fallback.
    pub fn then(self, result: FxResult<Decimal>) -> Self {
        self.results.lock().push_back(result);
        self
    }

    /// Wait this long (or until cancelled) before answering.
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of fetches so far.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateFetcher for MockRateFetcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_rate(&self, _pair: &CurrencyPair, cancel: &Cancellation) -> FxResult<Decimal> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::select! {
                _ = cancel.cancelled() => return Err(FxError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }

        let queued = self.results.lock().pop_front();
        queued.unwrap_or_else(|| (self.fallback)())
    }
}
