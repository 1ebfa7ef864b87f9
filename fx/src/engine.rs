//! Conversion engine: decides between cached, fetched and stale rates.

use std::sync::Arc;

use ratewise_common::{now, ConversionResult, CurrencyPair, ExchangeRate, RateOrigin};
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

use crate::cache::RateCache;
use crate::cancel::Cancellation;
use crate::config::{EngineConfig, MissingFallback};
use crate::conversion::ConversionRequest;
use crate::error::{FxError, FxResult};
use crate::fetcher::RateFetcher;

/// The conversion engine.
///
/// Each call runs the whole decision procedure on its own; the only state
/// shared between calls is the cache. Concurrent calls for the same pair
/// each do their own lookup and fetch.
pub struct ConversionEngine {
    cache: RateCache,
    fetcher: Arc<dyn RateFetcher>,
    config: EngineConfig,
}

impl ConversionEngine {
    /// Create a new engine.
    pub fn new(cache: RateCache, fetcher: Arc<dyn RateFetcher>, config: EngineConfig) -> Self {
        Self {
            cache,
            fetcher,
            config,
        }
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Convert `amount` of `base` into `quote`.
    pub async fn convert(&self, base: &str, quote: &str, amount: f64) -> FxResult<ConversionResult> {
        self.convert_with(base, quote, amount, &Cancellation::never())
            .await
    }

    /// Like [`convert`](Self::convert), abandoning the fetch when `cancel` fires.
    pub async fn convert_with(
        &self,
        base: &str,
        quote: &str,
        amount: f64,
        cancel: &Cancellation,
    ) -> FxResult<ConversionResult> {
        let request = ConversionRequest::new(base, quote, amount)?;
        self.execute(&request, cancel).await
    }

    /// Run the decision procedure for an already validated request.
    #[instrument(skip(self, request, cancel), fields(pair = %request.pair, amount = %request.amount))]
    pub async fn execute(
        &self,
        request: &ConversionRequest,
        cancel: &Cancellation,
    ) -> FxResult<ConversionResult> {
        if cancel.is_cancelled() {
            return Err(FxError::Cancelled);
        }

        let pair = &request.pair;

        if let Some(entry) = self.lookup(pair).await {
            if entry.is_fresh(self.config.cache_ttl, now()) {
                debug!(observed_at = %entry.observed_at, "Using fresh cached rate");
                return self.finish(request.amount, &entry, RateOrigin::FreshCache);
            }
            debug!(observed_at = %entry.observed_at, "Cached rate is stale, refetching");
        }

        let fetch_error = match self.fetcher.fetch_rate(pair, cancel).await {
            Ok(rate) => {
                let entry = self.store_best_effort(pair, rate).await;
                return self.finish(request.amount, &entry, RateOrigin::Network);
            }
            Err(FxError::Cancelled) => {
                debug!("Conversion cancelled");
                return Err(FxError::Cancelled);
            }
            Err(e) => e,
        };

        warn!(
            fetcher = self.fetcher.name(),
            error = %fetch_error,
            "Fetching rate failed, trying cached fallback"
        );

        if let Some(entry) = self.lookup(pair).await {
            warn!(
                observed_at = %entry.observed_at,
                "Using stale cached rate as fallback"
            );
            return self.finish(request.amount, &entry, RateOrigin::StaleCache);
        }

        match self.config.on_missing_fallback {
            MissingFallback::NoCacheAvailable => Err(FxError::NoCacheAvailable {
                pair: pair.clone(),
                source: Box::new(fetch_error),
            }),
            MissingFallback::SurfaceFetchError => Err(fetch_error),
        }
    }

    /// Cache lookup where a storage malfunction counts as a miss.
    async fn lookup(&self, pair: &CurrencyPair) -> Option<ExchangeRate> {
        match self.cache.lookup(pair).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!(pair = %pair, error = %e, "Rate cache lookup failed");
                None
            }
        }
    }

    /// Cache a fetched rate. A failed write is logged and otherwise ignored.
    async fn store_best_effort(&self, pair: &CurrencyPair, rate: Decimal) -> ExchangeRate {
        match self.cache.store(pair, rate).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!(pair = %pair, error = %e, "Failed to cache fetched rate");
                ExchangeRate::new(pair.clone(), rate, now())
            }
        }
    }

    fn finish(
        &self,
        amount: Decimal,
        entry: &ExchangeRate,
        origin: RateOrigin,
    ) -> FxResult<ConversionResult> {
        let result = ConversionResult::from_rate(amount, entry, origin).ok_or_else(|| {
            FxError::InvalidAmount(format!(
                "converting {} at rate {} overflows the decimal range",
                amount, entry.rate
            ))
        })?;

        info!(
            rate = %result.rate,
            converted = %result.converted_amount,
            origin = %origin,
            "Conversion completed"
        );

        Ok(result)
    }
}
