//! Rate cache over a durable store.

use std::sync::Arc;

use ratewise_common::{now, CurrencyPair, ExchangeRate};
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::FxResult;
use crate::store::RateStore;

/// Looks up and records the latest known rate per pair.
///
/// The cache holds no state of its own; every call goes to the store, so
/// freshness is decided by the caller from `observed_at`.
#[derive(Clone)]
pub struct RateCache {
    store: Arc<dyn RateStore>,
}

impl RateCache {
    /// Create a cache backed by `store`.
    pub fn new(store: Arc<dyn RateStore>) -> Self {
        Self { store }
    }

    /// The most recent rate for the exact pair, fresh or not.
    ///
    /// A miss is `Ok(None)`; only a storage malfunction is an error.
    pub async fn lookup(&self, pair: &CurrencyPair) -> FxResult<Option<ExchangeRate>> {
        let entry = self.store.find_latest(pair).await?;

        match &entry {
            Some(e) => debug!(pair = %pair, observed_at = %e.observed_at, "Cache hit"),
            None => debug!(pair = %pair, "Cache miss"),
        }

        Ok(entry)
    }

    /// Record `rate` for `pair`, observed now. Supersedes earlier entries.
    pub async fn store(&self, pair: &CurrencyPair, rate: Decimal) -> FxResult<ExchangeRate> {
        let entry = ExchangeRate::new(pair.clone(), rate, now());
        self.store.insert(entry.clone()).await?;

        debug!(pair = %pair, rate = %rate, "Cached rate");
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FxError;
    use crate::store::{FailingRateStore, MemoryRateStore};
    use chrono::Duration;
    use ratewise_common::Currency;
    use rust_decimal_macros::dec;

    fn usd_eur() -> CurrencyPair {
        CurrencyPair::new(Currency::usd(), Currency::eur())
    }

    #[tokio::test]
    async fn test_cache_store_and_lookup() {
        let store = Arc::new(MemoryRateStore::new());
        let cache = RateCache::new(store.clone());

        let stored = cache.store(&usd_eur(), dec!(0.91)).await.unwrap();
        let cached = cache.lookup(&usd_eur()).await.unwrap().unwrap();

        assert_eq!(cached, stored);
        assert_eq!(cached.rate, dec!(0.91));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_cache_miss() {
        let cache = RateCache::new(Arc::new(MemoryRateStore::new()));
        assert!(cache.lookup(&usd_eur()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_newer_store_supersedes() {
        let store = Arc::new(MemoryRateStore::new());
        store
            .insert(ExchangeRate::new(usd_eur(), dec!(0.7), now() - Duration::hours(2)))
            .await
            .unwrap();
        let cache = RateCache::new(store.clone());

        cache.store(&usd_eur(), dec!(0.95)).await.unwrap();

        let cached = cache.lookup(&usd_eur()).await.unwrap().unwrap();
        assert_eq!(cached.rate, dec!(0.95));
        // The old entry remains in storage but is no longer authoritative.
        assert_eq!(store.entries(&usd_eur()).len(), 2);
    }

    #[tokio::test]
    async fn test_storage_failure_is_error() {
        let cache = RateCache::new(Arc::new(FailingRateStore::broken()));

        assert!(matches!(
            cache.lookup(&usd_eur()).await,
            Err(FxError::Storage(_))
        ));
        assert!(matches!(
            cache.store(&usd_eur(), dec!(1)).await,
            Err(FxError::Storage(_))
        ));
    }
}
