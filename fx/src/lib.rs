//! Ratewise FX Engine
//!
//! Resolves currency conversion rates against a remote rates API, backed by a
//! durable cache.
//!
//! # Features
//!
//! - TTL rate cache over a pluggable [`RateStore`]
//! - HTTP fetching with exponential backoff and cooperative cancellation
//! - Stale-cache fallback when the network is unavailable
//! - Supported currency catalog and conversion history
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ratewise_fx::*;
//!
//! let config = FxConfig::from_env();
//! let transport = Arc::new(ReqwestTransport::new(config.network_timeout)?);
//! let client = Arc::new(ApiClient::new(&config, &EnvApiKey::default(), transport)?);
//!
//! let engine = ConversionEngine::new(
//!     RateCache::new(Arc::new(MemoryRateStore::new())),
//!     Arc::new(HttpRateFetcher::new(client)),
//!     config.engine.clone(),
//! );
//!
//! let result = engine.convert("USD", "EUR", 100.0).await?;
//! println!("{} ({})", result.converted_amount, result.origin);
//! ```

pub mod cache;
pub mod cancel;
pub mod catalog;
pub mod client;
pub mod config;
pub mod conversion;
pub mod credentials;
pub mod engine;
pub mod error;
pub mod fetcher;
pub mod history;
pub mod slot;
pub mod store;
pub mod transport;

pub use cache::RateCache;
pub use cancel::{CancelHandle, Cancellation};
pub use catalog::{sorted_codes, CurrencyCatalog};
pub use client::ApiClient;
pub use config::{EngineConfig, FxConfig, MissingFallback, RetryPolicy};
pub use conversion::ConversionRequest;
pub use credentials::{ApiKeyProvider, EnvApiKey, StaticApiKey, DEFAULT_API_KEY_VAR};
pub use engine::ConversionEngine;
pub use error::{FxError, FxResult};
pub use fetcher::{HttpRateFetcher, RateFetcher};
pub use history::{HistoryStore, JsonFileHistoryStore, MemoryHistoryStore};
pub use slot::ConversionSlot;
pub use store::{JsonFileRateStore, MemoryRateStore, RateStore};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport, TransportError};

#[cfg(any(test, feature = "test-utils"))]
pub use fetcher::MockRateFetcher;
#[cfg(any(test, feature = "test-utils"))]
pub use store::FailingRateStore;
#[cfg(any(test, feature = "test-utils"))]
pub use transport::MockTransport;
