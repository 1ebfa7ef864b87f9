//! Currency and exchange-rate types.

use chrono::Duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::time::Timestamp;

/// ISO 4217 style currency code.
///
/// Codes are normalised on construction: surrounding whitespace is removed
/// and letters are uppercased, so `" usd"` and `"USD"` name the same currency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Currency(String);

impl Currency {
    /// Create a new currency from code.
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_ascii_uppercase())
    }

    /// Get the currency code.
    pub fn code(&self) -> &str {
        &self.0
    }

    /// Whether the code is empty after normalisation.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the code can be placed in a request as-is.
    pub fn is_well_formed(&self) -> bool {
        !self.0.is_empty() && self.0.chars().all(|c| c.is_ascii_alphanumeric())
    }

    /// Common currencies
    pub fn usd() -> Self {
        Self::new("USD")
    }

    pub fn eur() -> Self {
        Self::new("EUR")
    }

    pub fn gbp() -> Self {
        Self::new("GBP")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Currency {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// An ordered currency pair. `USD/EUR` and `EUR/USD` are different pairs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CurrencyPair {
    /// Base currency (the one being converted from).
    pub base: Currency,
    /// Quote currency (the one being converted to).
    pub quote: Currency,
}

impl CurrencyPair {
    /// Create a new currency pair.
    pub fn new(base: Currency, quote: Currency) -> Self {
        Self { base, quote }
    }

    /// Get the inverse pair.
    pub fn inverse(&self) -> Self {
        Self {
            base: self.quote.clone(),
            quote: self.base.clone(),
        }
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// A cached exchange rate observation.
///
/// Entries are never changed after creation. A newer observation for the
/// same pair supersedes older ones; the most recent `observed_at` wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// The currency pair.
    pub pair: CurrencyPair,
    /// Units of quote currency per one unit of base currency.
    pub rate: Decimal,
    /// When the rate was obtained from the remote source.
    pub observed_at: Timestamp,
}

impl ExchangeRate {
    /// Create a new observation.
    pub fn new(pair: CurrencyPair, rate: Decimal, observed_at: Timestamp) -> Self {
        Self {
            pair,
            rate,
            observed_at,
        }
    }

    /// Age of the observation at `now`.
    pub fn age(&self, now: Timestamp) -> Duration {
        now.signed_duration_since(self.observed_at)
    }

    /// Whether the observation is younger than `ttl` at `now`.
    ///
    /// An observation stamped in the future counts as fresh.
    pub fn is_fresh(&self, ttl: std::time::Duration, now: Timestamp) -> bool {
        match self.age(now).to_std() {
            Ok(age) => age < ttl,
            Err(_) => true,
        }
    }

    /// Convert an amount of base currency into quote currency.
    ///
    /// `None` when the product does not fit in a `Decimal`.
    pub fn convert(&self, amount: Decimal) -> Option<Decimal> {
        amount.checked_mul(self.rate)
    }
}

/// Where the rate behind a conversion came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateOrigin {
    /// A cache entry younger than the TTL.
    FreshCache,
    /// A rate fetched from the remote source during this call.
    Network,
    /// An expired cache entry used because fetching failed.
    StaleCache,
}

impl RateOrigin {
    /// Whether the result was computed from degraded data.
    pub fn is_degraded(&self) -> bool {
        matches!(self, RateOrigin::StaleCache)
    }
}

impl fmt::Display for RateOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RateOrigin::FreshCache => "cache",
            RateOrigin::Network => "network",
            RateOrigin::StaleCache => "stale cache",
        };
        f.write_str(label)
    }
}

/// Outcome of a single conversion. Owned by the caller, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionResult {
    /// `amount * rate`.
    pub converted_amount: Decimal,
    /// The rate used.
    pub rate: Decimal,
    /// Where the rate came from.
    pub origin: RateOrigin,
    /// When the rate used was observed.
    pub observed_at: Timestamp,
}

impl ConversionResult {
    /// Compute a result from a cache entry or freshly fetched rate.
    ///
    /// `None` when `amount * rate` overflows.
    pub fn from_rate(amount: Decimal, rate: &ExchangeRate, origin: RateOrigin) -> Option<Self> {
        Some(Self {
            converted_amount: rate.convert(amount)?,
            rate: rate.rate,
            origin,
            observed_at: rate.observed_at,
        })
    }
}
