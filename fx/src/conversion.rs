//! Validated conversion requests.

use ratewise_common::{Currency, CurrencyPair};
use rust_decimal::Decimal;

use crate::error::{FxError, FxResult};

/// A conversion request that has passed local validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    /// Pair to convert across.
    pub pair: CurrencyPair,
    /// Non-negative amount of base currency.
    pub amount: Decimal,
}

impl ConversionRequest {
    /// Validate raw input.
    ///
    /// Codes are trimmed and uppercased and must not end up empty. The amount
    /// must be finite, non-negative and representable as a decimal.
    pub fn new(base: &str, quote: &str, amount: f64) -> FxResult<Self> {
        let base = Currency::new(base);
        let quote = Currency::new(quote);

        if base.is_empty() || quote.is_empty() {
            return Err(FxError::InvalidCurrencyCode(
                "base and quote currencies must both be given".to_string(),
            ));
        }

        if !amount.is_finite() || amount < 0.0 {
            return Err(FxError::InvalidAmount(format!(
                "amount must be a finite non-negative number, got {}",
                amount
            )));
        }

        let amount = Decimal::try_from(amount)
            .map_err(|e| FxError::InvalidAmount(format!("amount {} is out of range: {}", amount, e)))?;

        Ok(Self {
            pair: CurrencyPair::new(base, quote),
            amount,
        })
    }

    /// Build from an already-typed pair and decimal amount.
    pub fn from_parts(pair: CurrencyPair, amount: Decimal) -> FxResult<Self> {
        if pair.base.is_empty() || pair.quote.is_empty() {
            return Err(FxError::InvalidCurrencyCode(
                "base and quote currencies must both be given".to_string(),
            ));
        }

        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(FxError::InvalidAmount(format!(
                "amount must be non-negative, got {}",
                amount
            )));
        }

        Ok(Self { pair, amount })
    }
}
