//! Conversion history records.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::identifiers::RecordId;
use crate::monetary::{ConversionResult, Currency, CurrencyPair};
use crate::time::{now, Timestamp};

/// A completed conversion, as kept in the user's history.
///
/// The rate engine only supplies these values; storage belongs to whoever
/// owns the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionRecord {
    /// Unique record ID.
    pub id: RecordId,
    /// Currency converted from.
    pub base: Currency,
    /// Currency converted to.
    pub quote: Currency,
    /// Amount the user asked to convert.
    pub requested_amount: Decimal,
    /// Amount produced.
    pub converted_amount: Decimal,
    /// Rate used.
    pub rate: Decimal,
    /// When the conversion happened.
    pub timestamp: Timestamp,
}

impl ConversionRecord {
    /// Build a record for a successful conversion.
    pub fn new(pair: &CurrencyPair, requested_amount: Decimal, result: &ConversionResult) -> Self {
        Self {
            id: RecordId::new(),
            base: pair.base.clone(),
            quote: pair.quote.clone(),
            requested_amount,
            converted_amount: result.converted_amount,
            rate: result.rate,
            timestamp: now(),
        }
    }

    /// Get the currency pair.
    pub fn pair(&self) -> CurrencyPair {
        CurrencyPair::new(self.base.clone(), self.quote.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monetary::{ExchangeRate, RateOrigin};
    use rust_decimal_macros::dec;

    #[test]
    fn test_record_copies_result_values() {
        let pair = CurrencyPair::new(Currency::usd(), Currency::eur());
        let rate = ExchangeRate::new(pair.clone(), dec!(0.95), now());
        let result = ConversionResult::from_rate(dec!(10), &rate, RateOrigin::Network).unwrap();

        let record = ConversionRecord::new(&pair, dec!(10), &result);

        assert_eq!(record.pair(), pair);
        assert_eq!(record.requested_amount, dec!(10));
        assert_eq!(record.converted_amount, dec!(9.50));
        assert_eq!(record.rate, dec!(0.95));
    }

    #[test]
    fn test_record_serializes_to_json() {
        let pair = CurrencyPair::new(Currency::gbp(), Currency::usd());
        let rate = ExchangeRate::new(pair.clone(), dec!(1.27), now());
        let result = ConversionResult::from_rate(dec!(100), &rate, RateOrigin::FreshCache).unwrap();
        let record = ConversionRecord::new(&pair, dec!(100), &result);

        let json = serde_json::to_string(&record).unwrap();
        let decoded: ConversionRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded, record);
    }
}
