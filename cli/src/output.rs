//! Human-readable and JSON rendering of command results.

use std::collections::BTreeMap;

use ratewise_common::{ConversionRecord, ConversionResult};
use ratewise_fx::{sorted_codes, ConversionRequest};
use serde::Serialize;

#[derive(Serialize)]
struct ConversionOutput<'a> {
    base: &'a str,
    quote: &'a str,
    amount: rust_decimal::Decimal,
    #[serde(flatten)]
    result: &'a ConversionResult,
}

pub fn conversion(
    request: &ConversionRequest,
    result: &ConversionResult,
    json: bool,
) -> anyhow::Result<String> {
    if json {
        let output = ConversionOutput {
            base: request.pair.base.code(),
            quote: request.pair.quote.code(),
            amount: request.amount,
            result,
        };
        return Ok(serde_json::to_string_pretty(&output)?);
    }

    let mut line = format!(
        "{:.2} {} = {:.2} {} (rate {}, from {})",
        request.amount,
        request.pair.base,
        result.converted_amount,
        request.pair.quote,
        result.rate.normalize(),
        result.origin,
    );

    if result.origin.is_degraded() {
        line.push_str(&format!(
            "\nwarning: network unavailable, using rate observed at {}",
            result.observed_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }

    Ok(line)
}

pub fn currencies(catalog: &BTreeMap<String, String>, json: bool) -> anyhow::Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(catalog)?);
    }

    let lines: Vec<String> = sorted_codes(catalog)
        .into_iter()
        .map(|code| format!("{:<6}{}", code, catalog[&code]))
        .collect();

    Ok(lines.join("\n"))
}

pub fn history(records: &[ConversionRecord], json: bool) -> anyhow::Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(records)?);
    }

    if records.is_empty() {
        return Ok("No conversions yet".to_string());
    }

    let lines: Vec<String> = records
        .iter()
        .map(|r| {
            format!(
                "{}  {:.2} {} -> {:.2} {} @ {}",
                r.timestamp.format("%Y-%m-%d %H:%M"),
                r.requested_amount,
                r.base,
                r.converted_amount,
                r.quote,
                r.rate.normalize(),
            )
        })
        .collect();

    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratewise_common::{now, ExchangeRate, RateOrigin};
    use rust_decimal_macros::dec;

    fn sample(origin: RateOrigin) -> (ConversionRequest, ConversionResult) {
        let request = ConversionRequest::new("USD", "EUR", 10.0).unwrap();
        let rate = ExchangeRate::new(request.pair.clone(), dec!(0.90), now());
        let result = ConversionResult::from_rate(request.amount, &rate, origin).unwrap();
        (request, result)
    }

    #[test]
    fn test_conversion_text() {
        let (request, result) = sample(RateOrigin::Network);

        let text = conversion(&request, &result, false).unwrap();

        assert_eq!(text, "10.00 USD = 9.00 EUR (rate 0.9, from network)");
    }

    #[test]
    fn test_stale_conversion_carries_warning() {
        let (request, result) = sample(RateOrigin::StaleCache);

        let text = conversion(&request, &result, false).unwrap();

        assert!(text.starts_with("10.00 USD = 9.00 EUR (rate 0.9, from stale cache)"));
        assert!(text.contains("warning: network unavailable"));
    }

    #[test]
    fn test_conversion_json() {
        let (request, result) = sample(RateOrigin::FreshCache);

        let text = conversion(&request, &result, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["base"], "USD");
        assert_eq!(value["quote"], "EUR");
        assert_eq!(value["origin"], "fresh_cache");
    }

    #[test]
    fn test_currencies_text_is_sorted() {
        let catalog: BTreeMap<String, String> = [("USD", "US Dollar"), ("AUD", "Australian Dollar")]
            .into_iter()
            .map(|(c, n)| (c.to_string(), n.to_string()))
            .collect();

        let text = currencies(&catalog, false).unwrap();

        assert_eq!(text, "AUD   Australian Dollar\nUSD   US Dollar");
    }

    #[test]
    fn test_empty_history() {
        assert_eq!(history(&[], false).unwrap(), "No conversions yet");
    }

    #[test]
    fn test_history_line() {
        let (request, result) = sample(RateOrigin::Network);
        let record = ConversionRecord::new(&request.pair, request.amount, &result);

        let text = history(&[record], false).unwrap();

        assert!(text.ends_with("10.00 USD -> 9.00 EUR @ 0.9"));
    }
}
