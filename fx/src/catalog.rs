//! Supported currency catalog.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, instrument};

use crate::cancel::Cancellation;
use crate::client::ApiClient;
use crate::error::FxResult;

#[derive(Debug, Deserialize)]
struct CurrenciesResponse {
    data: HashMap<String, CurrencyInfo>,
}

#[derive(Debug, Deserialize)]
struct CurrencyInfo {
    #[serde(default)]
    code: Option<String>,
    name: String,
}

/// Lists the currencies the remote source can quote.
///
/// Not cached: every call goes to the network through the client's retry loop.
pub struct CurrencyCatalog {
    client: Arc<ApiClient>,
}

impl CurrencyCatalog {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Map of currency code to display name.
    #[instrument(skip_all)]
    pub async fn list_supported_currencies(
        &self,
        cancel: &Cancellation,
    ) -> FxResult<BTreeMap<String, String>> {
        let url = self.client.currencies_url();
        let response: CurrenciesResponse = self.client.get_json(&url, cancel).await?;

        let catalog: BTreeMap<String, String> = response
            .data
            .into_iter()
            .map(|(key, info)| (info.code.unwrap_or(key), info.name))
            .collect();

        debug!(count = catalog.len(), "Loaded currency catalog");
        Ok(catalog)
    }
}

/// Codes from a catalog in alphabetical order.
pub fn sorted_codes(catalog: &BTreeMap<String, String>) -> Vec<String> {
    catalog.keys().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FxConfig;
    use crate::credentials::StaticApiKey;
    use crate::error::FxError;
    use crate::transport::{HttpResponse, MockTransport};

    const BODY: &str = r#"{"data":{
        "USD":{"symbol":"$","name":"US Dollar","code":"USD","type":"fiat"},
        "EUR":{"symbol":"€","name":"Euro","code":"EUR","type":"fiat"},
        "AUD":{"symbol":"AU$","name":"Australian Dollar","code":"AUD","type":"fiat"}
    }}"#;

    fn catalog(transport: Arc<MockTransport>) -> CurrencyCatalog {
        let client = ApiClient::new(&FxConfig::default(), &StaticApiKey::new("key"), transport)
            .unwrap();
        CurrencyCatalog::new(Arc::new(client))
    }

    #[tokio::test]
    async fn test_lists_currencies() {
        let transport = Arc::new(MockTransport::ok_json(BODY));
        let catalog = catalog(transport.clone());

        let currencies = catalog
            .list_supported_currencies(&Cancellation::never())
            .await
            .unwrap();

        assert_eq!(currencies.len(), 3);
        assert_eq!(currencies["EUR"], "Euro");
        assert_eq!(sorted_codes(&currencies), vec!["AUD", "EUR", "USD"]);
        assert_eq!(transport.requests()[0].path(), "/v3/currencies");
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_failures() {
        let transport = Arc::new(
            MockTransport::ok_json(BODY)
                .then(Ok(HttpResponse { status: 503, body: Vec::new() }))
                .then(Ok(HttpResponse { status: 502, body: Vec::new() })),
        );
        let catalog = catalog(transport.clone());

        let currencies = catalog
            .list_supported_currencies(&Cancellation::never())
            .await
            .unwrap();

        assert_eq!(currencies.len(), 3);
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_unauthorised_is_not_retried() {
        let transport = Arc::new(MockTransport::status(401));
        let catalog = catalog(transport.clone());

        let result = catalog
            .list_supported_currencies(&Cancellation::never())
            .await;

        assert!(matches!(result, Err(FxError::Http { status: 401 })));
        assert_eq!(transport.calls(), 1);
    }
}
