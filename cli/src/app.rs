//! Wiring of the engine, catalog and history for one process.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use ratewise_common::{ConversionRecord, ConversionResult};
use ratewise_fx::{
    ApiClient, ApiKeyProvider, Cancellation, ConversionEngine, ConversionRequest, CurrencyCatalog,
    FxConfig, FxResult, HistoryStore, HttpRateFetcher, HttpTransport, JsonFileHistoryStore,
    JsonFileRateStore, RateCache,
};
use tracing::{info, warn};

const RATES_FILE: &str = "rates.json";
const HISTORY_FILE: &str = "history.json";
const MAX_RATES_PER_PAIR: usize = 16;

/// Everything a command needs, backed by files under a data directory.
pub struct App {
    engine: ConversionEngine,
    catalog: CurrencyCatalog,
    history: Arc<dyn HistoryStore>,
}

impl App {
    /// Build the application. Fails when the API key is missing or the
    /// base URL is unusable.
    pub fn new(
        config: &FxConfig,
        data_dir: &Path,
        api_key: &dyn ApiKeyProvider,
        transport: Arc<dyn HttpTransport>,
    ) -> FxResult<Self> {
        let client = Arc::new(ApiClient::new(config, api_key, transport)?);

        let rates = JsonFileRateStore::new(data_dir.join(RATES_FILE))
            .with_max_entries_per_pair(MAX_RATES_PER_PAIR);
        let engine = ConversionEngine::new(
            RateCache::new(Arc::new(rates)),
            Arc::new(HttpRateFetcher::new(client.clone())),
            config.engine.clone(),
        );

        info!(data_dir = %data_dir.display(), "Application initialized");

        Ok(Self {
            engine,
            catalog: CurrencyCatalog::new(client),
            history: Arc::new(JsonFileHistoryStore::new(data_dir.join(HISTORY_FILE))),
        })
    }

    /// Convert and record the conversion in history.
    ///
    /// A history write failure is logged; the conversion result still stands.
    pub async fn convert(
        &self,
        base: &str,
        quote: &str,
        amount: f64,
        cancel: &Cancellation,
    ) -> FxResult<(ConversionRequest, ConversionResult)> {
        let request = ConversionRequest::new(base, quote, amount)?;
        let result = self.engine.execute(&request, cancel).await?;

        let record = ConversionRecord::new(&request.pair, request.amount, &result);
        if let Err(e) = self.history.append(record).await {
            warn!(error = %e, "Failed to save conversion to history");
        }

        Ok((request, result))
    }

    pub async fn currencies(&self, cancel: &Cancellation) -> FxResult<BTreeMap<String, String>> {
        self.catalog.list_supported_currencies(cancel).await
    }

    pub async fn history(&self, limit: usize) -> FxResult<Vec<ConversionRecord>> {
        self.history.recent(limit).await
    }
}
