//! Conversion history storage.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use ratewise_common::ConversionRecord;
use tokio::sync::Mutex;

use crate::error::FxResult;
use crate::store::{read_json_file, write_json_file};

/// Keeps completed conversions for later display.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Record a completed conversion.
    async fn append(&self, record: ConversionRecord) -> FxResult<()>;

    /// Up to `limit` records, newest first.
    async fn recent(&self, limit: usize) -> FxResult<Vec<ConversionRecord>>;
}

fn newest_first(mut records: Vec<ConversionRecord>, limit: usize) -> Vec<ConversionRecord> {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    records.truncate(limit);
    records
}

/// In-process history.
#[derive(Default)]
pub struct MemoryHistoryStore {
    records: RwLock<Vec<ConversionRecord>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn append(&self, record: ConversionRecord) -> FxResult<()> {
        self.records.write().push(record);
        Ok(())
    }

    async fn recent(&self, limit: usize) -> FxResult<Vec<ConversionRecord>> {
        let records = self.records.read().clone();
        Ok(newest_first(records, limit))
    }
}

/// History persisted as a JSON array in a single file.
pub struct JsonFileHistoryStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl HistoryStore for JsonFileHistoryStore {
    async fn append(&self, record: ConversionRecord) -> FxResult<()> {
        let _guard = self.write_lock.lock().await;

        let mut records: Vec<ConversionRecord> = read_json_file(&self.path).await?;
        records.push(record);
        write_json_file(&self.path, &records).await
    }

    async fn recent(&self, limit: usize) -> FxResult<Vec<ConversionRecord>> {
        let records = read_json_file(&self.path).await?;
        Ok(newest_first(records, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FxError;
    use chrono::Duration;
    use ratewise_common::{
        now, ConversionResult, Currency, CurrencyPair, ExchangeRate, RateOrigin,
    };
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn record(amount: Decimal, minutes_ago: i64) -> ConversionRecord {
        let pair = CurrencyPair::new(Currency::usd(), Currency::eur());
        let rate = ExchangeRate::new(pair.clone(), dec!(0.9), now());
        let result = ConversionResult::from_rate(amount, &rate, RateOrigin::Network).unwrap();
        let mut record = ConversionRecord::new(&pair, amount, &result);
        record.timestamp = now() - Duration::minutes(minutes_ago);
        record
    }

    #[tokio::test]
    async fn test_memory_recent_is_newest_first() {
        let store = MemoryHistoryStore::new();
        store.append(record(dec!(1), 30)).await.unwrap();
        store.append(record(dec!(2), 10)).await.unwrap();
        store.append(record(dec!(3), 20)).await.unwrap();

        let recent = store.recent(2).await.unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].requested_amount, dec!(2));
        assert_eq!(recent[1].requested_amount, dec!(3));
    }

    #[tokio::test]
    async fn test_json_file_history_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let store = JsonFileHistoryStore::new(&path);
        assert!(store.recent(10).await.unwrap().is_empty());
        store.append(record(dec!(5), 5)).await.unwrap();
        store.append(record(dec!(7), 1)).await.unwrap();

        let reopened = JsonFileHistoryStore::new(&path);
        let recent = reopened.recent(10).await.unwrap();

        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].requested_amount, dec!(7));
        assert_eq!(recent[0].converted_amount, dec!(6.3));
    }

    #[tokio::test]
    async fn test_corrupt_history_file_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, b"not json").unwrap();

        let store = JsonFileHistoryStore::new(&path);

        assert!(matches!(store.recent(1).await, Err(FxError::Storage(_))));
        assert!(matches!(
            store.append(record(dec!(1), 0)).await,
            Err(FxError::Storage(_))
        ));
    }
}
