//! Storage collaborators for cached exchange rates.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dashmap::DashMap;
use ratewise_common::{CurrencyPair, ExchangeRate};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{FxError, FxResult};

/// Durable storage for rate observations, queried by exact pair.
#[async_trait]
pub trait RateStore: Send + Sync {
    /// The most recent observation for `pair` by `observed_at`.
    async fn find_latest(&self, pair: &CurrencyPair) -> FxResult<Option<ExchangeRate>>;

    /// Add an observation. Older observations for the pair may be kept.
    async fn insert(&self, entry: ExchangeRate) -> FxResult<()>;
}

fn latest_of<'a>(entries: impl IntoIterator<Item = &'a ExchangeRate>) -> Option<ExchangeRate> {
    entries
        .into_iter()
        .max_by_key(|entry| entry.observed_at)
        .cloned()
}

/// In-process store keeping every observation per pair.
#[derive(Default)]
pub struct MemoryRateStore {
    entries: DashMap<CurrencyPair, Vec<ExchangeRate>>,
}

impl MemoryRateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// All observations for a pair in insertion order.
    pub fn entries(&self, pair: &CurrencyPair) -> Vec<ExchangeRate> {
        self.entries
            .get(pair)
            .map(|v| v.clone())
            .unwrap_or_default()
    }

    /// Total number of observations.
    pub fn len(&self) -> usize {
        self.entries.iter().map(|e| e.value().len()).sum()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RateStore for MemoryRateStore {
    async fn find_latest(&self, pair: &CurrencyPair) -> FxResult<Option<ExchangeRate>> {
        Ok(self.entries.get(pair).and_then(|v| latest_of(v.iter())))
    }

    async fn insert(&self, entry: ExchangeRate) -> FxResult<()> {
        self.entries
            .entry(entry.pair.clone())
            .or_default()
            .push(entry);
        Ok(())
    }
}

/// Store persisted as a JSON array in a single file.
///
/// Each insert rewrites the file through a temporary sibling and a rename,
/// so readers never observe a half-written file.
pub struct JsonFileRateStore {
    path: PathBuf,
    max_entries_per_pair: Option<usize>,
    write_lock: Mutex<()>,
}

impl JsonFileRateStore {
    /// Create a store backed by `path`. The file is created on first insert.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_entries_per_pair: None,
            write_lock: Mutex::new(()),
        }
    }

    /// Keep at most `max` observations per pair, dropping the oldest.
    pub fn with_max_entries_per_pair(mut self, max: usize) -> Self {
        self.max_entries_per_pair = Some(max.max(1));
        self
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> FxResult<Vec<ExchangeRate>> {
        read_json_file(&self.path).await
    }

    fn retain_recent(&self, entries: &mut Vec<ExchangeRate>, pair: &CurrencyPair) {
        let Some(max) = self.max_entries_per_pair else {
            return;
        };

        let mut for_pair: Vec<_> = entries
            .iter()
            .filter(|e| &e.pair == pair)
            .map(|e| e.observed_at)
            .collect();
        if for_pair.len() <= max {
            return;
        }

        for_pair.sort_unstable();
        let cutoff = for_pair[for_pair.len() - max];
        let mut dropped = 0;
        entries.retain(|e| {
            let keep = &e.pair != pair || e.observed_at >= cutoff;
            if !keep {
                dropped += 1;
            }
            keep
        });
        debug!(pair = %pair, dropped, "Dropped old rate observations");
    }
}

#[async_trait]
impl RateStore for JsonFileRateStore {
    async fn find_latest(&self, pair: &CurrencyPair) -> FxResult<Option<ExchangeRate>> {
        let entries = self.load().await?;
        Ok(latest_of(entries.iter().filter(|e| &e.pair == pair)))
    }

    async fn insert(&self, entry: ExchangeRate) -> FxResult<()> {
        let _guard = self.write_lock.lock().await;

        let pair = entry.pair.clone();
        let mut entries = self.load().await?;
        entries.push(entry);
        self.retain_recent(&mut entries, &pair);

        write_json_file(&self.path, &entries).await
    }
}

/// Read a JSON array from `path`; a missing file reads as empty.
pub(crate) async fn read_json_file<T: serde::de::DeserializeOwned>(
    path: &Path,
) -> FxResult<Vec<T>> {
    match tokio::fs::read(path).await {
        Ok(bytes) if bytes.is_empty() => Ok(Vec::new()),
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
            FxError::Storage(format!("corrupt store file {}: {}", path.display(), e))
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(FxError::Storage(format!(
            "failed to read {}: {}",
            path.display(),
            e
        ))),
    }
}

/// Write `items` to `path` as JSON via a temporary file and rename.
pub(crate) async fn write_json_file<T: serde::Serialize>(path: &Path, items: &[T]) -> FxResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| storage_error(path, "create directory for", e))?;
    }

    let bytes = serde_json::to_vec_pretty(items).map_err(|e| storage_error(path, "encode", e))?;
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, bytes)
        .await
        .map_err(|e| storage_error(path, "write", e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| storage_error(path, "replace", e))?;
    Ok(())
}

fn storage_error(path: &Path, action: &str, e: impl std::fmt::Display) -> FxError {
    FxError::Storage(format!("failed to {} {}: {}", action, path.display(), e))
}

/// A store whose operations fail on demand, for testing error paths.
/// Every read and write is counted, failed or not.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Default)]
pub struct FailingRateStore {
    pub fail_reads: bool,
    pub fail_writes: bool,
    inner: MemoryRateStore,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl FailingRateStore {
    /// Reads succeed from `inner`, writes fail.
    pub fn read_only(inner: MemoryRateStore) -> Self {
        Self {
            fail_reads: false,
            fail_writes: true,
            inner,
            calls: Default::default(),
        }
    }

    /// Both reads and writes fail.
    pub fn broken() -> Self {
        Self {
            fail_reads: true,
            fail_writes: true,
            inner: MemoryRateStore::new(),
            calls: Default::default(),
        }
    }

    /// Number of reads and writes attempted so far.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateStore for FailingRateStore {
    async fn find_latest(&self, pair: &CurrencyPair) -> FxResult<Option<ExchangeRate>> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if self.fail_reads {
            return Err(FxError::Storage("disk unavailable".to_string()));
        }
        self.inner.find_latest(pair).await
    }

    async fn insert(&self, entry: ExchangeRate) -> FxResult<()> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if self.fail_writes {
            return Err(FxError::Storage("disk full".to_string()));
        }
        self.inner.insert(entry).await
    }
}
