use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::boundaries::{BoundaryTable, parse_boundaries};
use crate::source::{SourceError, content_hash, read_source};
use crate::trade_table::{TradeTable, parse_trade_table};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    Trade,
    Boundaries,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SourceKey {
    pub dataset: Dataset,
    pub path: PathBuf,
}

impl SourceKey {
    pub fn new(dataset: Dataset, path: impl Into<PathBuf>) -> Self {
        Self {
            dataset,
            path: path.into(),
        }
    }

    pub fn trade(path: impl Into<PathBuf>) -> Self {
        Self::new(Dataset::Trade, path)
    }

    pub fn boundaries(path: impl Into<PathBuf>) -> Self {
        Self::new(Dataset::Boundaries, path)
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: Arc<T>,
    content_hash: String,
}

/// Read-through memo of loaded sources keyed by (dataset, path).
///
/// Tables are shared as `Arc` and never mutated once cached. Nothing expires
/// on its own: callers drop entries with [`SourceCache::invalidate`] or
/// [`SourceCache::refresh_stale`].
#[derive(Debug, Default)]
pub struct SourceCache {
    hits: u64,
    misses: u64,
    trade: BTreeMap<PathBuf, CacheEntry<TradeTable>>,
    boundaries: BTreeMap<PathBuf, CacheEntry<BoundaryTable>>,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trade_table(&mut self, path: impl AsRef<Path>) -> Result<Arc<TradeTable>, SourceError> {
        read_through(
            &mut self.trade,
            path.as_ref(),
            &mut self.hits,
            &mut self.misses,
            parse_trade_table,
        )
    }

    pub fn boundaries(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<Arc<BoundaryTable>, SourceError> {
        read_through(
            &mut self.boundaries,
            path.as_ref(),
            &mut self.hits,
            &mut self.misses,
            parse_boundaries,
        )
    }

    pub fn contains(&self, key: &SourceKey) -> bool {
        match key.dataset {
            Dataset::Trade => self.trade.contains_key(&key.path),
            Dataset::Boundaries => self.boundaries.contains_key(&key.path),
        }
    }

    pub fn invalidate(&mut self, key: &SourceKey) -> bool {
        let removed = match key.dataset {
            Dataset::Trade => self.trade.remove(&key.path).is_some(),
            Dataset::Boundaries => self.boundaries.remove(&key.path).is_some(),
        };
        if removed {
            info!(path = %key.path.display(), dataset = ?key.dataset, "source invalidated");
        }
        removed
    }

    /// Re-hashes every cached file and drops entries whose bytes changed or
    /// can no longer be read. Returns the dropped keys in key order.
    pub fn refresh_stale(&mut self) -> Vec<SourceKey> {
        let mut stale: Vec<SourceKey> = Vec::new();
        stale.extend(
            stale_paths(&self.trade)
                .into_iter()
                .map(SourceKey::trade),
        );
        stale.extend(
            stale_paths(&self.boundaries)
                .into_iter()
                .map(SourceKey::boundaries),
        );
        for key in &stale {
            self.invalidate(key);
        }
        stale
    }

    pub fn len(&self) -> usize {
        self.trade.len() + self.boundaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.len(),
        }
    }
}

fn read_through<T>(
    entries: &mut BTreeMap<PathBuf, CacheEntry<T>>,
    path: &Path,
    hits: &mut u64,
    misses: &mut u64,
    parse: fn(&Path, &[u8]) -> Result<T, SourceError>,
) -> Result<Arc<T>, SourceError> {
    if let Some(entry) = entries.get(path) {
        *hits += 1;
        debug!(path = %path.display(), "source cache hit");
        return Ok(Arc::clone(&entry.value));
    }

    *misses += 1;
    let bytes = read_source(path)?;
    let value = Arc::new(parse(path, &bytes)?);
    entries.insert(
        path.to_path_buf(),
        CacheEntry {
            value: Arc::clone(&value),
            content_hash: content_hash(&bytes),
        },
    );
    Ok(value)
}

fn stale_paths<T>(entries: &BTreeMap<PathBuf, CacheEntry<T>>) -> Vec<PathBuf> {
    entries
        .iter()
        .filter(|(path, entry)| match read_source(path) {
            Ok(bytes) => content_hash(&bytes) != entry.content_hash,
            Err(_) => true,
        })
        .map(|(path, _)| path.clone())
        .collect()
}
