//! One page load: memoized source reads, then normalize / join / resolve.

use std::path::PathBuf;
use std::sync::Arc;

use formats::{SourceCache, SourceError, SourceKey, TradeTable};
use parking_lot::Mutex;
use scene::{PartnerMatch, TradeScene};

#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub trade_path: PathBuf,
    pub boundary_path: PathBuf,
    pub partner_match: PartnerMatch,
}

impl PipelineConfig {
    pub fn source_keys(&self) -> [SourceKey; 2] {
        [
            SourceKey::trade(&self.trade_path),
            SourceKey::boundaries(&self.boundary_path),
        ]
    }
}

pub struct PageLoad {
    pub trade: Arc<TradeTable>,
    pub scene: TradeScene,
}

/// Runs synchronously; callers on the async runtime go through
/// `spawn_blocking`. The cache lock is released before the join runs.
pub fn load_page(
    sources: &Mutex<SourceCache>,
    config: &PipelineConfig,
) -> Result<PageLoad, SourceError> {
    let (trade, boundaries) = {
        let mut cache = sources.lock();
        let trade = cache.trade_table(&config.trade_path)?;
        let boundaries = cache.boundaries(&config.boundary_path)?;
        (trade, boundaries)
    };
    let scene = TradeScene::build(&trade, &boundaries, config.partner_match);
    Ok(PageLoad { trade, scene })
}

/// Drops both memoized sources so the next page load re-reads them.
pub fn invalidate_sources(sources: &Mutex<SourceCache>, config: &PipelineConfig) -> usize {
    let mut cache = sources.lock();
    config
        .source_keys()
        .iter()
        .filter(|key| cache.invalidate(key))
        .count()
}

/// Drops only the memoized sources whose files changed on disk.
pub fn refresh_stale_sources(sources: &Mutex<SourceCache>) -> Vec<SourceKey> {
    sources.lock().refresh_stale()
}
