//! Bundler adapter.
//!
//! Owns the walker instance for the current graph generation and observes
//! every module it yields, populating the dependency graph cache and the
//! per-cycle working set of newly discovered records. Also provides the
//! layered content provider the walker reads through: tracked in-memory
//! content first, disk last.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use path_clean::PathClean;
use regraft_graph::{
    ContentProvider, DiskProvider, ModuleCache, ModuleId, ModuleRecord, ProviderResult, Walker,
    WalkerConfig, WalkerFactory, WalkerResult,
};
use rustc_hash::FxHashMap;

use crate::harness::SourceFile;

/// Callback applied to each freshly created walker. May chain further
/// configuration and return a replacement instance.
pub type WalkerInitializer = dyn Fn(Box<dyn Walker>) -> Box<dyn Walker> + Send + Sync;

/// One graph generation's walker plus the working set of records discovered
/// since the cache was last drained.
#[derive(Debug)]
pub struct BundlerAdapter {
    walker: Box<dyn Walker>,
    new_this_cycle: FxHashMap<ModuleId, Arc<ModuleRecord>>,
}

impl BundlerAdapter {
    /// Create the walker for a new generation.
    ///
    /// Factory failure propagates to the caller, which treats it as a
    /// configuration failure (the whole postprocessor goes inert).
    pub fn create(
        factory: &dyn WalkerFactory,
        config: WalkerConfig,
        initializer: Option<&WalkerInitializer>,
    ) -> WalkerResult<Self> {
        let mut walker = factory.create(config)?;
        if let Some(init) = initializer {
            walker = init(walker);
        }
        if !walker.capabilities().in_memory_reads {
            // Non-critical: correctness is unaffected, only the
            // in-memory-read optimization is lost.
            tracing::warn!("walker does not honor the content provider; every read hits disk");
        }
        Ok(Self {
            walker,
            new_this_cycle: FxHashMap::default(),
        })
    }

    /// Run one resolve-and-transform pass.
    ///
    /// Every record the walker yields that is not already in `cache` is
    /// inserted there and remembered as new this cycle. The first walker
    /// error aborts the pass.
    pub async fn run_pass(&mut self, cache: &mut ModuleCache) -> WalkerResult<()> {
        let records = self.walker.resolve(cache).await?;
        tracing::debug!("pass yielded {} record(s)", records.len());
        for record in records {
            let record = Arc::new(record);
            if !cache.contains(&record.id) {
                self.new_this_cycle
                    .insert(record.id.clone(), Arc::clone(&record));
            }
            cache.insert(record);
        }
        Ok(())
    }

    /// Take the working set, leaving it empty for the next cycle.
    pub fn drain_new(&mut self) -> FxHashMap<ModuleId, Arc<ModuleRecord>> {
        std::mem::take(&mut self.new_this_cycle)
    }

    /// Drop anything left from an interrupted cycle.
    pub fn clear_new(&mut self) {
        self.new_this_cycle.clear();
    }
}

/// Content provider backed by the host runner's tracked-file map.
///
/// Tracked paths are served from the host's in-memory content accessor;
/// anything else falls back to a real filesystem read.
#[derive(Debug)]
pub struct TrackedFileProvider {
    tracked: FxHashMap<PathBuf, Arc<dyn SourceFile>>,
    fallback: DiskProvider,
}

impl TrackedFileProvider {
    /// Snapshot the tracked-file set for one graph generation.
    pub fn new(tracked: &[Arc<dyn SourceFile>]) -> Self {
        let mut map = FxHashMap::default();
        for file in tracked {
            map.insert(file.path().to_path_buf().clean(), Arc::clone(file));
        }
        Self {
            tracked: map,
            fallback: DiskProvider::new(),
        }
    }

    pub fn is_tracked(&self, path: &Path) -> bool {
        self.tracked.contains_key(&path.to_path_buf().clean())
    }
}

#[async_trait]
impl ContentProvider for TrackedFileProvider {
    async fn read(&self, path: &Path) -> ProviderResult<String> {
        let key = path.to_path_buf().clean();
        if let Some(file) = self.tracked.get(&key) {
            tracing::trace!("serving {} from host memory", key.display());
            return file.content().await;
        }
        self.fallback.read(path).await
    }
}
