//! Incremental orchestrator.
//!
//! The top-level control loop invoked once per host processing cycle. It
//! decides between two states:
//!
//! - **Fresh**: no walker exists yet, or files were added/removed since the
//!   last cycle. The whole graph is rebuilt: entry set recomputed, a new
//!   walker created, every tracked file treated as affected. Unaffected file
//!   content is still served from host memory, so this is cheap.
//! - **Warm**: only file contents changed. The changed identifiers are
//!   removed from the cache before the pass, forcing the walker to
//!   re-resolve exactly those modules.
//!
//! Both states run one bundling pass, then emit one file-creation request
//! per affected module, per newly discovered external module, and (on
//! rebuild) the loader bootstrap plus the non-test-entry trailer.

use std::path::PathBuf;
use std::sync::Arc;

use globset::GlobSet;
use regraft_graph::{
    ContentProvider, ModuleCache, ModuleId, ModuleRecord, WalkerConfig, WalkerError, WalkerFactory,
};
use rustc_hash::FxHashMap;

use crate::adapter::{BundlerAdapter, TrackedFileProvider, WalkerInitializer};
use crate::entries::{EntrySet, compile_patterns};
use crate::harness::{ChangeCycle, CreatedFile, SourceFile};
use crate::loader::{companion_path, loader_script, trailer_script};
use crate::sourcemap::split_source_map;
use crate::wrap::wrap_module;
use crate::{Error, Result};

/// Load-order hint for the loader bootstrap: before every other file.
pub const LOADER_ORDER: i64 = -1;

/// Load-order hint for the non-test-entry trailer: after everything.
pub const TRAILER_ORDER: i64 = i64::MAX;

/// Fixed modification time stamped onto external module files. External
/// content only ever changes identity (a different resolved id), never in
/// place, so the host may cache these files forever.
pub const EXTERNAL_MTIME_MS: u64 = 0;

/// Constructor-level options.
///
/// Mandatory internal settings (traversal roots, the content provider, the
/// cache wiring) are owned by the orchestrator and always win on conflict.
pub struct PostprocessorOptions {
    /// Engine options forwarded verbatim to the walker factory.
    pub walker_options: FxHashMap<String, serde_json::Value>,
    /// Override for the embedded loader bootstrap text.
    pub prelude: Option<String>,
    /// Glob patterns restricting entry discovery to matching tracked files.
    /// Empty means "all test files are entries".
    pub entry_patterns: Vec<String>,
    /// Extra external-module search paths beyond the host's own.
    pub external_dirs: Vec<PathBuf>,
    /// Destination directory for loader, trailer, and external module files.
    pub scratch_dir: PathBuf,
    /// Invoked once per walker (re)creation; may return a replacement.
    pub configure_walker: Option<Arc<WalkerInitializer>>,
}

impl PostprocessorOptions {
    pub fn new() -> Self {
        Self {
            walker_options: FxHashMap::default(),
            prelude: None,
            entry_patterns: Vec::new(),
            external_dirs: Vec::new(),
            scratch_dir: std::env::temp_dir().join("regraft"),
            configure_walker: None,
        }
    }

    /// Forward an arbitrary option to the walker engine.
    pub fn walker_option(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.walker_options.insert(key.into(), value);
        self
    }

    pub fn prelude(mut self, prelude: impl Into<String>) -> Self {
        self.prelude = Some(prelude.into());
        self
    }

    pub fn entry_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.entry_patterns.push(pattern.into());
        self
    }

    pub fn entry_patterns(mut self, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.entry_patterns
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn external_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.external_dirs.push(dir.into());
        self
    }

    pub fn scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    pub fn configure_walker(
        mut self,
        init: impl Fn(Box<dyn regraft_graph::Walker>) -> Box<dyn regraft_graph::Walker>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.configure_walker = Some(Arc::new(init));
        self
    }
}

impl Default for PostprocessorOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Current graph generation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GraphState {
    /// Rebuild required: construct a new walker and re-emit everything.
    Fresh,
    /// Patch: invalidate only the changed identifiers.
    Warm,
}

/// The incremental postprocessor a host runner drives once per cycle.
///
/// Owns the dependency graph cache and the walker adapter; nothing else
/// mutates them. One cycle is in flight at a time; the host must await the
/// previous outcome before invoking the next.
pub struct Postprocessor {
    options: PostprocessorOptions,
    factory: Arc<dyn WalkerFactory>,
    patterns: Option<GlobSet>,
    state: GraphState,
    cache: ModuleCache,
    adapter: Option<BundlerAdapter>,
    entries: EntrySet,
    /// Set after a configuration failure; every later cycle is a no-op.
    inert: bool,
}

impl std::fmt::Debug for Postprocessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Postprocessor")
            .field("state", &self.state)
            .field("inert", &self.inert)
            .finish_non_exhaustive()
    }
}

impl Postprocessor {
    pub fn new(factory: Arc<dyn WalkerFactory>, options: PostprocessorOptions) -> Result<Self> {
        let patterns = if options.entry_patterns.is_empty() {
            None
        } else {
            Some(compile_patterns(&options.entry_patterns)?)
        };
        Ok(Self {
            options,
            factory,
            patterns,
            state: GraphState::Fresh,
            cache: ModuleCache::new(),
            adapter: None,
            entries: EntrySet::default(),
            inert: false,
        })
    }

    /// Number of live records in the dependency graph cache.
    pub fn cached_modules(&self) -> usize {
        self.cache.len()
    }

    /// True once a configuration failure has disabled postprocessing.
    pub fn is_inert(&self) -> bool {
        self.inert
    }

    /// Process one host change cycle.
    ///
    /// Returns the file-creation requests for this cycle. Any bundling or
    /// categorization failure rejects the whole cycle; no retry is attempted
    /// here, and the next invocation rebuilds from whatever the host reports
    /// then.
    pub async fn process(&mut self, cycle: ChangeCycle) -> Result<Vec<CreatedFile>> {
        if self.inert {
            tracing::debug!("postprocessor is inert; skipping cycle");
            return Ok(Vec::new());
        }

        match self.run_cycle(&cycle).await {
            Ok(created) => {
                self.state = GraphState::Warm;
                Ok(created)
            }
            Err(Error::Walker(WalkerError::Unavailable(reason))) => {
                tracing::error!("walker engine unavailable, disabling postprocessing: {reason}");
                self.inert = true;
                Ok(Vec::new())
            }
            Err(err) => {
                tracing::warn!("cycle failed: {err}");
                if let Some(adapter) = &mut self.adapter {
                    adapter.clear_new();
                }
                self.state = GraphState::Fresh;
                Err(err)
            }
        }
    }

    async fn run_cycle(&mut self, cycle: &ChangeCycle) -> Result<Vec<CreatedFile>> {
        let rebuild = self.state == GraphState::Fresh
            || self.adapter.is_none()
            || cycle.files_added
            || cycle.files_removed;

        let mut tracked_by_id: FxHashMap<ModuleId, Arc<dyn SourceFile>> = FxHashMap::default();
        for file in &cycle.tracked {
            tracked_by_id.insert(ModuleId::from_path(file.path()), Arc::clone(file));
        }

        let mut external_dirs = vec![cycle.external_dir.clone()];
        external_dirs.extend(self.options.external_dirs.iter().cloned());

        let mut loader_required = false;
        let affected: Vec<Arc<dyn SourceFile>>;

        if rebuild {
            tracing::debug!(
                added = cycle.files_added,
                removed = cycle.files_removed,
                tracked = cycle.tracked.len(),
                "rebuilding module graph"
            );
            if let Some(adapter) = &mut self.adapter {
                adapter.clear_new();
            }
            self.cache.clear();
            self.entries = EntrySet::from_cycle(cycle, self.patterns.as_ref());
            let provider: Arc<dyn ContentProvider> =
                Arc::new(TrackedFileProvider::new(&cycle.tracked));
            let config = WalkerConfig {
                roots: self.entries.roots(),
                external_dirs: external_dirs.clone(),
                provider,
                options: self.options.walker_options.clone(),
            };
            self.adapter = Some(BundlerAdapter::create(
                self.factory.as_ref(),
                config,
                self.options.configure_walker.as_deref(),
            )?);
            loader_required = true;
            affected = cycle.tracked.clone();
        } else {
            for file in &cycle.changed {
                let id = ModuleId::from_path(file.path());
                if self.cache.remove(&id).is_some() {
                    tracing::debug!("invalidated {id}");
                }
            }
            affected = cycle.changed.clone();
        }

        // Invalidation is complete; run exactly one bundling pass.
        let mut new_records = {
            let adapter = self
                .adapter
                .as_mut()
                .ok_or_else(|| Error::InvalidConfig("no walker instance for this cycle".into()))?;
            adapter.run_pass(&mut self.cache).await?;
            adapter.drain_new()
        };

        let mut created = Vec::new();

        // Companion files for affected tracked modules.
        for file in &affected {
            let id = ModuleId::from_path(file.path());
            let Some(record) = self.cache.get(&id) else {
                tracing::debug!("{id} not reachable from any entry; skipping");
                continue;
            };
            created.push(self.emit_companion(file.as_ref(), record.as_ref()));
            new_records.remove(&id);
        }

        // Whatever is left was discovered during the pass without being in
        // this cycle's affected set: tracked files that became reachable for
        // the first time, exposed modules, or external library modules.
        let mut remaining: Vec<Arc<ModuleRecord>> = new_records.into_values().collect();
        remaining.sort_by(|a, b| a.id.cmp(&b.id));
        for record in remaining {
            if let Some(file) = tracked_by_id.get(&record.id) {
                created.push(self.emit_companion(file.as_ref(), record.as_ref()));
                continue;
            }
            let under_external = external_dirs.iter().any(|dir| record.id.is_under(dir));
            if record.exposed.is_none() && !under_external {
                return Err(Error::Uncategorized {
                    path: record.id.as_path().to_path_buf(),
                });
            }
            created.push(self.emit_external(&record));
        }

        if loader_required {
            created.push(
                CreatedFile::new(
                    self.options.scratch_dir.join("loader.js"),
                    loader_script(self.options.prelude.as_deref()),
                )
                .with_order(LOADER_ORDER),
            );
            if self.patterns.is_some() {
                let non_tests = self.entries.non_test_roots();
                if !non_tests.is_empty() {
                    created.push(
                        CreatedFile::new(
                            self.options.scratch_dir.join("entries.js"),
                            trailer_script(non_tests.iter()),
                        )
                        .with_order(TRAILER_ORDER),
                    );
                }
            }
        }

        tracing::debug!(
            files = created.len(),
            cached = self.cache.len(),
            "cycle complete"
        );
        Ok(created)
    }

    fn emit_companion(&self, original: &dyn SourceFile, record: &ModuleRecord) -> CreatedFile {
        let (code, map) = split_source_map(&record.source);
        let content = wrap_module(&record.id, &code, &record.deps);
        let mut out = CreatedFile::new(companion_path(original.path()), content)
            .companion_of(original.path().to_path_buf());
        if let Some(map) = map {
            out = out.with_source_map(map);
        }
        out
    }

    fn emit_external(&self, record: &ModuleRecord) -> CreatedFile {
        let (code, map) = split_source_map(&record.source);
        let content = wrap_module(&record.id, &code, &record.deps);
        let name = format!("{}.js", blake3::hash(record.id.as_str().as_bytes()).to_hex());
        let mut out = CreatedFile::new(self.options.scratch_dir.join(name), content)
            .with_timestamp(EXTERNAL_MTIME_MS);
        if let Some(map) = map {
            out = out.with_source_map(map);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regraft_graph::{Walker, WalkerResult};

    #[derive(Debug)]
    struct UnavailableFactory;

    impl WalkerFactory for UnavailableFactory {
        fn create(&self, _config: WalkerConfig) -> WalkerResult<Box<dyn Walker>> {
            Err(WalkerError::Unavailable("engine not installed".into()))
        }
    }

    #[test]
    fn bad_entry_pattern_rejects_construction() {
        let err = Postprocessor::new(
            Arc::new(UnavailableFactory),
            PostprocessorOptions::new().entry_pattern("["),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn configuration_failure_goes_inert_without_erroring() {
        let mut postprocessor =
            Postprocessor::new(Arc::new(UnavailableFactory), PostprocessorOptions::new()).unwrap();

        let created = postprocessor
            .process(ChangeCycle::new("/p/node_modules"))
            .await
            .unwrap();
        assert!(created.is_empty());
        assert!(postprocessor.is_inert());

        // Later cycles stay no-ops instead of retrying the factory.
        let created = postprocessor
            .process(ChangeCycle::new("/p/node_modules"))
            .await
            .unwrap();
        assert!(created.is_empty());
    }

    #[test]
    fn options_builder_collects_settings() {
        let options = PostprocessorOptions::new()
            .entry_pattern("src/*.js")
            .external_dir("/extra/libs")
            .scratch_dir("/tmp/out")
            .walker_option("debug", serde_json::Value::Bool(true));
        assert_eq!(options.entry_patterns, vec!["src/*.js"]);
        assert_eq!(options.external_dirs, vec![PathBuf::from("/extra/libs")]);
        assert_eq!(options.scratch_dir, PathBuf::from("/tmp/out"));
        assert_eq!(
            options.walker_options.get("debug"),
            Some(&serde_json::Value::Bool(true))
        );
    }
}
