//! Interface to the external dependency-graph engine.
//!
//! The engine ("walker") performs file reads, syntax transforms, and
//! dependency discovery. This crate never re-implements that traversal; it
//! wraps it behind an explicit trait so the harness can observe every module
//! the walker visits and own the only mutable cache.
//!
//! The contract deliberately has no concatenation stage: a pass yields
//! per-module records, never a combined bundle.

use std::path::PathBuf;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use async_trait::async_trait;

use crate::{ContentProvider, ModuleCache, ModuleId, ModuleRecord, ProviderError};

/// Result type for walker operations.
pub type WalkerResult<T> = Result<T, WalkerError>;

/// Errors raised by the walker seam.
#[derive(Debug, thiserror::Error)]
pub enum WalkerError {
    /// The engine could not be loaded at all (not installed, wrong version).
    /// This is fatal to the feature but must not crash the host runner.
    #[error("walker engine unavailable: {0}")]
    Unavailable(String),

    /// A dependency could not be resolved from a module.
    #[error("failed to resolve '{specifier}' from {from}: {reason}")]
    Resolution {
        specifier: String,
        from: ModuleId,
        reason: String,
    },

    /// A module could not be transformed (bad syntax, transform bug).
    #[error("failed to transform {id}: {reason}")]
    Transform { id: ModuleId, reason: String },

    /// A file read forwarded from the content provider.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Construction-time configuration handed to a [`WalkerFactory`].
///
/// Mandatory settings owned by the harness (roots, provider) are fields
/// here; arbitrary engine options are forwarded verbatim through `options`.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Traversal roots (the entry set's file paths).
    pub roots: Vec<ModuleId>,
    /// External-module search paths: the host runner's directory plus any
    /// user-configured ones.
    pub external_dirs: Vec<PathBuf>,
    /// Where the walker reads file contents from.
    pub provider: Arc<dyn ContentProvider>,
    /// Engine options forwarded without interpretation (debug/source-map
    /// toggles, globals insertion, and the like).
    pub options: FxHashMap<String, serde_json::Value>,
}

/// What a concrete walker implementation supports.
#[derive(Debug, Clone, Copy)]
pub struct WalkerCapabilities {
    /// Whether file reads go through the configured [`ContentProvider`].
    /// Engines that insist on their own disk access still work, they just
    /// lose the in-memory-read optimization.
    pub in_memory_reads: bool,
}

impl Default for WalkerCapabilities {
    fn default() -> Self {
        Self {
            in_memory_reads: true,
        }
    }
}

/// One long-lived resolve-and-transform engine instance.
///
/// A pass visits everything reachable from the roots fixed at construction.
/// Records already present in the `cache` view are reused without re-reading
/// their backing files; everything absent is read through the provider,
/// transformed, and yielded. The caller owns the cache and decides what to
/// insert.
#[async_trait]
pub trait Walker: Send + Sync + std::fmt::Debug {
    fn capabilities(&self) -> WalkerCapabilities {
        WalkerCapabilities::default()
    }

    /// Run one resolve-and-transform pass.
    ///
    /// Yields every module visited this pass that was not served from
    /// `cache`. The first error aborts the pass; there is no mid-pass
    /// cancellation.
    async fn resolve(&mut self, cache: &ModuleCache) -> WalkerResult<Vec<ModuleRecord>>;
}

/// Creates walker instances.
///
/// A fresh walker is constructed on every full rebuild (the roots change).
/// Failure to create one means the engine itself is unusable; the harness
/// reacts by going permanently inert rather than crashing the host runner.
pub trait WalkerFactory: Send + Sync {
    fn create(&self, config: WalkerConfig) -> WalkerResult<Box<dyn Walker>>;
}
