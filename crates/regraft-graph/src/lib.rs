//! # regraft-graph
//!
//! Foundation crate for the regraft incremental test-bundling harness.
//!
//! This crate holds the pieces that are independent of any particular host
//! test runner: module identity and records, the dependency graph cache that
//! persists across incremental passes, the [`ContentProvider`] seam for
//! serving file contents from memory instead of disk, and the [`Walker`]
//! interface behind which the external dependency-graph engine lives.
//!
//! The harness crate (`regraft-harness`) drives these types once per host
//! change cycle; nothing here knows about change notifications or emitted
//! files.

pub mod cache;
pub mod module_id;
pub mod provider;
pub mod record;
pub mod walker;

pub use cache::ModuleCache;
pub use module_id::ModuleId;
pub use provider::{ContentProvider, DiskProvider, ProviderError, ProviderResult};
pub use record::ModuleRecord;
pub use walker::{
    Walker, WalkerCapabilities, WalkerConfig, WalkerError, WalkerFactory, WalkerResult,
};
