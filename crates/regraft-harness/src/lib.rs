//! # regraft-harness
//!
//! Incremental module postprocessing for browser test runners.
//!
//! A host runner that re-executes tests on every file change invokes a
//! [`Postprocessor`] once per change cycle. Instead of re-bundling the whole
//! module graph, the postprocessor patches a persistent graph cache, wraps
//! only the modules that changed (or were newly discovered) into
//! self-registering snippets, and hands each one back to the host as an
//! independently cacheable file. A small loader script delivered alongside
//! resolves and executes modules in the browser with CommonJS semantics.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use regraft_harness::{ChangeCycle, Postprocessor, PostprocessorOptions};
//! # #[derive(Debug)] struct MyFactory;
//! # impl regraft_graph::WalkerFactory for MyFactory {
//! #     fn create(&self, _: regraft_graph::WalkerConfig)
//! #         -> regraft_graph::WalkerResult<Box<dyn regraft_graph::Walker>> { unimplemented!() }
//! # }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let factory = Arc::new(MyFactory);
//! let mut postprocessor = Postprocessor::new(
//!     factory,
//!     PostprocessorOptions::new().entry_pattern("src/*.test.js"),
//! )?;
//!
//! let cycle: ChangeCycle = /* from the host runner */
//! # ChangeCycle::new("/project/node_modules");
//! for file in postprocessor.process(cycle).await? {
//!     // hand each created file back to the host runner
//!     println!("{} ({} bytes)", file.path.display(), file.content.len());
//! }
//! # Ok(()) }
//! ```

pub mod adapter;
pub mod entries;
pub mod harness;
pub mod loader;
pub mod orchestrator;
pub mod sourcemap;
pub mod wrap;

// Logging utilities (optional, enabled with "logging" feature)
#[cfg(feature = "logging")]
pub mod logging;

#[cfg(feature = "logging")]
pub use logging::{Verbosity, init_logging, init_logging_from_env};

pub use adapter::{BundlerAdapter, TrackedFileProvider, WalkerInitializer};
pub use entries::EntrySet;
pub use harness::{ChangeCycle, CreatedFile, MemoryFile, SourceFile};
pub use loader::{COMPANION_SUFFIX, DEFAULT_PRELUDE, companion_path, loader_script, trailer_script};
pub use orchestrator::{
    EXTERNAL_MTIME_MS, LOADER_ORDER, Postprocessor, PostprocessorOptions, TRAILER_ORDER,
};
pub use sourcemap::split_source_map;
pub use wrap::wrap_module;

// Re-export the foundation seams host integrations implement.
pub use regraft_graph::{
    ContentProvider, DiskProvider, ModuleCache, ModuleId, ModuleRecord, ProviderError,
    ProviderResult, Walker, WalkerCapabilities, WalkerConfig, WalkerError, WalkerFactory,
    WalkerResult,
};

use std::path::PathBuf;

/// Error types for harness operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A resolve-and-transform pass failed; the whole cycle is rejected.
    #[error("bundling pass failed: {0}")]
    Walker(#[from] WalkerError),

    /// Invalid configuration provided.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A discovered module is neither an exposed alias nor under any
    /// external-module path; the assumptions of the cycle are violated.
    #[error("discovered module cannot be categorized: {}", .path.display())]
    Uncategorized { path: PathBuf },
}

/// Result type alias for harness operations.
pub type Result<T> = std::result::Result<T, Error>;

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::Walker(_) => "WALKER_ERROR",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::Uncategorized { .. } => "UNCATEGORIZED_MODULE",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::InvalidConfig(msg) => Some(Box::new(format!(
                "Check the postprocessor options (entry patterns are globs).\nError: {}",
                msg
            ))),
            Error::Uncategorized { path } => Some(Box::new(format!(
                "'{}' was discovered during resolution but is not a tracked file, \
                 an exposed module, or under an external-module directory.\n\
                 Add its directory via external_dir() or expose it by name.",
                path.display()
            ))),
            _ => None,
        }
    }
}
