//! Pluggable file-content provider.
//!
//! The walker reads every file it visits through a [`ContentProvider`]
//! injected at construction time, instead of reaching into the filesystem
//! directly. This is the seam that lets the harness serve contents the host
//! runner already holds in memory, which is the main latency-sensitive
//! optimization in the system: unaffected files are re-resolved on a rebuild
//! without touching disk.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors that can occur while serving file contents.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// File not found
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(String),

    /// Other provider error
    #[error("provider error: {0}")]
    Other(String),
}

/// Serves source text for a path, preferring in-memory copies over disk.
///
/// Implementations decide where contents come from; the walker only sees
/// text. Errors propagate into the bundling pass's failure channel.
#[async_trait]
pub trait ContentProvider: Send + Sync + std::fmt::Debug {
    /// Read the current contents of `path` as UTF-8 text.
    async fn read(&self, path: &Path) -> ProviderResult<String>;
}

/// Provider backed directly by the filesystem.
///
/// Used standalone in tests and as the fallback tier of layered providers.
#[derive(Debug, Default)]
pub struct DiskProvider;

impl DiskProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ContentProvider for DiskProvider {
    async fn read(&self, path: &Path) -> ProviderResult<String> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            std::fs::read_to_string(&path).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ProviderError::FileNotFound(path.clone())
                } else {
                    ProviderError::Io(format!("failed to read {}: {}", path.display(), e))
                }
            })
        })
        .await
        .map_err(|e| ProviderError::Other(format!("task join error: {}", e)))?
    }
}
