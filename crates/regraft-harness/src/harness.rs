//! Host-runner interface types.
//!
//! The host runner owns file tracking, change detection, and file serving.
//! Per cycle it hands the postprocessor a [`ChangeCycle`] and receives back
//! [`CreatedFile`] requests. File contents cross the boundary through the
//! async [`SourceFile`] accessor, never through paths alone, so the harness
//! can serve in-memory copies.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use regraft_graph::ProviderResult;
use serde::Serialize;

/// A file the host runner tracks.
#[async_trait]
pub trait SourceFile: Send + Sync + std::fmt::Debug {
    /// Absolute path.
    fn path(&self) -> &Path;

    /// Path relative to the host's base directory; entry patterns match
    /// against this.
    fn relative_path(&self) -> &Path;

    /// Whether the host classifies this file as a test.
    fn is_test(&self) -> bool;

    /// Current content, served from whatever the host has loaded.
    async fn content(&self) -> ProviderResult<String>;
}

/// Change notification for one host processing cycle.
#[derive(Debug, Clone)]
pub struct ChangeCycle {
    /// Any file added since the last cycle (forces a rebuild).
    pub files_added: bool,
    /// Any file deleted since the last cycle (forces a rebuild).
    pub files_removed: bool,
    /// Files whose content changed this cycle.
    pub changed: Vec<Arc<dyn SourceFile>>,
    /// The full tracked-file set.
    pub tracked: Vec<Arc<dyn SourceFile>>,
    /// Tracked files classified as tests.
    pub tests: Vec<Arc<dyn SourceFile>>,
    /// The host's external-module directory (e.g. its node_modules).
    pub external_dir: PathBuf,
}

impl ChangeCycle {
    pub fn new(external_dir: impl Into<PathBuf>) -> Self {
        Self {
            files_added: false,
            files_removed: false,
            changed: Vec::new(),
            tracked: Vec::new(),
            tests: Vec::new(),
            external_dir: external_dir.into(),
        }
    }
}

/// A file-creation request handed back to the host runner.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedFile {
    /// Destination path the host should serve this content under.
    pub path: PathBuf,
    /// When set, marks this file as the compiled companion of an original
    /// tracked descriptor.
    pub companion_of: Option<PathBuf>,
    pub content: String,
    /// Load-order hint: most negative loads first, most positive loads
    /// last, absent means host default.
    pub order: Option<i64>,
    /// Source map extracted from the compiled content, if any.
    pub source_map: Option<String>,
    /// Fixed modification time in milliseconds. Set for externally-sourced
    /// library files so the host can cache them indefinitely.
    pub timestamp: Option<u64>,
}

impl CreatedFile {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            companion_of: None,
            content: content.into(),
            order: None,
            source_map: None,
            timestamp: None,
        }
    }

    pub fn companion_of(mut self, original: impl Into<PathBuf>) -> Self {
        self.companion_of = Some(original.into());
        self
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_source_map(mut self, map: impl Into<String>) -> Self {
        self.source_map = Some(map.into());
        self
    }

    pub fn with_timestamp(mut self, millis: u64) -> Self {
        self.timestamp = Some(millis);
        self
    }
}

/// In-memory [`SourceFile`] implementation.
///
/// Hosts with their own descriptor types implement [`SourceFile`] directly;
/// this one backs tests and embedded usage. Content is behind a lock so a
/// "file edit" between cycles is just `set_content`.
#[derive(Debug)]
pub struct MemoryFile {
    path: PathBuf,
    relative: PathBuf,
    is_test: bool,
    content: RwLock<String>,
}

impl MemoryFile {
    pub fn new(
        path: impl Into<PathBuf>,
        relative: impl Into<PathBuf>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            relative: relative.into(),
            is_test: false,
            content: RwLock::new(content.into()),
        }
    }

    /// Same as [`MemoryFile::new`] but classified as a test file.
    pub fn test(
        path: impl Into<PathBuf>,
        relative: impl Into<PathBuf>,
        content: impl Into<String>,
    ) -> Self {
        let mut file = Self::new(path, relative, content);
        file.is_test = true;
        file
    }

    pub fn set_content(&self, content: impl Into<String>) {
        *self.content.write() = content.into();
    }
}

#[async_trait]
impl SourceFile for MemoryFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn relative_path(&self) -> &Path {
        &self.relative
    }

    fn is_test(&self) -> bool {
        self.is_test
    }

    async fn content(&self) -> ProviderResult<String> {
        Ok(self.content.read().clone())
    }
}
