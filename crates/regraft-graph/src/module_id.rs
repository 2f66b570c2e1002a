use std::fmt;
use std::path::{Path, PathBuf};

use path_clean::PathClean;
use serde::{Deserialize, Serialize};

/// Canonical identity of a module in the graph.
///
/// For modules backed by a file this is the cleaned absolute path. Modules
/// reachable by a short external name (an "exposed" module) additionally
/// appear in the cache under that alias, but the alias never replaces the
/// identifier stored here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(String);

impl ModuleId {
    /// Create an identifier from a raw string (path or exposed alias).
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Create an identifier from a filesystem path, cleaning redundant
    /// components so the same file always yields the same key.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let cleaned = path.as_ref().to_path_buf().clean();
        Self(cleaned.to_string_lossy().into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// View the identifier as a path. Only meaningful for file-backed ids.
    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }

    /// True if this identifier lies under `dir`.
    pub fn is_under(&self, dir: &Path) -> bool {
        self.as_path().starts_with(dir)
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&Path> for ModuleId {
    fn from(path: &Path) -> Self {
        Self::from_path(path)
    }
}

impl From<PathBuf> for ModuleId {
    fn from(path: PathBuf) -> Self {
        Self::from_path(path)
    }
}

impl From<&str> for ModuleId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_path_cleans_components() {
        let a = ModuleId::from_path("/src/lib/../app.js");
        let b = ModuleId::from_path("/src/app.js");
        assert_eq!(a, b);
    }

    #[test]
    fn is_under_matches_prefix_directories() {
        let id = ModuleId::from_path("/project/node_modules/lodash/index.js");
        assert!(id.is_under(Path::new("/project/node_modules")));
        assert!(!id.is_under(Path::new("/project/src")));
    }

    #[test]
    fn display_round_trips() {
        let id = ModuleId::new("/a/b.js");
        assert_eq!(id.to_string(), "/a/b.js");
        assert_eq!(id.as_str(), "/a/b.js");
    }
}
