//! Entry-set resolution.
//!
//! Traversal roots for a graph generation come from one of two places: every
//! file the host classifies as a test (the default), or every tracked file
//! matching a configured entry pattern. Computed once per rebuild.

use std::sync::Arc;

use globset::{Glob, GlobSet, GlobSetBuilder};
use regraft_graph::ModuleId;
use rustc_hash::FxHashMap;

use crate::harness::{ChangeCycle, SourceFile};
use crate::{Error, Result};

/// Compile entry-pattern globs. Patterns match against relative paths.
pub fn compile_patterns(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| Error::InvalidConfig(format!("bad entry pattern '{}': {}", pattern, e)))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| Error::InvalidConfig(format!("bad entry patterns: {}", e)))
}

/// The designated entry/root modules of the current graph generation.
#[derive(Debug, Default)]
pub struct EntrySet {
    entries: FxHashMap<ModuleId, Arc<dyn SourceFile>>,
}

impl EntrySet {
    /// Compute the entry set for a rebuild.
    ///
    /// With patterns configured, any tracked file whose relative path
    /// matches becomes a root; otherwise the host's test files do.
    pub fn from_cycle(cycle: &ChangeCycle, patterns: Option<&GlobSet>) -> Self {
        let mut entries = FxHashMap::default();
        match patterns {
            Some(set) => {
                for file in &cycle.tracked {
                    if set.is_match(file.relative_path()) {
                        entries.insert(ModuleId::from_path(file.path()), Arc::clone(file));
                    }
                }
            }
            None => {
                for file in &cycle.tests {
                    entries.insert(ModuleId::from_path(file.path()), Arc::clone(file));
                }
            }
        }
        Self { entries }
    }

    /// Roots to seed the walker with, sorted for deterministic traversal.
    pub fn roots(&self) -> Vec<ModuleId> {
        let mut roots: Vec<_> = self.entries.keys().cloned().collect();
        roots.sort();
        roots
    }

    /// Entries the host does not classify as tests. These are not executed
    /// by `loadTests()` and need the trailer script.
    pub fn non_test_roots(&self) -> Vec<ModuleId> {
        let mut roots: Vec<_> = self
            .entries
            .iter()
            .filter(|(_, file)| !file.is_test())
            .map(|(id, _)| id.clone())
            .collect();
        roots.sort();
        roots
    }

    pub fn contains(&self, id: &ModuleId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn originating_file(&self, id: &ModuleId) -> Option<&Arc<dyn SourceFile>> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::MemoryFile;

    fn cycle_with(tracked: Vec<Arc<dyn SourceFile>>, tests: Vec<Arc<dyn SourceFile>>) -> ChangeCycle {
        let mut cycle = ChangeCycle::new("/project/node_modules");
        cycle.tracked = tracked;
        cycle.tests = tests;
        cycle
    }

    #[test]
    fn defaults_to_test_files() {
        let test: Arc<dyn SourceFile> =
            Arc::new(MemoryFile::test("/p/src/a.test.js", "src/a.test.js", ""));
        let src: Arc<dyn SourceFile> = Arc::new(MemoryFile::new("/p/src/a.js", "src/a.js", ""));
        let cycle = cycle_with(vec![Arc::clone(&src), Arc::clone(&test)], vec![test]);

        let entries = EntrySet::from_cycle(&cycle, None);
        assert_eq!(entries.roots(), vec![ModuleId::new("/p/src/a.test.js")]);
    }

    #[test]
    fn patterns_override_test_classification() {
        let entry: Arc<dyn SourceFile> =
            Arc::new(MemoryFile::new("/p/src/entry.js", "src/entry.js", ""));
        let util: Arc<dyn SourceFile> = Arc::new(MemoryFile::new("/p/src/util.js", "src/util.js", ""));
        let cycle = cycle_with(vec![Arc::clone(&entry), util], vec![]);

        let patterns = compile_patterns(&["src/entry.js".to_string()]).unwrap();
        let entries = EntrySet::from_cycle(&cycle, Some(&patterns));
        assert_eq!(entries.roots(), vec![ModuleId::new("/p/src/entry.js")]);
        assert_eq!(entries.non_test_roots(), vec![ModuleId::new("/p/src/entry.js")]);
    }

    #[test]
    fn glob_patterns_match_whole_directories() {
        let a: Arc<dyn SourceFile> = Arc::new(MemoryFile::new("/p/src/a.js", "src/a.js", ""));
        let b: Arc<dyn SourceFile> = Arc::new(MemoryFile::new("/p/lib/b.js", "lib/b.js", ""));
        let cycle = cycle_with(vec![a, b], vec![]);

        let patterns = compile_patterns(&["src/*.js".to_string()]).unwrap();
        let entries = EntrySet::from_cycle(&cycle, Some(&patterns));
        assert_eq!(entries.len(), 1);
        assert!(entries.contains(&ModuleId::new("/p/src/a.js")));
    }

    #[test]
    fn bad_pattern_is_invalid_config() {
        let err = compile_patterns(&["[".to_string()]).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_entries_are_excluded_from_trailer_roots() {
        let test: Arc<dyn SourceFile> =
            Arc::new(MemoryFile::test("/p/src/a.test.js", "src/a.test.js", ""));
        let entry: Arc<dyn SourceFile> =
            Arc::new(MemoryFile::new("/p/src/entry.js", "src/entry.js", ""));
        let cycle = cycle_with(vec![Arc::clone(&test), Arc::clone(&entry)], vec![test]);

        let patterns = compile_patterns(&["src/**".to_string()]).unwrap();
        let entries = EntrySet::from_cycle(&cycle, Some(&patterns));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries.non_test_roots(), vec![ModuleId::new("/p/src/entry.js")]);
    }
}
