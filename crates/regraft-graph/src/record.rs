use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ModuleId;

/// The most recent resolve-and-transform result for one module.
///
/// Records live in the [`crate::ModuleCache`] for the lifetime of the current
/// graph generation and are replaced when the owning file changes or the
/// graph is rebuilt.
///
/// The dependency mapping uses a `BTreeMap` so anything serialized from it
/// (notably the wrapper snippet emitted per module) is deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub id: ModuleId,
    /// Transformed source text, possibly still carrying an inline source map.
    pub source: String,
    /// Require-specifier to resolved identifier, as discovered by the walker.
    pub deps: BTreeMap<String, ModuleId>,
    /// Short external name for modules reachable without a full path.
    pub exposed: Option<String>,
    /// True for designated entry/test modules (traversal roots).
    pub is_entry: bool,
}

impl ModuleRecord {
    pub fn new(id: impl Into<ModuleId>, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            deps: BTreeMap::new(),
            exposed: None,
            is_entry: false,
        }
    }

    pub fn with_dep(mut self, specifier: impl Into<String>, target: impl Into<ModuleId>) -> Self {
        self.deps.insert(specifier.into(), target.into());
        self
    }

    pub fn exposed_as(mut self, alias: impl Into<String>) -> Self {
        self.exposed = Some(alias.into());
        self
    }

    pub fn entry(mut self) -> Self {
        self.is_entry = true;
        self
    }
}
