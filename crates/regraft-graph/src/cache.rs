//! Dependency graph cache.
//!
//! Maps module identifiers (and exposed aliases) to the most recent
//! [`ModuleRecord`] produced by the walker. The cache persists across
//! incremental passes and is selectively invalidated: deleting a changed
//! file's record before a pass forces the walker to revisit exactly that
//! file, while untouched records are reused without re-reading disk.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::{ModuleId, ModuleRecord};

/// Cache of resolved modules for the current graph generation.
///
/// Invariant: at most one live record per identifier. Records with an
/// exposed alias are additionally indexed under that alias; both keys are
/// inserted together and invalidated together (removal by identifier drops
/// the alias entry pointing at it).
#[derive(Debug, Default)]
pub struct ModuleCache {
    records: FxHashMap<ModuleId, Arc<ModuleRecord>>,
    /// alias -> identifier owning that alias
    aliases: FxHashMap<String, ModuleId>,
}

impl ModuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a record by identifier.
    pub fn get(&self, id: &ModuleId) -> Option<&Arc<ModuleRecord>> {
        self.records.get(id)
    }

    /// Look up a record by exposed alias.
    pub fn get_by_alias(&self, alias: &str) -> Option<&Arc<ModuleRecord>> {
        let id = self.aliases.get(alias)?;
        self.records.get(id)
    }

    pub fn contains(&self, id: &ModuleId) -> bool {
        self.records.contains_key(id)
    }

    /// Insert or overwrite a record. The alias index is updated in the same
    /// operation so the two keys can never disagree.
    pub fn insert(&mut self, record: Arc<ModuleRecord>) {
        if let Some(alias) = &record.exposed {
            self.aliases.insert(alias.clone(), record.id.clone());
        }
        self.records.insert(record.id.clone(), record);
    }

    /// Remove a record by identifier, dropping its alias entry as well.
    ///
    /// Used before a pass to force re-resolution of a changed file.
    pub fn remove(&mut self, id: &ModuleId) -> Option<Arc<ModuleRecord>> {
        let record = self.records.remove(id)?;
        if let Some(alias) = &record.exposed {
            // Only drop the alias if it still points at this identifier.
            if self.aliases.get(alias) == Some(id) {
                self.aliases.remove(alias);
            }
        }
        Some(record)
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.aliases.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over all live records, in no particular order.
    pub fn records(&self) -> impl Iterator<Item = &Arc<ModuleRecord>> {
        self.records.values()
    }
}
