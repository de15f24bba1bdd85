//! Thread-safe formula cache
//!
//! A reader/writer-locked map from cache key to compiled formula. Concurrent
//! compiles of the same uncached formula are allowed; the first insert wins
//! and later writers adopt the cached entry instead of their own.

use crate::engine::Formula;
use ahash::AHashMap;
use std::sync::RwLock;

pub(crate) struct FormulaCache {
    entries: RwLock<AHashMap<String, Formula>>,
}

impl FormulaCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(AHashMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<Formula> {
        self.read().get(key).cloned()
    }

    /// Insert unless the key is already present and return the kept entry.
    pub fn insert_if_absent(&self, key: String, formula: Formula) -> Formula {
        let mut entries = self.write();
        entries.entry(key).or_insert(formula).clone()
    }

    /// Drop every entry. Called whenever a registry mutation may have
    /// changed what a compile would fold.
    pub fn clear(&self) {
        self.write().clear();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, AHashMap<String, Formula>> {
        self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, AHashMap<String, Formula>> {
        self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
