//! Caller-owned cache of parameter tables.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use buff_core::ParameterTable;
use tracing::trace;

/// Parameter tables keyed by the path they were loaded from.
///
/// Owned by whoever drives a batch of units; nothing here is global. Tables
/// are shared through [`Arc`] so repeated lookups do not copy them.
#[derive(Debug, Default)]
pub struct ParameterCache {
    tables: HashMap<PathBuf, Arc<ParameterTable>>,
    hits: usize,
    misses: usize,
}

impl ParameterCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<Arc<ParameterTable>> {
        self.tables.get(path).cloned()
    }

    /// Returns the cached table for `path`, calling `load` on a miss.
    ///
    /// A failed load leaves the cache unchanged.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        path: &Path,
        load: impl FnOnce(&Path) -> Result<ParameterTable, E>,
    ) -> Result<Arc<ParameterTable>, E> {
        if let Some(table) = self.tables.get(path) {
            self.hits += 1;
            trace!(path = %path.display(), "parameter cache hit");
            return Ok(Arc::clone(table));
        }
        self.misses += 1;
        let table = Arc::new(load(path)?);
        self.tables.insert(path.to_path_buf(), Arc::clone(&table));
        Ok(table)
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, table: ParameterTable) {
        self.tables.insert(path.into(), Arc::new(table));
    }

    /// Drops one entry. Returns whether it was present.
    pub fn invalidate(&mut self, path: &Path) -> bool {
        self.tables.remove(path).is_some()
    }

    pub fn clear(&mut self) {
        self.tables.clear();
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(value: f64) -> ParameterTable {
        ParameterTable::new().with("skill.hit1", value)
    }

    #[test]
    fn loads_once_per_path() {
        let mut cache = ParameterCache::new();
        let path = Path::new("params/amber.json");
        let mut loads = 0;
        for _ in 0..3 {
            let loaded = cache
                .get_or_try_insert_with(path, |_| {
                    loads += 1;
                    Ok::<_, ()>(table(12.0))
                })
                .unwrap();
            assert_eq!(buff_core::resolve("skill.hit1", &loaded), Some(12.0));
        }
        assert_eq!(loads, 1);
        assert_eq!((cache.hits(), cache.misses()), (2, 1));
    }

    #[test]
    fn failed_loads_are_not_cached() {
        let mut cache = ParameterCache::new();
        let path = Path::new("params/missing.json");
        let result = cache.get_or_try_insert_with(path, |_| Err("no such file"));
        assert_eq!(result, Err("no such file"));
        assert!(cache.is_empty());
        assert!(cache.get(path).is_none());
    }

    #[test]
    fn invalidation_forces_a_reload() {
        let mut cache = ParameterCache::new();
        let path = Path::new("params/amber.json");
        cache.insert(path, table(1.0));
        assert!(cache.invalidate(path));
        assert!(!cache.invalidate(path));

        let reloaded = cache
            .get_or_try_insert_with(path, |_| Ok::<_, ()>(table(2.0)))
            .unwrap();
        assert_eq!(buff_core::resolve("skill.hit1", &reloaded), Some(2.0));
        cache.clear();
        assert_eq!(cache.len(), 0);
    }
}
