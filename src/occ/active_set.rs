use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;

/// Concurrent registry of in-flight P_OCC transactions, keyed by id, with
/// each entry carrying the keys that transaction declared (read ∪ write).
///
/// `snapshot` copies entries out from under the map rather than handing back
/// any reference into its interior, so a validator never observes another
/// thread's concurrent insert/erase mid-validation.
pub struct ActiveSet<K> {
    entries: DashMap<u64, Arc<HashSet<K>>>,
}

impl<K> Default for ActiveSet<K> {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<K> ActiveSet<K>
where
    K: Eq + Hash + Clone,
{
    pub fn insert(&self, txn_id: u64, keys: Arc<HashSet<K>>) {
        self.entries.insert(txn_id, keys);
    }

    pub fn erase(&self, txn_id: u64) {
        self.entries.remove(&txn_id);
    }

    /// Owned snapshot of every other active transaction's declared keys.
    pub fn snapshot_excluding(&self, txn_id: u64) -> Vec<(u64, Arc<HashSet<K>>)> {
        self.entries
            .iter()
            .filter(|entry| *entry.key() != txn_id)
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
