mod exclusive;
mod shared;

pub use exclusive::ExclusiveOnlyTable;
pub use shared::SharedExclusiveTable;

use std::collections::VecDeque;
use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::queue::Queue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Shared,
    Exclusive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockRequest {
    pub mode: LockMode,
    pub txn_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockStatus {
    Unlocked,
    Shared(Vec<u64>),
    Exclusive(u64),
}

/// Per-key FIFO queue of lock requests, guarded independently so unrelated
/// keys never contend on the same mutex.
pub(crate) type LockTable<K> = DashMap<K, Mutex<VecDeque<LockRequest>>>;

/// Shared bookkeeping used by both lock manager variants: how many locks a
/// txn is currently queued behind, and the queue it is pushed onto once that
/// count reaches zero.
pub(crate) struct WaitBook {
    pub(crate) counts: DashMap<u64, usize>,
    pub(crate) ready: Arc<dyn Queue<u64>>,
}

impl WaitBook {
    fn new(ready: Arc<dyn Queue<u64>>) -> Self {
        Self {
            counts: DashMap::new(),
            ready,
        }
    }

    /// Registers that `txn_id` is now blocked behind one more lock.
    fn block(&self, txn_id: u64) {
        *self.counts.entry(txn_id).or_insert(0) += 1;
    }

    /// Unblocks one of `txn_id`'s pending locks; pushes it onto the ready
    /// queue once its count reaches zero.
    fn unblock(&self, txn_id: u64) {
        let mut done = false;
        if let Some(mut count) = self.counts.get_mut(&txn_id) {
            if *count > 0 {
                *count -= 1;
            }
            done = *count == 0;
        }
        if done {
            self.counts.remove(&txn_id);
            self.ready.push(txn_id);
        }
    }
}

/// Sum type over the two lock manager variants. Fixed at construction time:
/// the mode never needs runtime polymorphism beyond this one selection, so a
/// closed `enum` replaces what would otherwise be a trait object / vtable.
pub enum LockManager<K> {
    ExclusiveOnly(ExclusiveOnlyTable<K>),
    SharedExclusive(SharedExclusiveTable<K>),
}

impl<K> LockManager<K>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
{
    pub fn exclusive_only(ready: Arc<dyn Queue<u64>>) -> Self {
        LockManager::ExclusiveOnly(ExclusiveOnlyTable::new(ready))
    }

    pub fn shared_exclusive(ready: Arc<dyn Queue<u64>>) -> Self {
        LockManager::SharedExclusive(SharedExclusiveTable::new(ready))
    }

    /// Requests an exclusive lock. Returns `true` iff granted immediately.
    pub fn write_lock(&self, txn_id: u64, key: &K) -> bool {
        match self {
            LockManager::ExclusiveOnly(t) => t.write_lock(txn_id, key),
            LockManager::SharedExclusive(t) => t.write_lock(txn_id, key),
        }
    }

    /// Requests a shared lock. Returns `true` iff granted immediately.
    pub fn read_lock(&self, txn_id: u64, key: &K) -> bool {
        match self {
            LockManager::ExclusiveOnly(t) => t.read_lock(txn_id, key),
            LockManager::SharedExclusive(t) => t.read_lock(txn_id, key),
        }
    }

    /// Releases `txn_id`'s lock on `key`, waking whatever becomes eligible.
    pub fn release(&self, txn_id: u64, key: &K) {
        match self {
            LockManager::ExclusiveOnly(t) => t.release(txn_id, key),
            LockManager::SharedExclusive(t) => t.release(txn_id, key),
        }
    }

    pub fn status(&self, key: &K) -> LockStatus {
        match self {
            LockManager::ExclusiveOnly(t) => t.status(key),
            LockManager::SharedExclusive(t) => t.status(key),
        }
    }
}
