use std::collections::VecDeque;
use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::queue::Queue;

use super::{LockMode, LockRequest, LockStatus, LockTable, WaitBook};

/// Every lock is exclusive: at most one holder per key, strict FIFO.
pub struct ExclusiveOnlyTable<K> {
    table: LockTable<K>,
    book: WaitBook,
}

impl<K> ExclusiveOnlyTable<K>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
{
    pub fn new(ready: Arc<dyn Queue<u64>>) -> Self {
        Self {
            table: DashMap::new(),
            book: WaitBook::new(ready),
        }
    }

    pub fn write_lock(&self, txn_id: u64, key: &K) -> bool {
        let entry = self
            .table
            .entry(key.clone())
            .or_insert_with(|| Mutex::new(VecDeque::new()));
        let mut queue = entry.lock();
        // Same txn already at the front (e.g. its own read-then-write
        // request pair on a key in both readset and writeset) is not a new
        // waiter — grant rather than queue behind itself.
        let front_is_self = queue.front().map(|r| r.txn_id) == Some(txn_id);
        queue.push_back(LockRequest {
            mode: LockMode::Exclusive,
            txn_id,
        });
        let granted = queue.len() == 1 || front_is_self;
        if !granted {
            drop(queue);
            self.book.block(txn_id);
        }
        granted
    }

    /// Exclusive-only variant treats every request identically regardless
    /// of declared mode.
    pub fn read_lock(&self, txn_id: u64, key: &K) -> bool {
        self.write_lock(txn_id, key)
    }

    pub fn release(&self, txn_id: u64, key: &K) {
        let entry = self
            .table
            .entry(key.clone())
            .or_insert_with(|| Mutex::new(VecDeque::new()));
        let mut queue = entry.lock();
        let was_front = queue.front().map(|r| r.txn_id) == Some(txn_id);
        queue.retain(|r| r.txn_id != txn_id);
        let new_front = queue.front().copied();
        drop(queue);
        drop(entry);

        if was_front {
            if let Some(front) = new_front {
                self.book.unblock(front.txn_id);
            }
        }
    }

    pub fn status(&self, key: &K) -> LockStatus {
        match self.table.get(key) {
            None => LockStatus::Unlocked,
            Some(entry) => match entry.lock().front() {
                None => LockStatus::Unlocked,
                Some(req) => LockStatus::Exclusive(req.txn_id),
            },
        }
    }
}
