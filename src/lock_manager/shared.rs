use std::collections::VecDeque;
use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::queue::Queue;

use super::{LockMode, LockRequest, LockStatus, LockTable, WaitBook};

/// Shared locks may coexist among a contiguous run of readers at the head of
/// the queue; exclusive locks are solitary. Requests queue in FIFO arrival
/// order per key.
pub struct SharedExclusiveTable<K> {
    table: LockTable<K>,
    book: WaitBook,
}

impl<K> SharedExclusiveTable<K>
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
        // A txn whose key is in both readset and writeset already holds the
        // front (shared) request for this key by the time it asks for the
        // exclusive one — that is not a new waiter, it is the same txn
        // converting/extending its own hold, so it must be granted rather
        // than queued behind itself.
        let front_is_self = queue.front().map(|r| r.txn_id) == Some(txn_id);
        let granted = queue.is_empty() || front_is_self;
        queue.push_back(LockRequest {
            mode: LockMode::Exclusive,
            txn_id,
        });
        if granted {
            true
        } else {
            drop(queue);
            self.book.block(txn_id);
            false
        }
    }

    pub fn read_lock(&self, txn_id: u64, key: &K) -> bool {
        let entry = self
            .table
            .entry(key.clone())
            .or_insert_with(|| Mutex::new(VecDeque::new()));
        let mut queue = entry.lock();
        // Granted iff every existing request is Shared (i.e. this joins a
        // contiguous run of readers at the head), or the queue is empty.
        let granted = queue.iter().all(|r| r.mode == LockMode::Shared);
        queue.push_back(LockRequest {
            mode: LockMode::Shared,
            txn_id,
        });
        if granted {
            true
        } else {
            drop(queue);
            self.book.block(txn_id);
            false
        }
    }

    pub fn release(&self, txn_id: u64, key: &K) {
        let entry = self
            .table
            .entry(key.clone())
            .or_insert_with(|| Mutex::new(VecDeque::new()));
        let mut queue = entry.lock();

        let removed_pos = queue.iter().position(|r| r.txn_id == txn_id);
        let Some(pos) = removed_pos else {
            return;
        };
        let released_mode = queue[pos].mode;
        let was_front = pos == 0;
        queue.remove(pos);

        // Collect who to wake while still holding the lock, then wake after
        // dropping it so we never call back into the ready queue under the
        // per-key mutex.
        let mut to_wake = Vec::new();

        if was_front {
            if let Some(new_front) = queue.front() {
                if new_front.mode == LockMode::Exclusive {
                    to_wake.push(new_front.txn_id);
                } else if released_mode == LockMode::Exclusive {
                    // Releasing the head writer frees the whole contiguous
                    // reader run queued directly behind it (the corrected
                    // contract: wake the run, not only a single-step
                    // prefix).
                    for req in queue.iter() {
                        if req.mode == LockMode::Shared {
                            to_wake.push(req.txn_id);
                        } else {
                            break;
                        }
                    }
                }
                // else: released_mode was Shared and the new front is also
                // Shared — that run was already granted, nothing to wake.
            }
        }

        drop(queue);
        drop(entry);

        for txn in to_wake {
            self.book.unblock(txn);
        }
    }

    pub fn status(&self, key: &K) -> LockStatus {
        match self.table.get(key) {
            None => LockStatus::Unlocked,
            Some(entry) => {
                let queue = entry.lock();
                match queue.front() {
                    None => LockStatus::Unlocked,
                    Some(req) if req.mode == LockMode::Exclusive => {
                        LockStatus::Exclusive(req.txn_id)
                    }
                    Some(_) => LockStatus::Shared(
                        queue
                            .iter()
                            .take_while(|r| r.mode == LockMode::Shared)
                            .map(|r| r.txn_id)
                            .collect(),
                    ),
                }
            }
        }
    }
}
