use std::hash::Hash;
use std::sync::Arc;

use super::{apply_writes, execute_txn, expect_completed, Shared};
use crate::txn::TxnStatus;

/// Drives both LOCKING and LOCKING_EXCLUSIVE_ONLY modes — they differ only
/// in which `LockManager` variant was constructed, not in loop shape.
pub(crate) fn tick<K, V>(shared: &Arc<Shared<K, V>>) -> bool
where
    K: Eq + Hash + Clone + Ord + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    let mut did_work = false;

    if acquire_locks_for_next_ingress(shared) {
        did_work = true;
    }
    if finalize_next_completion(shared) {
        did_work = true;
    }
    if dispatch_next_ready(shared) {
        did_work = true;
    }

    did_work
}

/// All of a transaction's lock requests are issued before any are awaited,
/// in sorted key order, so a single key's wait-for edges are the only
/// source of blocking — see the deadlock-freedom argument this relies on.
fn acquire_locks_for_next_ingress<K, V>(shared: &Shared<K, V>) -> bool
where
    K: Eq + Hash + Clone + Ord + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    let Some(txn) = shared.ingress.pop() else {
        return false;
    };

    let lock_manager = shared
        .lock_manager
        .as_ref()
        .expect("locking mode always constructs a lock manager");

    let mut reads: Vec<&K> = txn.readset.iter().collect();
    reads.sort();
    let mut writes: Vec<&K> = txn.writeset.iter().collect();
    writes.sort();

    let mut blocked = 0usize;
    for key in reads {
        if !lock_manager.read_lock(txn.unique_id, key) {
            blocked += 1;
        }
    }
    for key in writes {
        if !lock_manager.write_lock(txn.unique_id, key) {
            blocked += 1;
        }
    }

    let txn_id = txn.unique_id;
    shared.locking_waiting.insert(txn_id, txn);
    if blocked == 0 {
        shared.ready.push(txn_id);
    }
    true
}

fn dispatch_next_ready<K, V>(shared: &Arc<Shared<K, V>>) -> bool
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    let Some(txn_id) = shared.ready.pop() else {
        return false;
    };
    let Some((_, txn)) = shared.locking_waiting.remove(&txn_id) else {
        return true;
    };

    let shared = Arc::clone(shared);
    shared.pool.submit(Box::new(move || {
        execute_txn(txn, shared.as_ref());
    }));
    true
}

fn finalize_next_completion<K, V>(shared: &Shared<K, V>) -> bool
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    let Some(mut txn) = shared.completion.pop() else {
        return false;
    };

    expect_completed(&txn);
    let lock_manager = shared
        .lock_manager
        .as_ref()
        .expect("locking mode always constructs a lock manager");

    match txn.status {
        TxnStatus::CompletedCommit => {
            apply_writes(&txn, shared.storage.as_ref());
            txn.status = TxnStatus::Committed;
        }
        TxnStatus::CompletedAbort => {
            txn.status = TxnStatus::Aborted;
        }
        _ => unreachable!("checked by expect_completed"),
    }

    for key in txn.readset.iter().chain(txn.writeset.iter()) {
        lock_manager.release(txn.unique_id, key);
    }

    shared.results.push(txn);
    true
}
