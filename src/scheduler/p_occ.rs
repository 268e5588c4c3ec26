use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;

use super::{apply_writes, execute_txn, expect_completed, Shared};
use crate::occ::validate_parallel;
use crate::txn::{Txn, TxnStatus};

/// Parallel-validation OCC: both execution and validation run concurrently
/// on the worker pool. An active set tracks which transactions are
/// currently executing or validating so a validator can check read/write
/// set overlap against its peers, not just against committed storage state.
pub(crate) fn tick<K, V>(shared: &Arc<Shared<K, V>>) -> bool
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    let mut did_work = false;

    if dispatch_next_ingress(shared) {
        did_work = true;
    }

    for _ in 0..shared.config.completion_batch {
        if !dispatch_next_completion(shared) {
            break;
        }
        did_work = true;
    }

    for _ in 0..shared.config.validated_batch {
        if !finalize_next_validated(shared) {
            break;
        }
        did_work = true;
    }

    did_work
}

fn dispatch_next_ingress<K, V>(shared: &Arc<Shared<K, V>>) -> bool
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    let Some(mut txn) = shared.ingress.pop() else {
        return false;
    };
    txn.occ_start_time = shared.clock.tick();

    let shared = Arc::clone(shared);
    shared.pool.submit(Box::new(move || {
        execute_txn(txn, shared.as_ref());
    }));
    true
}

/// Pulls one finished execution off the completion queue, snapshots the
/// active set *before* registering this txn in it (so the candidate never
/// sees itself, and — more importantly — never sees a peer that starts
/// after it does), then inserts and dispatches validation onto the pool.
fn dispatch_next_completion<K, V>(shared: &Arc<Shared<K, V>>) -> bool
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    let Some(mut txn) = shared.completion.pop() else {
        return false;
    };

    expect_completed(&txn);
    if txn.status == TxnStatus::CompletedAbort {
        txn.status = TxnStatus::Aborted;
        shared.results.push(txn);
        return true;
    }

    let peers = shared.active_set.snapshot_excluding(txn.unique_id);

    let keys: Arc<HashSet<K>> = Arc::new(txn.all_keys());
    shared.active_set.insert(txn.unique_id, Arc::clone(&keys));

    let shared = Arc::clone(shared);
    shared.pool.submit(Box::new(move || {
        validate_and_enqueue(txn, peers, &shared);
    }));
    true
}

/// Runs on a worker thread: validates against storage timestamps and the
/// active-set snapshot taken on the scheduler thread at dispatch time,
/// applies writes inside the validator when valid (so the resulting
/// timestamp is visible to concurrently-running validators), then always
/// pushes to the validated queue for the scheduler to finalize.
fn validate_and_enqueue<K, V>(
    mut txn: Box<Txn<K, V>>,
    peers: Vec<(u64, Arc<HashSet<K>>)>,
    shared: &Shared<K, V>,
) where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    let valid = validate_parallel(&txn, shared.storage.as_ref(), &peers);
    if valid {
        apply_writes(&txn, shared.storage.as_ref());
    }
    txn.validated = valid;
    shared.validated.push(txn);
}

fn finalize_next_validated<K, V>(shared: &Arc<Shared<K, V>>) -> bool
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    let Some(mut txn) = shared.validated.pop() else {
        return false;
    };

    shared.active_set.erase(txn.unique_id);

    if txn.validated {
        txn.status = TxnStatus::Committed;
        shared.results.push(txn);
    } else if let Some(max) = shared.config.max_occ_restarts {
        if txn.restarts >= max {
            tracing::warn!(txn_id = txn.unique_id, restarts = txn.restarts, "P_OCC restart cap hit, aborting");
            txn.status = TxnStatus::Aborted;
            shared.results.push(txn);
        } else {
            restart(txn, shared);
        }
    } else {
        restart(txn, shared);
    }
    true
}

fn restart<K, V>(mut txn: Box<Txn<K, V>>, shared: &Arc<Shared<K, V>>)
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    txn.reset_for_restart();
    txn.occ_start_time = shared.clock.tick();
    let shared = Arc::clone(shared);
    shared.pool.submit(Box::new(move || {
        execute_txn(txn, shared.as_ref());
    }));
}
