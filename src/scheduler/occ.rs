use std::hash::Hash;
use std::sync::Arc;

use super::{apply_writes, execute_txn, expect_completed, Shared};
use crate::occ::validate_serial;
use crate::txn::TxnStatus;

/// Serial-validation OCC: transactions execute optimistically in parallel
/// with no locks, then are validated one at a time by the scheduler thread
/// itself (hence "serial" — the validation step is never concurrent with
/// another validation).
pub(crate) fn tick<K, V>(shared: &Arc<Shared<K, V>>) -> bool
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    let mut did_work = false;
    if dispatch_next_ingress(shared) {
        did_work = true;
    }
    if validate_next_completion(shared) {
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

fn validate_next_completion<K, V>(shared: &Arc<Shared<K, V>>) -> bool
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    let Some(mut txn) = shared.completion.pop() else {
        return false;
    };

    expect_completed(&txn);
    match txn.status {
        TxnStatus::CompletedAbort => {
            txn.status = TxnStatus::Aborted;
            shared.results.push(txn);
        }
        TxnStatus::CompletedCommit => {
            if validate_serial(&txn, shared.storage.as_ref()) {
                apply_writes(&txn, shared.storage.as_ref());
                txn.status = TxnStatus::Committed;
                shared.results.push(txn);
            } else {
                restart(txn, shared);
            }
        }
        _ => unreachable!("checked by expect_completed"),
    }
    true
}

/// Re-executes a transaction from scratch after a failed validation. The
/// validator never marks a txn `Aborted` on its own account — only the
/// body's own commit/abort vote can do that; this path always tries again,
/// unless a restart cap is configured.
fn restart<K, V>(mut txn: Box<crate::txn::Txn<K, V>>, shared: &Arc<Shared<K, V>>)
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    if let Some(max) = shared.config.max_occ_restarts {
        if txn.restarts >= max {
            tracing::warn!(txn_id = txn.unique_id, restarts = txn.restarts, "OCC restart cap hit, aborting");
            txn.status = TxnStatus::Aborted;
            shared.results.push(txn);
            return;
        }
    }
    txn.reset_for_restart();
    txn.occ_start_time = shared.clock.tick();
    let shared = Arc::clone(shared);
    shared.pool.submit(Box::new(move || {
        execute_txn(txn, shared.as_ref());
    }));
}
