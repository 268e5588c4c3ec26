use std::hash::Hash;

use super::{apply_writes, execute_txn, expect_completed, Shared};
use crate::txn::TxnStatus;

/// No concurrency control: execute each transaction to completion before
/// looking at the next one. Baseline correctness mode.
pub(crate) fn tick<K, V>(shared: &Shared<K, V>) -> bool
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    let Some(txn) = shared.ingress.pop() else {
        return false;
    };

    execute_txn(txn, shared);
    // execute_txn pushed onto the completion queue; drain it immediately
    // since SERIAL mode has no parallelism to overlap with.
    let mut txn = shared
        .completion
        .pop()
        .expect("serial execution always completes synchronously onto the completion queue");

    expect_completed(&txn);
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
    shared.results.push(txn);
    true
}
