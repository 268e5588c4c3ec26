mod active_set;

pub use active_set::ActiveSet;

use std::hash::Hash;

use crate::storage::Storage;
use crate::txn::Txn;

/// Serial OCC validation: a transaction is valid iff none of the keys it
/// touched were written at or after its start time. `>=` (not strict `>`) is
/// the intended comparison — a write landing exactly at `occ_start_time` is
/// a conflict.
pub fn validate_serial<K, V, S>(txn: &Txn<K, V>, storage: &S) -> bool
where
    K: Eq + Hash + Clone,
    S: Storage<K, V>,
{
    txn.all_keys()
        .iter()
        .all(|key| storage.timestamp(key) < txn.occ_start_time)
}

/// Parallel OCC validation: in addition to the serial timestamp check, a
/// transaction must not overlap keys with any other transaction concurrently
/// active under optimistic execution (full read∪write set overlap is the
/// documented intent, not merely re-checking storage timestamps).
pub fn validate_parallel<K, V, S>(
    txn: &Txn<K, V>,
    storage: &S,
    active: &[(u64, std::sync::Arc<std::collections::HashSet<K>>)],
) -> bool
where
    K: Eq + Hash + Clone,
    S: Storage<K, V>,
{
    if !validate_serial(txn, storage) {
        return false;
    }
    let mine = txn.all_keys();
    active
        .iter()
        .all(|(_, other_keys)| mine.is_disjoint(other_keys))
}
