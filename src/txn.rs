use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::clock::LogicalTime;

/// Lifecycle status of a transaction. Transitions are monotone forward
/// within a single attempt; an OCC restart rewinds a txn to `Incomplete` by
/// re-executing it from scratch rather than by moving status backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnStatus {
    Incomplete,
    CompletedCommit,
    CompletedAbort,
    Committed,
    Aborted,
}

/// Outcome of running a transaction body: the write set it produced plus its
/// commit/abort vote. This is the only thing the opaque body communicates
/// back to the engine.
pub struct TxnOutcome<K, V> {
    pub writes: HashMap<K, V>,
    pub commit: bool,
}

/// The external, opaque transaction procedure. Implementors read from the
/// snapshot captured in `reads` (populated by the engine before `run` is
/// called) and return a write set plus a commit/abort vote.
pub trait TxnBody<K, V>: Send + Sync {
    fn run(&self, reads: &HashMap<K, V>) -> TxnOutcome<K, V>;
}

/// A `TxnBody` built from a plain closure, for tests and small demos.
pub struct FnBody<F> {
    f: F,
}

impl<F> FnBody<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<K, V, F> TxnBody<K, V> for FnBody<F>
where
    F: Fn(&HashMap<K, V>) -> TxnOutcome<K, V> + Send + Sync,
{
    fn run(&self, reads: &HashMap<K, V>) -> TxnOutcome<K, V> {
        (self.f)(reads)
    }
}

/// A single transaction's state as it flows through the engine. Always
/// owned by exactly one component at a time — it moves through queues by
/// value (boxed), never shared behind `&mut`, so the type system rules out
/// concurrent mutation rather than relying on a convention.
pub struct Txn<K, V> {
    pub unique_id: u64,
    pub readset: HashSet<K>,
    pub writeset: HashSet<K>,
    pub reads: HashMap<K, V>,
    pub writes: HashMap<K, V>,
    pub occ_start_time: LogicalTime,
    pub status: TxnStatus,
    pub validated: bool,
    pub restarts: u32,
    pub body: Arc<dyn TxnBody<K, V>>,
}

impl<K, V> Txn<K, V>
where
    K: Eq + std::hash::Hash + Clone,
{
    pub fn new(
        unique_id: u64,
        readset: HashSet<K>,
        writeset: HashSet<K>,
        body: Arc<dyn TxnBody<K, V>>,
    ) -> Self {
        Self {
            unique_id,
            readset,
            writeset,
            reads: HashMap::new(),
            writes: HashMap::new(),
            occ_start_time: LogicalTime::ZERO,
            status: TxnStatus::Incomplete,
            validated: false,
            restarts: 0,
            body,
        }
    }

    /// All keys this transaction touches, read or written.
    pub fn all_keys(&self) -> HashSet<K> {
        self.readset.union(&self.writeset).cloned().collect()
    }

    /// Resets per-attempt state before a re-execution, keeping identity and
    /// declared read/write sets.
    pub fn reset_for_restart(&mut self) {
        self.reads.clear();
        self.writes.clear();
        self.status = TxnStatus::Incomplete;
        self.validated = false;
        self.restarts += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_keys_is_the_union() {
        let body = Arc::new(FnBody::new(|_: &HashMap<&str, i32>| TxnOutcome {
            writes: HashMap::new(),
            commit: true,
        }));
        let txn: Txn<&str, i32> = Txn::new(
            1,
            ["a", "b"].into_iter().collect(),
            ["b", "c"].into_iter().collect(),
            body,
        );
        let keys = txn.all_keys();
        assert_eq!(keys.len(), 3);
        assert!(keys.contains("a"));
        assert!(keys.contains("b"));
        assert!(keys.contains("c"));
    }

    #[test]
    fn restart_clears_attempt_state_but_not_identity() {
        let body = Arc::new(FnBody::new(|_: &HashMap<&str, i32>| TxnOutcome {
            writes: HashMap::new(),
            commit: true,
        }));
        let mut txn: Txn<&str, i32> = Txn::new(7, HashSet::new(), HashSet::new(), body);
        txn.writes.insert("x", 1);
        txn.status = TxnStatus::CompletedCommit;
        txn.reset_for_restart();
        assert_eq!(txn.unique_id, 7);
        assert!(txn.writes.is_empty());
        assert_eq!(txn.status, TxnStatus::Incomplete);
        assert_eq!(txn.restarts, 1);
    }
}
