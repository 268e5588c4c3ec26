mod locking;
mod occ;
mod p_occ;
mod serial;

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::clock::Clock;
use crate::config::{CcMode, Config};
use crate::error::die;
use crate::lock_manager::LockManager;
use crate::occ::ActiveSet;
use crate::pool::WorkerPool;
use crate::queue::{Queue, SegQueueAdapter};
use crate::storage::Storage;
use crate::txn::{Txn, TxnBody, TxnStatus};

pub type BoxTxn<K, V> = Box<Txn<K, V>>;

/// The engine's shared, mode-agnostic state. Individual mode loops (in
/// `serial`, `locking`, `occ`, `p_occ`) borrow this to do their work; the
/// scheduler thread in this module drives which ones run.
pub(crate) struct Shared<K, V> {
    pub(crate) config: Config,
    pub(crate) storage: Arc<dyn Storage<K, V>>,
    pub(crate) pool: Arc<dyn WorkerPool>,
    pub(crate) clock: Clock,
    pub(crate) ingress: Arc<dyn Queue<BoxTxn<K, V>>>,
    pub(crate) completion: Arc<dyn Queue<BoxTxn<K, V>>>,
    pub(crate) validated: Arc<dyn Queue<BoxTxn<K, V>>>,
    pub(crate) results: Arc<dyn Queue<BoxTxn<K, V>>>,
    pub(crate) ready: Arc<dyn Queue<u64>>,
    pub(crate) lock_manager: Option<LockManager<K>>,
    /// Transactions parked awaiting lock grants, keyed by id so the ready
    /// queue (which only carries ids) can hand them back for dispatch.
    /// Unused outside the LOCKING modes.
    pub(crate) locking_waiting: DashMap<u64, BoxTxn<K, V>>,
    pub(crate) active_set: ActiveSet<K>,
    pub(crate) in_flight: std::sync::atomic::AtomicU64,
}

/// Executes a transaction's body against a snapshot read from storage,
/// recording the outcome on the txn and pushing it onto the completion
/// queue. Runs on a worker thread.
pub(crate) fn execute_txn<K, V>(mut txn: BoxTxn<K, V>, shared: &Shared<K, V>)
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    for key in txn.all_keys() {
        if let Some(value) = shared.storage.read(&key) {
            txn.reads.insert(key, value);
        }
    }

    let outcome = txn.body.run(&txn.reads);
    txn.writes = outcome.writes;
    txn.status = if outcome.commit {
        TxnStatus::CompletedCommit
    } else {
        TxnStatus::CompletedAbort
    };

    shared.completion.push(txn);
}

/// Applies every write in a committed transaction's write set to storage.
pub(crate) fn apply_writes<K, V>(txn: &Txn<K, V>, storage: &dyn Storage<K, V>)
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    for (key, value) in txn.writes.iter() {
        storage.write(key.clone(), value.clone());
    }
}

/// Checks that a completed transaction landed in one of the two terminal
/// completion states. Anything else means a worker task skipped setting the
/// status, which is a programming error in the engine, not a data issue —
/// fatal per the original's `DIE` contract.
pub(crate) fn expect_completed<K, V>(txn: &Txn<K, V>) {
    match txn.status {
        TxnStatus::CompletedCommit | TxnStatus::CompletedAbort => {}
        other => die(format!(
            "txn {} finished execution with unexpected status {other:?}",
            txn.unique_id
        )),
    }
}

/// The engine's public handle: construct with a [`Config`], submit
/// transactions, and pull finished ones off the back.
pub struct Engine<K, V> {
    shared: Arc<Shared<K, V>>,
    next_id: AtomicU64,
    shutdown: Arc<AtomicBool>,
    scheduler_thread: Mutex<Option<JoinHandle<()>>>,
}

impl<K, V> Engine<K, V>
where
    K: Eq + Hash + Clone + Ord + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(config: Config, storage: Arc<dyn Storage<K, V>>) -> Self {
        let pool: Arc<dyn WorkerPool> = Arc::new(crate::pool::RayonWorkerPool::new(
            config.worker_threads,
        ));
        Self::with_pool(config, storage, pool)
    }

    pub fn with_pool(
        config: Config,
        storage: Arc<dyn Storage<K, V>>,
        pool: Arc<dyn WorkerPool>,
    ) -> Self {
        let ready: Arc<dyn Queue<u64>> = Arc::new(SegQueueAdapter::default());
        let lock_manager = match config.mode {
            CcMode::Locking => Some(LockManager::shared_exclusive(Arc::clone(&ready))),
            CcMode::LockingExclusiveOnly => {
                Some(LockManager::exclusive_only(Arc::clone(&ready)))
            }
            _ => None,
        };

        let shared = Arc::new(Shared {
            config: config.clone(),
            storage,
            pool,
            clock: Clock::new(),
            ingress: Arc::new(SegQueueAdapter::default()),
            completion: Arc::new(SegQueueAdapter::default()),
            validated: Arc::new(SegQueueAdapter::default()),
            results: Arc::new(SegQueueAdapter::default()),
            ready,
            lock_manager,
            locking_waiting: DashMap::new(),
            active_set: ActiveSet::default(),
            in_flight: std::sync::atomic::AtomicU64::new(0),
        });

        let shutdown = Arc::new(AtomicBool::new(false));
        let thread_shared = Arc::clone(&shared);
        let thread_shutdown = Arc::clone(&shutdown);
        let handle = std::thread::Builder::new()
            .name("txn-scheduler".into())
            .spawn(move || run_scheduler_loop(thread_shared, thread_shutdown))
            .expect("failed to spawn scheduler thread");

        Self {
            shared,
            next_id: AtomicU64::new(1),
            shutdown,
            scheduler_thread: Mutex::new(Some(handle)),
        }
    }

    /// Submits a transaction for execution; returns its assigned id
    /// immediately. `unique_id` assignment is globally ordered by the
    /// atomic counter below, which is the engine's only serialisation point
    /// on the hot path.
    pub fn submit_txn(
        &self,
        readset: HashSet<K>,
        writeset: HashSet<K>,
        body: Arc<dyn TxnBody<K, V>>,
    ) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let txn = Box::new(Txn::new(id, readset, writeset, body));
        self.shared.in_flight.fetch_add(1, Ordering::SeqCst);
        self.shared.ingress.push(txn);
        id
    }

    /// Blocks (busy-polling with light backoff) until a finished
    /// transaction is available.
    pub fn next_result(&self) -> BoxTxn<K, V> {
        let mut backoff = Duration::from_micros(50);
        loop {
            if let Some(txn) = self.shared.results.pop() {
                self.shared.in_flight.fetch_sub(1, Ordering::SeqCst);
                return txn;
            }
            std::thread::sleep(backoff);
            backoff = (backoff * 2).min(Duration::from_millis(1));
        }
    }

    /// Non-blocking result poll, for callers that want to interleave other
    /// work instead of parking the calling thread.
    pub fn try_next_result(&self) -> Option<BoxTxn<K, V>> {
        let txn = self.shared.results.pop();
        if txn.is_some() {
            self.shared.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
        txn
    }

    /// How many submitted transactions have not yet been returned via
    /// `next_result`/`try_next_result`.
    pub fn in_flight(&self) -> u64 {
        self.shared.in_flight.load(Ordering::SeqCst)
    }

    /// Signals the scheduler loop to stop once every internal queue has
    /// drained, then joins it. Blocks until fully stopped.
    pub fn shutdown(self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.scheduler_thread.lock().take() {
            let _ = handle.join();
        }
    }
}

fn run_scheduler_loop<K, V>(shared: Arc<Shared<K, V>>, shutdown: Arc<AtomicBool>)
where
    K: Eq + Hash + Clone + Ord + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    loop {
        let did_work = match shared.config.mode {
            CcMode::Serial => serial::tick(&shared),
            CcMode::Locking | CcMode::LockingExclusiveOnly => locking::tick(&shared),
            CcMode::Occ => occ::tick(&shared),
            CcMode::POcc => p_occ::tick(&shared),
        };

        if !did_work {
            if shutdown.load(Ordering::SeqCst) && shared.in_flight.load(Ordering::SeqCst) == 0 {
                return;
            }
            std::thread::sleep(Duration::from_micros(200));
        }
    }
}
