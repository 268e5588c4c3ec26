use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::ThreadPool;

/// The external worker pool collaborator. `submit` fires a task onto some
/// worker thread; `active` tells the scheduler whether there is still
/// outstanding or potential work, so it knows when it is safe to stop
/// polling.
pub trait WorkerPool: Send + Sync {
    fn submit(&self, task: Box<dyn FnOnce() + Send + 'static>);
    fn active(&self) -> bool;
}

/// Reference implementation on top of a `rayon::ThreadPool`. Tracks
/// in-flight task count so `active()` reflects real outstanding work rather
/// than just "has shutdown been requested" — mirroring the worker-index /
/// commit-guard bookkeeping style used by the corpus's parallel executor.
pub struct RayonWorkerPool {
    pool: Arc<ThreadPool>,
    in_flight: Arc<AtomicUsize>,
    shutdown: Arc<AtomicBool>,
}

impl RayonWorkerPool {
    pub fn new(num_threads: usize) -> Self {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads.max(1))
            .build()
            .expect("failed to build worker thread pool");
        Self {
            pool: Arc::new(pool),
            in_flight: Arc::new(AtomicUsize::new(0)),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

impl WorkerPool for RayonWorkerPool {
    fn submit(&self, task: Box<dyn FnOnce() + Send + 'static>) {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let in_flight = Arc::clone(&self.in_flight);
        self.pool.spawn(move || {
            task();
            in_flight.fetch_sub(1, Ordering::SeqCst);
        });
    }

    fn active(&self) -> bool {
        !self.shutdown.load(Ordering::SeqCst) || self.in_flight.load(Ordering::SeqCst) > 0
    }
}
