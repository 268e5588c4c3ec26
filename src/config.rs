/// Concurrency-control mode selecting which scheduler loop drives the
/// engine. Dispatch on this is an exhaustive `match`, never a fallthrough
/// `switch`, so adding a mode without handling it is a compile error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CcMode {
    Serial,
    Locking,
    LockingExclusiveOnly,
    Occ,
    POcc,
}

/// Historical constants from the original engine, preserved for reference;
/// not wired into behaviour directly (see [`Config::default`]).
pub mod historical {
    pub const WORKER_THREADS: usize = 100;
    pub const QUEUE_COUNT: usize = 10;
    pub const BATCH_SIZE: usize = 50;
}

#[derive(Debug, Clone)]
pub struct Config {
    pub mode: CcMode,
    pub worker_threads: usize,
    pub queue_count: usize,
    pub completion_batch: usize,
    pub validated_batch: usize,
    /// `None` means unbounded OCC restarts, matching the core contract.
    pub max_occ_restarts: Option<u32>,
}

impl Config {
    pub fn new(mode: CcMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: CcMode::Serial,
            worker_threads: num_cpus::get(),
            queue_count: 4,
            completion_batch: 32,
            validated_batch: 32,
            max_occ_restarts: None,
        }
    }
}
