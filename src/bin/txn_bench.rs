//! Small demo/benchmark binary driving the engine from the command line.
//! Not part of the core's public API surface — a thin consumer of it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, ValueEnum};

use txn_engine::{
    CcMode, Clock, Config, Engine, FnBody, InMemoryStorage, TxnOutcome,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Serial,
    Locking,
    LockingExclusiveOnly,
    Occ,
    POcc,
}

impl From<ModeArg> for CcMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Serial => CcMode::Serial,
            ModeArg::Locking => CcMode::Locking,
            ModeArg::LockingExclusiveOnly => CcMode::LockingExclusiveOnly,
            ModeArg::Occ => CcMode::Occ,
            ModeArg::POcc => CcMode::POcc,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "txn_bench", about = "Drive the transaction engine with a synthetic workload")]
struct Args {
    #[arg(long, value_enum, default_value = "serial")]
    mode: ModeArg,

    #[arg(long, default_value_t = 1000)]
    txn_count: u64,

    #[arg(long, default_value_t = 100)]
    key_space: u64,

    #[arg(long, default_value_t = 0)]
    worker_threads: usize,
}

fn main() {
    txn_engine::logging::init_from_env();

    let args = Args::parse();
    let mut config = Config::new(args.mode.into());
    if args.worker_threads > 0 {
        config.worker_threads = args.worker_threads;
    }

    let storage: Arc<InMemoryStorage<u64, u64>> = Arc::new(InMemoryStorage::new(Clock::new()));
    let engine: Engine<u64, u64> = Engine::new(config, storage);

    let started = Instant::now();
    for i in 0..args.txn_count {
        let key = i % args.key_space;
        let body = Arc::new(FnBody::new(move |reads: &HashMap<u64, u64>| {
            let current = reads.get(&key).copied().unwrap_or(0);
            let mut writes = HashMap::new();
            writes.insert(key, current + 1);
            TxnOutcome {
                writes,
                commit: true,
            }
        }));
        engine.submit_txn(
            [key].into_iter().collect(),
            [key].into_iter().collect(),
            body,
        );
    }

    let mut committed = 0u64;
    let mut aborted = 0u64;
    for _ in 0..args.txn_count {
        let txn = engine.next_result();
        match txn.status {
            txn_engine::TxnStatus::Committed => committed += 1,
            txn_engine::TxnStatus::Aborted => aborted += 1,
            other => tracing::warn!(?other, "unexpected terminal status"),
        }
    }

    let elapsed = started.elapsed();
    println!(
        "mode={:?} txns={} committed={} aborted={} elapsed={:?}",
        args.mode, args.txn_count, committed, aborted, elapsed
    );

    engine.shutdown();
}
