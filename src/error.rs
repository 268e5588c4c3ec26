use thiserror::Error;

/// Fatal engine errors. Anything recoverable (lock contention, OCC
/// validation failure, a storage miss) is ordinary control flow and never
/// surfaces as one of these.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("worker pool rejected task: {0}")]
    PoolShutdown(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Mirrors the source's `DIE(...)` macro: an invariant violation is not
/// recoverable and the scheduler thread that observes one should not keep
/// running. Logs at error level before panicking so the failure is visible
/// in structured log output even when the panic message is swallowed.
pub fn die(msg: impl Into<String>) -> ! {
    let msg = msg.into();
    tracing::error!(%msg, "fatal invariant violation");
    panic!("{msg}");
}
