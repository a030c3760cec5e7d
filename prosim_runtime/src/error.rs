//! Runtime error type. Engine errors pass through unchanged.

use prosim_engine::SimError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Sim(#[from] SimError),

    #[error("snapshot rejected: {0}")]
    Snapshot(String),

    #[error("determinism failure: {0}")]
    Drift(String),

    #[error("session lock poisoned")]
    Poisoned,
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
