use std::path::PathBuf;

/// Error kinds produced by the core repartitioning engine.
///
/// Disposition: every variant is fatal to the current repartition. There
/// is no partial-success protocol; a caller that wants to retry after an
/// `Infeasible` error should supply a larger memory bound.
#[derive(thiserror::Error, Debug)]
pub enum KeepartError {
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("I/O failure on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no read shape satisfies memory bound of {bound} bytes")]
    Infeasible { bound: u64 },
}

impl KeepartError {
    pub fn invariant(msg: impl Into<String>) -> Self {
        KeepartError::InvariantViolation(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        KeepartError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, KeepartError>;
