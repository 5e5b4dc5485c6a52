use std::fmt;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed errors for benchmark setup, execution and verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The store returned a value that does not match the pre-populated
    /// identity pattern for `key`
    StructuralCorruption { key: i32, value: i32 },
    /// Unknown variant or operation name, or an unusable parameter
    Configuration(String),
    /// A job running on the worker pool panicked
    WorkerPanicked,
    /// Work was submitted to a pool that has already been shut down
    PoolShutDown,
    /// The OS refused to start a worker thread
    ThreadSpawn(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::StructuralCorruption { key, value } => {
                write!(f, "Structural corruption: index {} = {}", key, value)
            }
            Error::Configuration(msg) => {
                write!(f, "Configuration error: {}", msg)
            }
            Error::WorkerPanicked => {
                write!(f, "A worker panicked while running a batch")
            }
            Error::PoolShutDown => {
                write!(f, "Worker pool has been shut down")
            }
            Error::ThreadSpawn(msg) => {
                write!(f, "Failed to spawn worker thread: {}", msg)
            }
        }
    }
}

impl std::error::Error for Error {}
