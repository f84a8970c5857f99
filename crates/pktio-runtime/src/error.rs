//! Error types for the runtime.

use pktio_hal::HalError;
use thiserror::Error;

/// Errors surfaced by the resource manager.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Port or lifecycle operation attempted before a successful initialize.
    #[error("Runtime not initialized")]
    NotInitialized,

    #[error("Port index {index} out of range (count {count})")]
    IndexOutOfRange { index: usize, count: usize },

    /// The layer refused to bring the environment up.
    #[error("Environment bootstrap failed: {0}")]
    Bootstrap(#[source] HalError),

    #[error("Buffer pool creation failed: {0}")]
    PoolCreate(#[source] HalError),

    /// Ports could not be enumerated.
    #[error("Port discovery failed: {0}")]
    Discovery(#[source] HalError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RuntimeError {
    /// Layer error behind a failed stage, if any.
    pub fn hal_error(&self) -> Option<&HalError> {
        match self {
            RuntimeError::Bootstrap(e) | RuntimeError::PoolCreate(e) | RuntimeError::Discovery(e) => {
                Some(e)
            }
            _ => None,
        }
    }
}

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;
