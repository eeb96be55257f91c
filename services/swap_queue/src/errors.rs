//! Queue error types
//!
//! [`SwapFailure`] is what an execution attempt reports for a single swap;
//! the queue isolates it to that swap. [`QueueError`] aborts the block.

use amm::AmmError;
use state::StateError;
use thiserror::Error;
use types::ValidationError;

/// Failure of one swap execution
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SwapFailure {
    #[error(transparent)]
    Amm(#[from] AmmError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    State(#[from] StateError),
}

impl SwapFailure {
    /// The same request may clear in a later block
    pub fn is_transient(&self) -> bool {
        match self {
            SwapFailure::Amm(err) => err.is_transient(),
            SwapFailure::State(StateError::Amm(err)) => err.is_transient(),
            _ => false,
        }
    }
}

/// Errors that stop queue processing
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("swap {key} is already queued")]
    DuplicateSwap { key: String },

    #[error("invalid swap {key}: {reason}")]
    InvalidSwap { key: String, reason: ValidationError },

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Amm(#[from] AmmError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}
