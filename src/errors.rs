use std::io;
use thiserror::Error;

use crate::backend::{BackendError, BackendErrorKind};

/// Errors surfaced by the voting machines to the presentation layer.
///
/// Every variant reaches the user either as a state change (list `Failure`)
/// or as a notification; none of them is fatal to a machine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VotingError {
    #[error("Failed to load votings: {0}")]
    Fetch(String),

    #[error("Transaction failed: {0}")]
    Transaction(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("This identity has already voted")]
    DuplicateVote,
}

impl VotingError {
    /// Maps a failed list or detail query.
    pub fn from_fetch(err: &BackendError) -> Self {
        match err.kind {
            BackendErrorKind::Validation => VotingError::Validation(err.message.clone()),
            _ => VotingError::Fetch(err.message.clone()),
        }
    }

    /// Maps a failed chain mutation.
    pub fn from_transaction(err: &BackendError) -> Self {
        match err.kind {
            BackendErrorKind::DuplicateVote => VotingError::DuplicateVote,
            BackendErrorKind::Validation => VotingError::Validation(err.message.clone()),
            BackendErrorKind::InsufficientBalance => {
                VotingError::Transaction(format!("insufficient balance: {}", err.message))
            }
            _ => VotingError::Transaction(err.message.clone()),
        }
    }
}

#[derive(Debug, Error)]
pub enum OraclesError {
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Voting error: {0}")]
    Voting(#[from] VotingError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<config::ConfigError> for OraclesError {
    fn from(err: config::ConfigError) -> Self {
        OraclesError::Config(err.to_string())
    }
}
