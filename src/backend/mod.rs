// Backend collaborators: the indexer list query and the chain mutation API

pub mod http;
pub mod memory;

pub use http::HttpBackend;
pub use memory::MemoryBackend;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::voting::{Address, VoteOption, VotingId, VotingRecord, VotingStatus};

pub type TxHash = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendErrorKind {
    Network,
    Timeout,
    InsufficientBalance,
    ChainRejected,
    DuplicateVote,
    Validation,
    NotFound,
}

impl fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendErrorKind::Network => write!(f, "network error"),
            BackendErrorKind::Timeout => write!(f, "request timed out"),
            BackendErrorKind::InsufficientBalance => write!(f, "insufficient balance"),
            BackendErrorKind::ChainRejected => write!(f, "rejected by the chain"),
            BackendErrorKind::DuplicateVote => write!(f, "duplicate vote"),
            BackendErrorKind::Validation => write!(f, "invalid request"),
            BackendErrorKind::NotFound => write!(f, "not found"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}: {message}")]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Network, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Validation, message)
    }

    pub fn chain_rejected(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::ChainRejected, message)
    }
}

/// One list request, fully resolved from the list filters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Statuses to include; an empty set matches nothing
    pub statuses: Vec<VotingStatus>,
    /// Restrict to votings issued by this address
    pub owner: Option<Address>,
    /// Identity the results are computed for
    pub oracle: Address,
    pub epoch: u64,
    pub limit: usize,
    pub continuation_token: Option<String>,
}

/// A page of records; `continuation_token == None` means this was the last page
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Page {
    #[serde(rename = "result", default, deserialize_with = "null_as_empty")]
    pub items: Vec<VotingRecord>,
    #[serde(rename = "continuationToken", default)]
    pub continuation_token: Option<String>,
}

/// The indexer reports an empty page as `"result": null`
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<VotingRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<VotingRecord>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Source of truth for votings.
///
/// Every call may fail with a [`BackendError`]; mutations return the hash of
/// the submitted transaction once it is confirmed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VotingBackend: Send + Sync {
    async fn fetch_votings(&self, query: &ListQuery) -> Result<Page, BackendError>;

    async fn fetch_voting(&self, id: &VotingId) -> Result<VotingRecord, BackendError>;

    async fn start_voting(&self, id: &VotingId, from: &Address) -> Result<TxHash, BackendError>;

    async fn add_fund(
        &self,
        id: &VotingId,
        from: &Address,
        amount: f64,
    ) -> Result<TxHash, BackendError>;

    async fn cast_vote(
        &self,
        id: &VotingId,
        from: &Address,
        option: VoteOption,
        deposit: f64,
    ) -> Result<TxHash, BackendError>;
}

#[cfg(test)]
mod tests;
