// Oracle votings: shared data model and the per-voting state machine

pub mod dates;
pub mod machine;
pub mod registry;
pub mod service;

pub use dates::{voting_finish_date, BLOCK_TIME_SECS};
pub use machine::{PendingOp, VotingContext, VotingEffect, VotingEvent, VotingMachine, VotingState};
pub use registry::VotingRegistry;
pub use service::{spawn_voting, VotingEffectHandler, VotingService};

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account address of an identity
pub type Address = String;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VotingId(pub String);

impl VotingId {
    pub fn new(id: impl Into<String>) -> Self {
        VotingId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VotingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle to a voting machine instance.
///
/// The list only carries references; the machine behind one is created by
/// [`VotingRegistry::bind`] the first time a view needs it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VotingRef {
    id: VotingId,
}

impl VotingRef {
    pub(crate) fn new(id: VotingId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> &VotingId {
        &self.id
    }
}

/// Lifecycle of a voting.
///
/// `Deploying` precedes chain confirmation; everything after it moves forward
/// only. See [`VotingStatus::rank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VotingStatus {
    Deploying,
    Pending,
    Funding,
    Starting,
    Running,
    Voted,
    Counting,
    Archived,
}

impl VotingStatus {
    pub const ALL: [VotingStatus; 8] = [
        VotingStatus::Deploying,
        VotingStatus::Pending,
        VotingStatus::Funding,
        VotingStatus::Starting,
        VotingStatus::Running,
        VotingStatus::Voted,
        VotingStatus::Counting,
        VotingStatus::Archived,
    ];

    /// Position in the lifecycle, used to reject backward transitions
    pub fn rank(self) -> u8 {
        match self {
            VotingStatus::Deploying => 0,
            VotingStatus::Pending => 1,
            VotingStatus::Funding => 2,
            VotingStatus::Starting => 3,
            VotingStatus::Running => 4,
            VotingStatus::Voted => 5,
            VotingStatus::Counting => 6,
            VotingStatus::Archived => 7,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == VotingStatus::Archived
    }

    /// Whether moving from `self` to `next` keeps the lifecycle monotonic
    pub fn can_advance_to(self, next: VotingStatus) -> bool {
        next.rank() >= self.rank()
    }
}

impl fmt::Display for VotingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VotingStatus::Deploying => "Deploying",
            VotingStatus::Pending => "Pending",
            VotingStatus::Funding => "Funding",
            VotingStatus::Starting => "Starting",
            VotingStatus::Running => "Running",
            VotingStatus::Voted => "Voted",
            VotingStatus::Counting => "Counting",
            VotingStatus::Archived => "Archived",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for VotingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VotingStatus::ALL
            .iter()
            .copied()
            .find(|status| status.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown voting status: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VoteOption {
    Confirm,
    Reject,
}

impl fmt::Display for VoteOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoteOption::Confirm => write!(f, "Confirm"),
            VoteOption::Reject => write!(f, "Reject"),
        }
    }
}

impl std::str::FromStr for VoteOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "confirm" | "yes" => Ok(VoteOption::Confirm),
            "reject" | "no" => Ok(VoteOption::Reject),
            other => Err(format!("unknown vote option: {}", other)),
        }
    }
}

/// Votes counted per option
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingResults {
    pub confirm: u64,
    pub reject: u64,
}

impl VotingResults {
    pub fn total(&self) -> u64 {
        self.confirm + self.reject
    }

    /// Share of `option` in percent, 0 when nothing was counted yet
    pub fn percentage(&self, option: VoteOption) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let count = match option {
            VoteOption::Confirm => self.confirm,
            VoteOption::Reject => self.reject,
        };
        count as f64 * 100.0 / total as f64
    }

    pub(crate) fn record(&mut self, option: VoteOption) {
        match option {
            VoteOption::Confirm => self.confirm += 1,
            VoteOption::Reject => self.reject += 1,
        }
    }
}

/// A voting as the backend reports it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingRecord {
    pub id: VotingId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub desc: String,
    pub issuer: Address,
    pub status: VotingStatus,
    #[serde(default)]
    pub balance: Option<f64>,
    #[serde(default)]
    pub funding_amount: Option<f64>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub voting_duration: Option<u64>,
    #[serde(default)]
    pub public_voting_duration: Option<u64>,
    #[serde(default)]
    pub finish_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub votes_count: Option<u64>,
    #[serde(default)]
    pub contract_hash: Option<Address>,
    #[serde(default)]
    pub results: Option<VotingResults>,
}

/// Full view of one voting, owned by its machine
#[derive(Debug, Clone, PartialEq)]
pub struct VotingDetail {
    pub id: VotingId,
    pub title: String,
    pub description: String,
    pub issuer: Address,
    pub status: VotingStatus,
    pub balance: f64,
    pub funding_amount: f64,
    pub start_date: Option<DateTime<Utc>>,
    pub voting_duration: u64,
    pub public_voting_duration: u64,
    pub finish_date: Option<DateTime<Utc>>,
    pub votes_count: u64,
    pub contract_hash: Option<Address>,
    pub results: VotingResults,
}

impl VotingDetail {
    /// Builds the detail, filling every implicit default in one place:
    /// `balance` falls back to 0, `funding_amount` to `balance`, `votes_count`
    /// to the counted results and `finish_date` to the derived deadline.
    pub fn from_record(record: VotingRecord) -> Self {
        let balance = record.balance.unwrap_or(0.0);
        let voting_duration = record.voting_duration.unwrap_or(0);
        let public_voting_duration = record.public_voting_duration.unwrap_or(0);
        let results = record.results.unwrap_or_default();
        let finish_date = record.finish_date.or_else(|| {
            voting_finish_date(record.start_date, voting_duration, public_voting_duration)
        });

        Self {
            id: record.id,
            title: record.title,
            description: record.desc,
            issuer: record.issuer,
            status: record.status,
            balance,
            funding_amount: record.funding_amount.unwrap_or(balance),
            start_date: record.start_date,
            voting_duration,
            public_voting_duration,
            finish_date,
            votes_count: record.votes_count.unwrap_or_else(|| results.total()),
            contract_hash: record.contract_hash,
            results,
        }
    }

    /// Seeds a detail from a list snapshot until the full record is loaded
    pub fn from_summary(summary: &VotingSummary) -> Self {
        Self {
            id: summary.id.clone(),
            title: summary.title.clone(),
            description: summary.description.clone(),
            issuer: summary.issuer.clone(),
            status: summary.status,
            balance: summary.balance,
            funding_amount: summary.funding_amount,
            start_date: summary.start_date,
            voting_duration: 0,
            public_voting_duration: 0,
            finish_date: summary.finish_date,
            votes_count: summary.votes_count,
            contract_hash: None,
            results: VotingResults::default(),
        }
    }
}

/// Lightweight list entry
#[derive(Debug, Clone, PartialEq)]
pub struct VotingSummary {
    pub id: VotingId,
    pub reference: VotingRef,
    pub title: String,
    pub description: String,
    pub issuer: Address,
    pub status: VotingStatus,
    pub balance: f64,
    pub funding_amount: f64,
    pub start_date: Option<DateTime<Utc>>,
    pub finish_date: Option<DateTime<Utc>>,
    pub votes_count: u64,
}

impl VotingSummary {
    pub fn from_record(record: VotingRecord) -> Self {
        VotingSummary::from(VotingDetail::from_record(record))
    }
}

impl From<VotingDetail> for VotingSummary {
    fn from(detail: VotingDetail) -> Self {
        Self {
            reference: VotingRef::new(detail.id.clone()),
            id: detail.id,
            title: detail.title,
            description: detail.description,
            issuer: detail.issuer,
            status: detail.status,
            balance: detail.balance,
            funding_amount: detail.funding_amount,
            start_date: detail.start_date,
            finish_date: detail.finish_date,
            votes_count: detail.votes_count,
        }
    }
}

/// Identity data captured when a machine is constructed
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentitySnapshot {
    pub address: Address,
    pub balance: f64,
    pub is_validated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpochSnapshot {
    pub epoch_number: u64,
}

#[cfg(test)]
mod tests;
