// Paginated, filterable list of votings

pub mod machine;
pub mod preferences;
pub mod service;

pub use machine::{ListContext, ListEffect, ListEvent, ListState, LoadMode, LoadingPhase, VotingListMachine};
pub use preferences::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore};
pub use service::{spawn_list, ListEffectHandler, ListOptions, VotingListService};

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::voting::VotingStatus;

/// Status filter; an empty filter lets every status of the segment through
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VotingFilter(BTreeSet<VotingStatus>);

impl VotingFilter {
    pub fn any() -> Self {
        VotingFilter(BTreeSet::new())
    }

    pub fn only(statuses: impl IntoIterator<Item = VotingStatus>) -> Self {
        VotingFilter(statuses.into_iter().collect())
    }

    /// Votings that are live on chain but not yet decided
    pub fn open() -> Self {
        Self::only([
            VotingStatus::Funding,
            VotingStatus::Starting,
            VotingStatus::Running,
        ])
    }

    pub fn is_any(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, status: VotingStatus) -> bool {
        self.0.is_empty() || self.0.contains(&status)
    }

    pub fn statuses(&self) -> impl Iterator<Item = VotingStatus> + '_ {
        self.0.iter().copied()
    }
}

/// View segmentation of the list: to do, voting, closed, or the identity's own
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListSegment {
    #[default]
    Todo,
    Voting,
    Closed,
    Owned,
}

impl ListSegment {
    pub fn statuses(self) -> &'static [VotingStatus] {
        match self {
            ListSegment::Todo => &[VotingStatus::Pending, VotingStatus::Running],
            ListSegment::Voting => &[
                VotingStatus::Deploying,
                VotingStatus::Funding,
                VotingStatus::Starting,
                VotingStatus::Running,
                VotingStatus::Voted,
            ],
            ListSegment::Closed => &[VotingStatus::Counting, VotingStatus::Archived],
            ListSegment::Owned => &VotingStatus::ALL,
        }
    }

    /// Every segment but `Owned` shows votings regardless of their issuer
    pub fn show_all(self) -> bool {
        self != ListSegment::Owned
    }
}

impl fmt::Display for ListSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListSegment::Todo => write!(f, "todo"),
            ListSegment::Voting => write!(f, "voting"),
            ListSegment::Closed => write!(f, "closed"),
            ListSegment::Owned => write!(f, "owned"),
        }
    }
}

impl FromStr for ListSegment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "todo" => Ok(ListSegment::Todo),
            "voting" => Ok(ListSegment::Voting),
            "closed" => Ok(ListSegment::Closed),
            "owned" | "mine" => Ok(ListSegment::Owned),
            other => Err(format!("unknown list segment: {}", other)),
        }
    }
}

/// Filter settings kept between sessions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPreferences {
    #[serde(default)]
    pub filter: VotingFilter,
    #[serde(default)]
    pub segment: ListSegment,
}

/// Why a loaded list is empty, mirrors the two empty-state messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyReason {
    NoVotingsYet,
    NoVotingsForYou,
}

#[cfg(test)]
mod tests;
