mod property_tests;

use crate::backend::Page;
use crate::list::machine::{ListContext, ListEffect, ListEvent, ListState, VotingListMachine};
use crate::list::ListPreferences;
use crate::machine::{Machine, Transition};
use crate::voting::{EpochSnapshot, IdentitySnapshot, VotingId, VotingRecord, VotingStatus};

pub(crate) const ME: &str = "0xme";

pub(crate) fn identity(is_validated: bool) -> IdentitySnapshot {
    IdentitySnapshot {
        address: ME.to_string(),
        balance: 100.0,
        is_validated,
    }
}

pub(crate) fn context() -> ListContext {
    ListContext::new(identity(true), EpochSnapshot { epoch_number: 7 }, 5)
}

pub(crate) fn record(id: &str, status: VotingStatus) -> VotingRecord {
    VotingRecord {
        id: VotingId::new(id),
        title: format!("Voting {}", id),
        desc: String::new(),
        issuer: "0xissuer".to_string(),
        status,
        balance: Some(10.0),
        funding_amount: None,
        start_date: None,
        voting_duration: None,
        public_voting_duration: None,
        finish_date: None,
        votes_count: None,
        contract_hash: None,
        results: None,
    }
}

pub(crate) fn page(ids: &[&str], token: Option<&str>) -> Page {
    Page {
        items: ids.iter().map(|id| record(id, VotingStatus::Running)).collect(),
        continuation_token: token.map(str::to_string),
    }
}

pub(crate) fn step(
    state: &ListState,
    context: &ListContext,
    event: ListEvent,
) -> Transition<VotingListMachine> {
    VotingListMachine::transition(state, context, event)
}

/// Request id carried by the fetch effect of a transition
pub(crate) fn fetch_request(transition: &Transition<VotingListMachine>) -> u64 {
    transition
        .effects
        .iter()
        .find_map(|effect| match effect {
            ListEffect::Fetch { request, .. } => Some(*request),
            _ => None,
        })
        .expect("transition should start a fetch")
}

/// Restores default preferences and returns the loading transition
pub(crate) fn start() -> Transition<VotingListMachine> {
    step(
        &ListState::Preload,
        &context(),
        ListEvent::PreferencesLoaded(ListPreferences::default()),
    )
}
