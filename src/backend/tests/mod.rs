mod memory_tests;

use crate::voting::{VotingId, VotingRecord, VotingStatus};

pub(crate) fn record(id: &str, status: VotingStatus, issuer: &str) -> VotingRecord {
    VotingRecord {
        id: VotingId::new(id),
        title: format!("Voting {}", id),
        desc: String::new(),
        issuer: issuer.to_string(),
        status,
        balance: Some(50.0),
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
