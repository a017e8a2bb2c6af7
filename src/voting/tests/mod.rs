mod dates_tests;

use crate::voting::{
    EpochSnapshot, IdentitySnapshot, VotingContext, VotingDetail, VotingId, VotingRecord,
    VotingState, VotingStatus,
};

pub(crate) const ME: &str = "0xme";

pub(crate) fn identity() -> IdentitySnapshot {
    IdentitySnapshot {
        address: ME.to_string(),
        balance: 500.0,
        is_validated: true,
    }
}

pub(crate) fn record(status: VotingStatus) -> VotingRecord {
    VotingRecord {
        id: VotingId::new("0xvoting"),
        title: "Will it rain?".to_string(),
        desc: "Rain at noon".to_string(),
        issuer: "0xissuer".to_string(),
        status,
        balance: Some(40.0),
        funding_amount: None,
        start_date: None,
        voting_duration: Some(10),
        public_voting_duration: Some(5),
        finish_date: None,
        votes_count: None,
        contract_hash: Some("0xcontract".to_string()),
        results: None,
    }
}

pub(crate) fn machine(status: VotingStatus) -> (VotingState, VotingContext) {
    let context = VotingContext::new(
        VotingDetail::from_record(record(status)),
        identity(),
        EpochSnapshot { epoch_number: 1 },
    );
    (context.initial_state(), context)
}
