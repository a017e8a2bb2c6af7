#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use oracles_core::backend::{MemoryBackend, VotingBackend};
use oracles_core::list::{
    spawn_list, ListOptions, MemoryPreferenceStore, PreferenceStore, VotingListService,
};
use oracles_core::voting::{EpochSnapshot, IdentitySnapshot, VotingId, VotingRecord, VotingStatus};

pub const ORACLE: &str = "0x00000000000000000000000000000000000000aa";

pub fn init_logging() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}

pub fn identity() -> IdentitySnapshot {
    IdentitySnapshot {
        address: ORACLE.to_string(),
        balance: 1_000.0,
        is_validated: true,
    }
}

pub fn epoch() -> EpochSnapshot {
    EpochSnapshot { epoch_number: 90 }
}

pub fn voting(id: &str, status: VotingStatus, issuer: &str) -> VotingRecord {
    VotingRecord {
        id: VotingId::new(id),
        title: format!("Question {}", id),
        desc: String::new(),
        issuer: issuer.to_string(),
        status,
        balance: Some(20.0),
        funding_amount: None,
        start_date: None,
        voting_duration: Some(100),
        public_voting_duration: Some(50),
        finish_date: None,
        votes_count: None,
        contract_hash: None,
        results: None,
    }
}

/// `count` running votings by someone else
pub fn running_votings(count: usize) -> Vec<VotingRecord> {
    (0..count)
        .map(|i| voting(&format!("0x{:04}", i), VotingStatus::Running, "0xissuer"))
        .collect()
}

pub fn list_with(
    backend: Arc<dyn VotingBackend>,
    store: Arc<dyn PreferenceStore>,
    page_size: usize,
) -> VotingListService {
    spawn_list(
        backend,
        store,
        identity(),
        epoch(),
        ListOptions {
            page_size,
            late_after: Duration::from_secs(30),
        },
    )
}

pub fn memory_list(
    records: Vec<VotingRecord>,
    page_size: usize,
) -> (Arc<MemoryBackend>, VotingListService) {
    let backend = Arc::new(MemoryBackend::new(records));
    let list = list_with(
        Arc::clone(&backend) as Arc<dyn VotingBackend>,
        Arc::new(MemoryPreferenceStore::default()),
        page_size,
    );
    (backend, list)
}
