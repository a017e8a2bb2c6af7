use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use log::debug;
use parking_lot::Mutex;

use super::{BackendError, BackendErrorKind, ListQuery, Page, TxHash, VotingBackend};
use crate::voting::{
    Address, VoteOption, VotingId, VotingRecord, VotingResults, VotingStatus,
};

const TOKEN_PREFIX: &str = "offset:";

#[derive(Debug, Default)]
struct MemoryState {
    records: Vec<VotingRecord>,
    votes: HashSet<(VotingId, Address)>,
    failures: VecDeque<BackendError>,
    fetch_calls: usize,
    tx_counter: u64,
}

impl MemoryState {
    fn record_mut(&mut self, id: &VotingId) -> Result<&mut VotingRecord, BackendError> {
        self.records
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| BackendError::new(BackendErrorKind::NotFound, format!("voting {}", id)))
    }

    fn next_tx(&mut self) -> TxHash {
        self.tx_counter += 1;
        format!("0x{:064x}", self.tx_counter)
    }
}

/// In-process backend with the same paging and one-vote rules as the indexer.
///
/// Used by the demo mode of the CLI and throughout the tests; failures can be
/// queued with [`MemoryBackend::fail_next`].
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
    latency: Option<Duration>,
}

impl MemoryBackend {
    pub fn new(records: Vec<VotingRecord>) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                records,
                ..MemoryState::default()
            }),
            latency: None,
        }
    }

    /// Delays every call, to exercise slow-loading paths
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn insert(&self, record: VotingRecord) {
        self.state.lock().records.push(record);
    }

    /// The next call fails with `error`, whatever it is
    pub fn fail_next(&self, error: BackendError) {
        self.state.lock().failures.push_back(error);
    }

    pub fn record(&self, id: &VotingId) -> Option<VotingRecord> {
        self.state.lock().records.iter().find(|r| &r.id == id).cloned()
    }

    pub fn fetch_calls(&self) -> usize {
        self.state.lock().fetch_calls
    }

    /// A handful of votings covering every status, issued by two addresses
    pub fn demo(owner: &str) -> Self {
        let start = Utc.with_ymd_and_hms(2026, 9, 1, 12, 0, 0).single();
        let statuses = [
            VotingStatus::Pending,
            VotingStatus::Running,
            VotingStatus::Running,
            VotingStatus::Funding,
            VotingStatus::Counting,
            VotingStatus::Archived,
            VotingStatus::Pending,
            VotingStatus::Running,
        ];

        let records = statuses
            .iter()
            .enumerate()
            .map(|(i, status)| {
                let issuer = if i % 3 == 0 {
                    owner.to_string()
                } else {
                    format!("0x{:040x}", 0xabc0 + i)
                };
                let results = match status {
                    VotingStatus::Counting | VotingStatus::Archived => Some(VotingResults {
                        confirm: 6 + i as u64,
                        reject: 4,
                    }),
                    _ => None,
                };
                VotingRecord {
                    id: VotingId::new(format!("0x{:040x}", 0x1000 + i)),
                    title: format!("Oracle question #{}", i + 1),
                    desc: format!("Does statement {} hold at the end of the epoch?", i + 1),
                    issuer,
                    status: *status,
                    balance: Some(100.0 * (i + 1) as f64),
                    funding_amount: None,
                    start_date: start,
                    voting_duration: Some(4320),
                    public_voting_duration: Some(2160),
                    finish_date: None,
                    votes_count: None,
                    contract_hash: Some(format!("0x{:040x}", 0xc0de00 + i)),
                    results,
                }
            })
            .collect();

        Self::new(records)
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn take_failure(&self) -> Result<(), BackendError> {
        match self.state.lock().failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

fn parse_token(token: &str) -> Result<usize, BackendError> {
    token
        .strip_prefix(TOKEN_PREFIX)
        .and_then(|offset| offset.parse().ok())
        .ok_or_else(|| BackendError::validation(format!("unknown continuation token {}", token)))
}

#[async_trait]
impl VotingBackend for MemoryBackend {
    async fn fetch_votings(&self, query: &ListQuery) -> Result<Page, BackendError> {
        self.simulate_latency().await;
        self.take_failure()?;

        let offset = match &query.continuation_token {
            Some(token) => parse_token(token)?,
            None => 0,
        };

        let mut state = self.state.lock();
        state.fetch_calls += 1;
        let matching: Vec<&VotingRecord> = state
            .records
            .iter()
            .filter(|r| query.statuses.contains(&r.status))
            .filter(|r| match &query.owner {
                Some(owner) => &r.issuer == owner,
                None => true,
            })
            .collect();

        let limit = query.limit.max(1);
        let items: Vec<VotingRecord> = matching
            .iter()
            .skip(offset)
            .take(limit)
            .map(|r| (*r).clone())
            .collect();
        let next = offset + items.len();
        let continuation_token = if next < matching.len() {
            Some(format!("{}{}", TOKEN_PREFIX, next))
        } else {
            None
        };

        debug!(
            "Memory backend served {} of {} votings from offset {}",
            items.len(),
            matching.len(),
            offset
        );
        Ok(Page {
            items,
            continuation_token,
        })
    }

    async fn fetch_voting(&self, id: &VotingId) -> Result<VotingRecord, BackendError> {
        self.simulate_latency().await;
        self.take_failure()?;
        let mut state = self.state.lock();
        state.record_mut(id).map(|r| r.clone())
    }

    async fn start_voting(&self, id: &VotingId, _from: &Address) -> Result<TxHash, BackendError> {
        self.simulate_latency().await;
        self.take_failure()?;
        let mut state = self.state.lock();
        let record = state.record_mut(id)?;
        if record.status != VotingStatus::Pending {
            return Err(BackendError::chain_rejected(format!(
                "voting {} is {}, not Pending",
                id, record.status
            )));
        }
        record.status = VotingStatus::Running;
        record.start_date = Some(Utc::now());
        Ok(state.next_tx())
    }

    async fn add_fund(
        &self,
        id: &VotingId,
        _from: &Address,
        amount: f64,
    ) -> Result<TxHash, BackendError> {
        self.simulate_latency().await;
        self.take_failure()?;
        if !(amount.is_finite() && amount > 0.0) {
            return Err(BackendError::validation(format!("invalid amount {}", amount)));
        }
        let mut state = self.state.lock();
        let record = state.record_mut(id)?;
        if record.status.is_terminal() {
            return Err(BackendError::chain_rejected(format!("voting {} is archived", id)));
        }
        let balance = record.balance.unwrap_or(0.0);
        record.funding_amount = Some(record.funding_amount.unwrap_or(balance) + amount);
        record.balance = Some(balance + amount);
        Ok(state.next_tx())
    }

    async fn cast_vote(
        &self,
        id: &VotingId,
        from: &Address,
        option: VoteOption,
        deposit: f64,
    ) -> Result<TxHash, BackendError> {
        self.simulate_latency().await;
        self.take_failure()?;
        if !(deposit.is_finite() && deposit >= 0.0) {
            return Err(BackendError::validation(format!("invalid deposit {}", deposit)));
        }
        let mut state = self.state.lock();
        if state.votes.contains(&(id.clone(), from.clone())) {
            return Err(BackendError::new(
                BackendErrorKind::DuplicateVote,
                format!("{} already voted in {}", from, id),
            ));
        }
        let record = state.record_mut(id)?;
        if record.status != VotingStatus::Running {
            return Err(BackendError::chain_rejected(format!(
                "voting {} is {}, not Running",
                id, record.status
            )));
        }
        let mut results = record.results.unwrap_or_default();
        results.record(option);
        record.votes_count = Some(record.votes_count.unwrap_or(0) + 1);
        record.results = Some(results);
        state.votes.insert((id.clone(), from.clone()));
        Ok(state.next_tx())
    }
}
