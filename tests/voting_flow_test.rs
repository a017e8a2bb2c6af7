mod common;

use std::sync::Arc;
use std::time::Duration;

use oracles_core::backend::{BackendError, BackendErrorKind, MemoryBackend, VotingBackend};
use oracles_core::errors::VotingError;
use oracles_core::list::ListState;
use oracles_core::voting::{
    VoteOption, VotingEvent, VotingId, VotingRegistry, VotingState, VotingStatus,
};

use common::{epoch, identity, init_logging, list_with, voting, ORACLE};

fn registry(backend: &Arc<MemoryBackend>) -> VotingRegistry {
    VotingRegistry::new(
        Arc::clone(backend) as Arc<dyn VotingBackend>,
        identity(),
        epoch(),
        None,
    )
}

#[tokio::test]
async fn test_list_item_to_vote() {
    init_logging();
    let backend = Arc::new(MemoryBackend::new(vec![
        voting("0x1", VotingStatus::Running, "0xissuer"),
        voting("0x2", VotingStatus::Pending, ORACLE),
    ]));
    let list = list_with(
        Arc::clone(&backend) as Arc<dyn VotingBackend>,
        Arc::new(oracles_core::list::MemoryPreferenceStore::default()),
        10,
    );
    let snapshot = list.wait_for(|s| s.state == ListState::Loaded).await.unwrap();
    let summary = snapshot
        .context
        .votings
        .iter()
        .find(|v| v.status == VotingStatus::Running)
        .unwrap();

    let registry = registry(&backend);
    let service = registry.bind(summary);
    let mut notifications = service.notifications();
    service
        .wait_for(|s| s.context.detail.voting_duration == 100)
        .await
        .unwrap();

    service.send(VotingEvent::Vote {
        option: VoteOption::Confirm,
        deposit: 5.0,
    });
    let confirmed = notifications.recv().await.unwrap();
    assert_eq!(confirmed.voting, Some(VotingId::new("0x1")));
    assert!(!confirmed.is_error());

    let after = service.snapshot();
    assert_eq!(after.state, VotingState::Idle(VotingStatus::Voted));
    assert_eq!(after.context.my_vote, Some(VoteOption::Confirm));
    assert_eq!(
        backend.record(&VotingId::new("0x1")).unwrap().votes_count,
        Some(1)
    );

    // the list entry is a snapshot and is not touched by the voting machine
    let list_entry = list.snapshot();
    assert_eq!(list_entry.context.votings[0].status, VotingStatus::Running);
}

#[tokio::test]
async fn test_duplicate_vote_from_another_session() {
    init_logging();
    let backend = Arc::new(MemoryBackend::new(vec![voting(
        "0x1",
        VotingStatus::Running,
        "0xissuer",
    )]));
    backend
        .cast_vote(&VotingId::new("0x1"), &ORACLE.to_string(), VoteOption::Reject, 0.0)
        .await
        .unwrap();

    let registry = registry(&backend);
    let detail = oracles_core::voting::VotingDetail::from_record(
        backend.fetch_voting(&VotingId::new("0x1")).await.unwrap(),
    );
    let service = registry.bind_detail(detail);
    let mut notifications = service.notifications();

    service.send(VotingEvent::Vote {
        option: VoteOption::Confirm,
        deposit: 0.0,
    });
    let rejected = notifications.recv().await.unwrap();
    assert_eq!(rejected.as_error(), Some(&VotingError::DuplicateVote));

    let snapshot = service.wait_for(|s| s.context.has_voted).await.unwrap();
    assert_eq!(snapshot.state, VotingState::Idle(VotingStatus::Running));
    let stored = backend.record(&VotingId::new("0x1")).unwrap();
    assert_eq!(stored.votes_count, Some(1));
}

#[tokio::test]
async fn test_launch_and_fund_own_voting() {
    init_logging();
    let backend = Arc::new(MemoryBackend::new(vec![voting("0x2", VotingStatus::Pending, ORACLE)]));
    let registry = registry(&backend);
    let detail = oracles_core::voting::VotingDetail::from_record(
        backend.fetch_voting(&VotingId::new("0x2")).await.unwrap(),
    );
    let service = registry.bind_detail(detail);

    service.send(VotingEvent::AddFund { amount: -5.0 });
    service.send(VotingEvent::AddFund { amount: 30.0 });
    let funded = service
        .wait_for(|s| !s.state.is_pending() && s.context.detail.funding_amount == 50.0)
        .await
        .unwrap();
    assert_eq!(funded.state, VotingState::Idle(VotingStatus::Pending));

    service.send(VotingEvent::StartVoting);
    let running = service
        .wait_for(|s| s.state == VotingState::Idle(VotingStatus::Running))
        .await
        .unwrap();
    assert!(running.context.last_error.is_none());

    // launched votings cannot be launched again
    service.send(VotingEvent::StartVoting);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(service.state(), VotingState::Idle(VotingStatus::Running));

    let stored = backend.record(&VotingId::new("0x2")).unwrap();
    assert_eq!(stored.status, VotingStatus::Running);
    assert_eq!(stored.funding_amount, Some(50.0));
}

#[tokio::test]
async fn test_insufficient_balance_is_reported() {
    init_logging();
    let backend = Arc::new(MemoryBackend::new(vec![voting("0x3", VotingStatus::Funding, ORACLE)]));
    backend.fail_next(BackendError::new(
        BackendErrorKind::InsufficientBalance,
        "balance 1000 below 5000",
    ));
    let registry = registry(&backend);
    let service = registry.bind_detail(oracles_core::voting::VotingDetail::from_record(voting(
        "0x3",
        VotingStatus::Funding,
        ORACLE,
    )));
    let mut notifications = service.notifications();

    service.send(VotingEvent::AddFund { amount: 5000.0 });
    let failure = notifications.recv().await.unwrap();
    match failure.as_error() {
        Some(VotingError::Transaction(message)) => assert!(message.contains("insufficient balance")),
        other => panic!("unexpected notification {:?}", other),
    }
    assert_eq!(service.state(), VotingState::Idle(VotingStatus::Funding));
    assert_eq!(
        backend.record(&VotingId::new("0x3")).unwrap().funding_amount,
        None
    );
}
