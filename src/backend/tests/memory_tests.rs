use super::record;
use crate::backend::{BackendError, BackendErrorKind, ListQuery, MemoryBackend, VotingBackend};
use crate::voting::{VoteOption, VotingId, VotingStatus};

fn query(statuses: &[VotingStatus], limit: usize, token: Option<String>) -> ListQuery {
    ListQuery {
        statuses: statuses.to_vec(),
        owner: None,
        oracle: "0xme".to_string(),
        epoch: 1,
        limit,
        continuation_token: token,
    }
}

fn backend_with(count: usize) -> MemoryBackend {
    MemoryBackend::new(
        (0..count)
            .map(|i| record(&format!("v{}", i), VotingStatus::Running, "0xissuer"))
            .collect(),
    )
}

#[tokio::test]
async fn test_pages_until_exhausted() {
    let backend = backend_with(8);
    let first = backend
        .fetch_votings(&query(&[VotingStatus::Running], 5, None))
        .await
        .unwrap();
    assert_eq!(first.items.len(), 5);
    let token = first.continuation_token.clone();
    assert!(token.is_some());

    let second = backend
        .fetch_votings(&query(&[VotingStatus::Running], 5, token))
        .await
        .unwrap();
    assert_eq!(second.items.len(), 3);
    assert_eq!(second.items[0].id, VotingId::new("v5"));
    assert!(second.continuation_token.is_none());
    assert_eq!(backend.fetch_calls(), 2);
}

#[tokio::test]
async fn test_filters_by_status_and_owner() {
    let backend = MemoryBackend::new(vec![
        record("a", VotingStatus::Pending, "0xme"),
        record("b", VotingStatus::Running, "0xother"),
        record("c", VotingStatus::Archived, "0xme"),
    ]);

    let page = backend
        .fetch_votings(&query(&[VotingStatus::Pending, VotingStatus::Running], 10, None))
        .await
        .unwrap();
    assert_eq!(page.items.len(), 2);

    let mut mine = query(&VotingStatus::ALL, 10, None);
    mine.owner = Some("0xme".to_string());
    let page = backend.fetch_votings(&mine).await.unwrap();
    let ids: Vec<_> = page.items.iter().map(|r| r.id.as_str().to_string()).collect();
    assert_eq!(ids, vec!["a", "c"]);

    let none = backend.fetch_votings(&query(&[], 10, None)).await.unwrap();
    assert!(none.items.is_empty());
}

#[tokio::test]
async fn test_unknown_token_is_rejected() {
    let backend = backend_with(2);
    let err = backend
        .fetch_votings(&query(&[VotingStatus::Running], 5, Some("bogus".to_string())))
        .await
        .unwrap_err();
    assert_eq!(err.kind, BackendErrorKind::Validation);
}

#[tokio::test]
async fn test_queued_failure_hits_next_call_only() {
    let backend = backend_with(1);
    backend.fail_next(BackendError::network("connection reset"));

    let id = VotingId::new("v0");
    let err = backend.fetch_voting(&id).await.unwrap_err();
    assert_eq!(err.kind, BackendErrorKind::Network);
    assert!(backend.fetch_voting(&id).await.is_ok());
}

#[tokio::test]
async fn test_start_voting_only_from_pending() {
    let backend = MemoryBackend::new(vec![record("p", VotingStatus::Pending, "0xme")]);
    let id = VotingId::new("p");
    let from = "0xme".to_string();

    let tx = backend.start_voting(&id, &from).await.unwrap();
    assert!(tx.starts_with("0x"));
    let started = backend.record(&id).unwrap();
    assert_eq!(started.status, VotingStatus::Running);
    assert!(started.start_date.is_some());

    let err = backend.start_voting(&id, &from).await.unwrap_err();
    assert_eq!(err.kind, BackendErrorKind::ChainRejected);
}

#[tokio::test]
async fn test_add_fund_grows_prize_pool() {
    let backend = MemoryBackend::new(vec![record("f", VotingStatus::Funding, "0xme")]);
    let id = VotingId::new("f");
    let from = "0xme".to_string();

    backend.add_fund(&id, &from, 25.0).await.unwrap();
    let funded = backend.record(&id).unwrap();
    assert_eq!(funded.funding_amount, Some(75.0));
    assert_eq!(funded.balance, Some(75.0));

    let err = backend.add_fund(&id, &from, -5.0).await.unwrap_err();
    assert_eq!(err.kind, BackendErrorKind::Validation);
}

#[tokio::test]
async fn test_add_fund_to_archived_is_rejected() {
    let backend = MemoryBackend::new(vec![record("x", VotingStatus::Archived, "0xme")]);
    let err = backend
        .add_fund(&VotingId::new("x"), &"0xme".to_string(), 1.0)
        .await
        .unwrap_err();
    assert_eq!(err.kind, BackendErrorKind::ChainRejected);
}

#[tokio::test]
async fn test_one_vote_per_identity() {
    let backend = MemoryBackend::new(vec![record("r", VotingStatus::Running, "0xissuer")]);
    let id = VotingId::new("r");
    let me = "0xme".to_string();

    backend.cast_vote(&id, &me, VoteOption::Confirm, 1.0).await.unwrap();
    let err = backend
        .cast_vote(&id, &me, VoteOption::Reject, 1.0)
        .await
        .unwrap_err();
    assert_eq!(err.kind, BackendErrorKind::DuplicateVote);

    backend
        .cast_vote(&id, &"0xyou".to_string(), VoteOption::Reject, 0.0)
        .await
        .unwrap();
    let voted = backend.record(&id).unwrap();
    assert_eq!(voted.votes_count, Some(2));
    let results = voted.results.unwrap();
    assert_eq!((results.confirm, results.reject), (1, 1));
    assert_eq!(voted.status, VotingStatus::Running);
}

#[tokio::test]
async fn test_vote_on_closed_voting_is_rejected() {
    let backend = MemoryBackend::new(vec![record("c", VotingStatus::Counting, "0xissuer")]);
    let err = backend
        .cast_vote(&VotingId::new("c"), &"0xme".to_string(), VoteOption::Confirm, 0.0)
        .await
        .unwrap_err();
    assert_eq!(err.kind, BackendErrorKind::ChainRejected);
}

#[tokio::test]
async fn test_missing_voting() {
    let backend = MemoryBackend::default();
    let err = backend.fetch_voting(&VotingId::new("nope")).await.unwrap_err();
    assert_eq!(err.kind, BackendErrorKind::NotFound);
}

#[tokio::test]
async fn test_demo_backend_covers_owned_votings() {
    let backend = MemoryBackend::demo("0xme");
    let mut mine = query(&VotingStatus::ALL, 100, None);
    mine.owner = Some("0xme".to_string());
    let page = backend.fetch_votings(&mine).await.unwrap();
    assert_eq!(page.items.len(), 3);
    assert!(page.items.iter().all(|r| r.issuer == "0xme"));
}
