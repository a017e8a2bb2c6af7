mod common;

use std::sync::Arc;

use oracles_core::backend::{BackendError, MemoryBackend, VotingBackend};
use oracles_core::list::{
    EmptyReason, FilePreferenceStore, ListEvent, ListSegment, ListState, MemoryPreferenceStore,
    VotingFilter,
};
use oracles_core::voting::VotingStatus;
use tempfile::tempdir;

use common::{identity, init_logging, list_with, memory_list, running_votings, voting, ORACLE};

#[tokio::test]
async fn test_two_pages_then_end_of_list() {
    init_logging();
    let (backend, list) = memory_list(running_votings(8), 5);

    let first = list.wait_for(|s| s.state == ListState::Loaded).await.unwrap();
    assert_eq!(first.context.votings.len(), 5);
    assert!(first.can_load_more());

    list.send(ListEvent::LoadMore);
    let second = list
        .wait_for(|s| s.state == ListState::Loaded && s.context.votings.len() == 8)
        .await
        .unwrap();
    assert!(second.context.continuation_token.is_none());
    assert!(!second.can_load_more());

    // nothing left to fetch, only the refresh hits the backend
    list.send(ListEvent::LoadMore);
    list.send(ListEvent::Refresh);
    let refreshed = list
        .wait_for(|s| {
            s.context.last_request() > second.context.last_request()
                && s.state == ListState::Loaded
        })
        .await
        .unwrap();
    assert_eq!(refreshed.context.votings.len(), 5);
    assert_eq!(backend.fetch_calls(), 3);
}

#[tokio::test]
async fn test_failure_then_refresh() {
    init_logging();
    let backend = Arc::new(MemoryBackend::new(running_votings(2)));
    backend.fail_next(BackendError::network("503 Service Unavailable"));
    let list = list_with(
        Arc::clone(&backend) as Arc<dyn VotingBackend>,
        Arc::new(MemoryPreferenceStore::default()),
        10,
    );

    let failed = list.wait_for(|s| s.state == ListState::Failure).await.unwrap();
    assert!(failed.context.error_message.is_some());
    assert!(failed.empty_reason().is_none());

    list.send(ListEvent::Refresh);
    let loaded = list.wait_for(|s| s.state == ListState::Loaded).await.unwrap();
    assert_eq!(loaded.context.votings.len(), 2);
    assert!(loaded.context.error_message.is_none());
}

#[tokio::test]
async fn test_empty_states() {
    init_logging();
    let (_, list) = memory_list(vec![voting("0x1", VotingStatus::Archived, "0xissuer")], 10);

    let snapshot = list.wait_for(|s| s.state == ListState::Loaded).await.unwrap();
    assert_eq!(snapshot.empty_reason(), Some(EmptyReason::NoVotingsForYou));

    list.send(ListEvent::ToggleShowAll(ListSegment::Owned));
    let owned = list
        .wait_for(|s| s.state == ListState::Loaded && s.context.segment == ListSegment::Owned)
        .await
        .unwrap();
    assert_eq!(owned.empty_reason(), Some(EmptyReason::NoVotingsYet));
}

#[tokio::test]
async fn test_segments_and_filters_combine() {
    init_logging();
    let records = vec![
        voting("0x1", VotingStatus::Pending, ORACLE),
        voting("0x2", VotingStatus::Running, "0xissuer"),
        voting("0x3", VotingStatus::Funding, ORACLE),
        voting("0x4", VotingStatus::Counting, "0xissuer"),
    ];
    let (_, list) = memory_list(records, 10);
    list.wait_for(|s| s.state == ListState::Loaded).await.unwrap();

    list.send(ListEvent::ToggleShowAll(ListSegment::Owned));
    list.send(ListEvent::Filter(VotingFilter::open()));
    let snapshot = list
        .wait_for(|s| {
            s.state == ListState::Loaded
                && s.context.segment == ListSegment::Owned
                && s.context.filter == VotingFilter::open()
        })
        .await
        .unwrap();
    let ids: Vec<_> = snapshot
        .context
        .votings
        .iter()
        .map(|v| v.id.to_string())
        .collect();
    assert_eq!(ids, vec!["0x3"]);
}

#[tokio::test]
async fn test_preferences_restored_from_disk() {
    init_logging();
    let dir = tempdir().unwrap();
    let path = dir.path().join("list.json");
    std::fs::write(&path, r#"{"filter":["Counting"],"segment":"closed"}"#).unwrap();

    let backend: Arc<dyn VotingBackend> = Arc::new(MemoryBackend::new(vec![
        voting("0x1", VotingStatus::Counting, "0xissuer"),
        voting("0x2", VotingStatus::Archived, "0xissuer"),
    ]));
    let list = list_with(backend, Arc::new(FilePreferenceStore::new(&path)), 10);

    let snapshot = list.wait_for(|s| s.state == ListState::Loaded).await.unwrap();
    assert_eq!(snapshot.context.segment, ListSegment::Closed);
    assert_eq!(snapshot.context.votings.len(), 1);
    assert_eq!(snapshot.context.votings[0].status, VotingStatus::Counting);
    assert_eq!(snapshot.context.identity, identity());
}
