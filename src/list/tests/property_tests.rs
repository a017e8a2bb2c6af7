use std::collections::HashSet;

use proptest::prelude::*;

use super::{page, start, step};
use crate::backend::BackendError;
use crate::list::machine::{ListContext, ListEvent, ListState};
use crate::list::{ListSegment, VotingFilter};

#[derive(Debug, Clone)]
enum Op {
    Filter(bool),
    Segment(usize),
    LoadMore,
    Refresh,
    Late { current: bool },
    Done { current: bool, ids: Vec<u8>, more: bool },
    Failed { current: bool },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<bool>().prop_map(Op::Filter),
        (0usize..4).prop_map(Op::Segment),
        Just(Op::LoadMore),
        Just(Op::Refresh),
        any::<bool>().prop_map(|current| Op::Late { current }),
        (any::<bool>(), prop::collection::vec(0u8..12, 0..6), any::<bool>())
            .prop_map(|(current, ids, more)| Op::Done { current, ids, more }),
        any::<bool>().prop_map(|current| Op::Failed { current }),
    ]
}

fn request(context: &ListContext, current: bool) -> u64 {
    match (current, context.in_flight()) {
        (true, Some(request)) => request,
        _ => context.last_request() + 100,
    }
}

fn event(context: &ListContext, op: Op) -> ListEvent {
    const SEGMENTS: [ListSegment; 4] = [
        ListSegment::Todo,
        ListSegment::Voting,
        ListSegment::Closed,
        ListSegment::Owned,
    ];
    match op {
        Op::Filter(open) => ListEvent::Filter(if open {
            VotingFilter::open()
        } else {
            VotingFilter::any()
        }),
        Op::Segment(i) => ListEvent::ToggleShowAll(SEGMENTS[i]),
        Op::LoadMore => ListEvent::LoadMore,
        Op::Refresh => ListEvent::Refresh,
        Op::Late { current } => ListEvent::LoadingLate {
            request: request(context, current),
        },
        Op::Done { current, ids, more } => {
            let ids: Vec<String> = ids.iter().map(|i| format!("v{}", i)).collect();
            let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
            ListEvent::FetchDone {
                request: request(context, current),
                page: page(&ids, more.then_some("next")),
            }
        }
        Op::Failed { current } => ListEvent::FetchFailed {
            request: request(context, current),
            error: BackendError::network("flaky"),
        },
    }
}

proptest! {
    #[test]
    fn list_invariants_hold_for_any_event_sequence(ops in prop::collection::vec(op(), 0..40)) {
        let first = start();
        let mut state = first.state;
        let mut context = first.context;

        for op in ops {
            let before_seq = context.last_request();
            let t = step(&state, &context, event(&context, op));

            // ids stay unique
            let unique: HashSet<_> = t.context.votings.iter().map(|v| v.id.clone()).collect();
            prop_assert_eq!(unique.len(), t.context.votings.len());

            // exactly one fetch is awaited while loading, none otherwise
            prop_assert_eq!(t.state.is_loading(), t.context.in_flight().is_some());
            prop_assert!(t.state != ListState::Preload);

            // request ids only grow
            prop_assert!(t.context.last_request() >= before_seq);

            if t.state == ListState::Failure {
                prop_assert!(t.context.error_message.is_some());
            }

            state = t.state;
            context = t.context;
        }
    }

    #[test]
    fn load_more_without_token_is_a_no_op(ids in prop::collection::vec(0u8..20, 0..10)) {
        let first = start();
        let ids: Vec<String> = ids.iter().map(|i| format!("v{}", i)).collect();
        let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
        let request = first.context.in_flight().unwrap_or_default();
        let loaded = step(
            &first.state,
            &first.context,
            ListEvent::FetchDone { request, page: page(&ids, None) },
        );

        let t = step(&loaded.state, &loaded.context, ListEvent::LoadMore);
        prop_assert_eq!(t.state, loaded.state);
        prop_assert_eq!(&t.context, &loaded.context);
        prop_assert!(t.effects.is_empty());
    }
}
