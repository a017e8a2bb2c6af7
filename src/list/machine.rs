use std::collections::HashSet;
use std::fmt;

use log::{debug, warn};

use super::{EmptyReason, ListPreferences, ListSegment, VotingFilter};
use crate::backend::{BackendError, ListQuery, Page};
use crate::errors::VotingError;
use crate::machine::{Machine, Notification, Snapshot, Transition};
use crate::voting::{EpochSnapshot, IdentitySnapshot, VotingId, VotingStatus, VotingSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadingPhase {
    /// Fetch in flight, nothing shown yet
    Idle,
    /// Fetch is taking long enough to show placeholders
    Late,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// First page of a new filter: prior items are discarded
    Replace,
    /// Next page: prior items are kept
    Append,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListState {
    Preload,
    Loading { phase: LoadingPhase, mode: LoadMode },
    Loaded,
    Failure,
}

impl ListState {
    pub fn is_loading(&self) -> bool {
        matches!(self, ListState::Loading { .. })
    }

    pub fn is_late(&self) -> bool {
        matches!(
            self,
            ListState::Loading {
                phase: LoadingPhase::Late,
                ..
            }
        )
    }
}

impl fmt::Display for ListState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListState::Preload => write!(f, "preload"),
            ListState::Loading { phase, .. } => match phase {
                LoadingPhase::Idle => write!(f, "loading.idle"),
                LoadingPhase::Late => write!(f, "loading.late"),
            },
            ListState::Loaded => write!(f, "loaded"),
            ListState::Failure => write!(f, "failure"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListContext {
    pub identity: IdentitySnapshot,
    pub epoch: EpochSnapshot,
    pub votings: Vec<VotingSummary>,
    pub filter: VotingFilter,
    pub segment: ListSegment,
    pub continuation_token: Option<String>,
    pub error_message: Option<String>,
    pub page_size: usize,
    request_seq: u64,
    in_flight: Option<u64>,
}

impl ListContext {
    pub fn new(identity: IdentitySnapshot, epoch: EpochSnapshot, page_size: usize) -> Self {
        Self {
            identity,
            epoch,
            votings: Vec::new(),
            filter: VotingFilter::any(),
            segment: ListSegment::default(),
            continuation_token: None,
            error_message: None,
            page_size,
            request_seq: 0,
            in_flight: None,
        }
    }

    pub fn show_all(&self) -> bool {
        self.segment.show_all()
    }

    pub fn preferences(&self) -> ListPreferences {
        ListPreferences {
            filter: self.filter.clone(),
            segment: self.segment,
        }
    }

    /// Request id of the fetch whose result is still awaited
    pub fn in_flight(&self) -> Option<u64> {
        self.in_flight
    }

    /// Id of the most recently started fetch, 0 before the first one
    pub fn last_request(&self) -> u64 {
        self.request_seq
    }

    /// Resolves segment, status filter and identity into a backend query
    pub fn query(&self, continuation_token: Option<String>) -> ListQuery {
        let statuses: Vec<VotingStatus> = self
            .segment
            .statuses()
            .iter()
            .copied()
            .filter(|status| self.filter.contains(*status))
            .collect();
        let owner = if self.segment.show_all() {
            None
        } else {
            Some(self.identity.address.clone())
        };

        ListQuery {
            statuses,
            owner,
            oracle: self.identity.address.clone(),
            epoch: self.epoch.epoch_number,
            limit: self.page_size,
            continuation_token,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ListEvent {
    Init,
    PreferencesLoaded(ListPreferences),
    Filter(VotingFilter),
    ToggleShowAll(ListSegment),
    LoadMore,
    Refresh,
    LoadingLate { request: u64 },
    FetchDone { request: u64, page: Page },
    FetchFailed { request: u64, error: BackendError },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListEffect {
    LoadPreferences,
    SavePreferences(ListPreferences),
    Fetch { request: u64, query: ListQuery },
    ScheduleLate { request: u64 },
}

/// Reducer of the voting list
#[derive(Debug)]
pub struct VotingListMachine;

type ListTransition = Transition<VotingListMachine>;

impl Machine for VotingListMachine {
    type State = ListState;
    type Context = ListContext;
    type Event = ListEvent;
    type Effect = ListEffect;

    const NAME: &'static str = "voting list";

    fn transition(state: &ListState, context: &ListContext, event: ListEvent) -> ListTransition {
        match (state, event) {
            (ListState::Preload, ListEvent::Init) => {
                Transition::stay(state, context).with_effect(ListEffect::LoadPreferences)
            }
            (ListState::Preload, ListEvent::PreferencesLoaded(prefs)) => {
                let mut next = context.clone();
                next.filter = prefs.filter;
                next.segment = prefs.segment;
                start_fetch(next, LoadMode::Replace)
            }
            (ListState::Preload, event) => {
                debug!("Ignoring {:?} before preferences are restored", event);
                Transition::stay(state, context)
            }

            (_, ListEvent::Filter(filter)) => {
                let mut next = context.clone();
                next.filter = filter;
                let prefs = next.preferences();
                start_fetch(next, LoadMode::Replace).with_effect(ListEffect::SavePreferences(prefs))
            }
            (_, ListEvent::ToggleShowAll(segment)) => {
                let mut next = context.clone();
                next.segment = segment;
                let prefs = next.preferences();
                start_fetch(next, LoadMode::Replace).with_effect(ListEffect::SavePreferences(prefs))
            }

            (ListState::Loaded | ListState::Failure, ListEvent::LoadMore) => {
                if context.continuation_token.is_none() {
                    return Transition::stay(state, context);
                }
                start_fetch(context.clone(), LoadMode::Append)
            }
            (ListState::Loaded | ListState::Failure, ListEvent::Refresh) => {
                start_fetch(context.clone(), LoadMode::Replace)
            }

            (
                ListState::Loading {
                    phase: LoadingPhase::Idle,
                    mode,
                },
                ListEvent::LoadingLate { request },
            ) if context.in_flight == Some(request) => Transition::to(
                ListState::Loading {
                    phase: LoadingPhase::Late,
                    mode: *mode,
                },
                context.clone(),
            ),

            (ListState::Loading { mode, .. }, ListEvent::FetchDone { request, page })
                if context.in_flight == Some(request) =>
            {
                let mut next = context.clone();
                next.in_flight = None;
                next.error_message = None;
                next.continuation_token = page.continuation_token;
                let incoming = page.items.into_iter().map(VotingSummary::from_record);
                match mode {
                    LoadMode::Replace => {
                        next.votings = Vec::new();
                        append_unique(&mut next.votings, incoming);
                    }
                    LoadMode::Append => append_unique(&mut next.votings, incoming),
                }
                Transition::to(ListState::Loaded, next)
            }

            (ListState::Loading { .. }, ListEvent::FetchFailed { request, error })
                if context.in_flight == Some(request) =>
            {
                let error = VotingError::from_fetch(&error);
                let mut next = context.clone();
                next.in_flight = None;
                next.error_message = Some(error.to_string());
                Transition::to(ListState::Failure, next).notify(Notification::error(None, error))
            }

            (_, ListEvent::FetchFailed { request, error }) => {
                warn!("Discarding failure of superseded request {}: {}", request, error);
                Transition::stay(state, context)
            }
            (_, event) => {
                debug!("{} ignores {:?} in {}", VotingListMachine::NAME, event, state);
                Transition::stay(state, context)
            }
        }
    }
}

/// Enters loading for a new request; replace mode drops the current items
fn start_fetch(mut context: ListContext, mode: LoadMode) -> ListTransition {
    context.request_seq += 1;
    let request = context.request_seq;
    context.in_flight = Some(request);
    context.error_message = None;

    let token = match mode {
        LoadMode::Replace => {
            context.votings.clear();
            context.continuation_token = None;
            None
        }
        LoadMode::Append => context.continuation_token.clone(),
    };
    let query = context.query(token);

    Transition::to(
        ListState::Loading {
            phase: LoadingPhase::Idle,
            mode,
        },
        context,
    )
    .with_effect(ListEffect::Fetch { request, query })
    .with_effect(ListEffect::ScheduleLate { request })
}

/// Appends in order, skipping ids already present
fn append_unique(votings: &mut Vec<VotingSummary>, incoming: impl Iterator<Item = VotingSummary>) {
    let mut seen: HashSet<VotingId> = votings.iter().map(|v| v.id.clone()).collect();
    for voting in incoming {
        if seen.insert(voting.id.clone()) {
            votings.push(voting);
        } else {
            debug!("Skipping duplicate voting {}", voting.id);
        }
    }
}

impl Snapshot<VotingListMachine> {
    /// Whether a "load more" action makes sense right now
    pub fn can_load_more(&self) -> bool {
        self.state == ListState::Loaded && self.context.continuation_token.is_some()
    }

    pub fn empty_reason(&self) -> Option<EmptyReason> {
        if self.state != ListState::Loaded || !self.context.votings.is_empty() {
            return None;
        }
        if self.context.show_all() && self.context.identity.is_validated {
            Some(EmptyReason::NoVotingsForYou)
        } else {
            Some(EmptyReason::NoVotingsYet)
        }
    }
}
