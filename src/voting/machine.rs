use std::fmt;

use log::{debug, warn};

use super::{
    EpochSnapshot, IdentitySnapshot, VoteOption, VotingDetail, VotingRecord, VotingStatus,
};
use crate::backend::BackendError;
use crate::errors::VotingError;
use crate::machine::{Machine, Notification, Transition};

/// Transaction awaiting confirmation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PendingOp {
    Launch,
    Fund { amount: f64 },
    Vote { option: VoteOption, deposit: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VotingState {
    Idle(VotingStatus),
    /// `resume` is the status the machine returns to if the transaction fails
    Pending { op: PendingOp, resume: VotingStatus },
}

impl VotingState {
    pub fn status(&self) -> VotingStatus {
        match self {
            VotingState::Idle(status) => *status,
            VotingState::Pending { resume, .. } => *resume,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, VotingState::Pending { .. })
    }

    /// True when idle in any of `statuses`
    pub fn is_idle_in(&self, statuses: &[VotingStatus]) -> bool {
        match self {
            VotingState::Idle(status) => statuses.contains(status),
            VotingState::Pending { .. } => false,
        }
    }

    pub fn can_launch(&self) -> bool {
        self.is_idle_in(&[VotingStatus::Pending])
    }

    pub fn can_open(&self) -> bool {
        self.is_idle_in(&[
            VotingStatus::Running,
            VotingStatus::Voted,
            VotingStatus::Counting,
            VotingStatus::Archived,
        ])
    }

    pub fn shows_results(&self) -> bool {
        self.is_idle_in(&[
            VotingStatus::Voted,
            VotingStatus::Counting,
            VotingStatus::Archived,
        ])
    }

    pub fn can_add_fund(&self) -> bool {
        matches!(self, VotingState::Idle(status) if !status.is_terminal())
    }

    pub fn can_vote(&self) -> bool {
        self.is_idle_in(&[VotingStatus::Running])
    }
}

impl fmt::Display for VotingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VotingState::Idle(status) => write!(f, "idle.{}", status),
            VotingState::Pending { op, .. } => match op {
                PendingOp::Launch => write!(f, "pending.launch"),
                PendingOp::Fund { .. } => write!(f, "pending.fund"),
                PendingOp::Vote { .. } => write!(f, "pending.vote"),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VotingContext {
    pub detail: VotingDetail,
    pub identity: IdentitySnapshot,
    pub epoch: EpochSnapshot,
    /// Option chosen by this identity, when cast from this machine
    pub my_vote: Option<VoteOption>,
    pub has_voted: bool,
    pub last_error: Option<VotingError>,
    /// Backend figures were applied while a transaction was pending; they may
    /// already include it, so the confirmation adds nothing on top
    pub reconciled_while_pending: bool,
}

impl VotingContext {
    pub fn new(detail: VotingDetail, identity: IdentitySnapshot, epoch: EpochSnapshot) -> Self {
        let has_voted = detail.status == VotingStatus::Voted;
        Self {
            detail,
            identity,
            epoch,
            my_vote: None,
            has_voted,
            last_error: None,
            reconciled_while_pending: false,
        }
    }

    /// Initial state mirrors the status the detail reports
    pub fn initial_state(&self) -> VotingState {
        VotingState::Idle(self.detail.status)
    }
}

#[derive(Debug, Clone)]
pub enum VotingEvent {
    StartVoting,
    AddFund { amount: f64 },
    Vote { option: VoteOption, deposit: f64 },
    Refresh,
    Loaded(VotingRecord),
    LoadFailed(BackendError),
    TxConfirmed,
    TxFailed(BackendError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum VotingEffect {
    Reload,
    SubmitLaunch,
    SubmitFund { amount: f64 },
    SubmitVote { option: VoteOption, deposit: f64 },
}

/// Reducer of a single voting
#[derive(Debug)]
pub struct VotingMachine;

type VotingTransition = Transition<VotingMachine>;

impl Machine for VotingMachine {
    type State = VotingState;
    type Context = VotingContext;
    type Event = VotingEvent;
    type Effect = VotingEffect;

    const NAME: &'static str = "voting";

    fn transition(
        state: &VotingState,
        context: &VotingContext,
        event: VotingEvent,
    ) -> VotingTransition {
        match event {
            VotingEvent::StartVoting => start_voting(state, context),
            VotingEvent::AddFund { amount } => add_fund(state, context, amount),
            VotingEvent::Vote { option, deposit } => vote(state, context, option, deposit),
            VotingEvent::Refresh => {
                Transition::stay(state, context).with_effect(VotingEffect::Reload)
            }
            VotingEvent::Loaded(record) => reconcile(state, context, record),
            VotingEvent::LoadFailed(error) => {
                let error = VotingError::from_fetch(&error);
                let mut next = context.clone();
                next.last_error = Some(error.clone());
                Transition::to(*state, next).notify(notify(context, error))
            }
            VotingEvent::TxConfirmed => confirm(state, context),
            VotingEvent::TxFailed(error) => fail(state, context, error),
        }
    }

    fn tick() -> Option<VotingEvent> {
        Some(VotingEvent::Refresh)
    }
}

fn notify(context: &VotingContext, error: VotingError) -> Notification {
    Notification::error(Some(context.detail.id.clone()), error)
}

/// Rejects an event without touching the detail
fn reject(state: &VotingState, context: &VotingContext, error: VotingError) -> VotingTransition {
    let mut next = context.clone();
    next.last_error = Some(error.clone());
    Transition::to(*state, next).notify(notify(context, error))
}

fn start_voting(state: &VotingState, context: &VotingContext) -> VotingTransition {
    if !state.can_launch() {
        debug!("Voting {} cannot be launched in {}", context.detail.id, state);
        return Transition::stay(state, context);
    }
    Transition::to(
        VotingState::Pending {
            op: PendingOp::Launch,
            resume: VotingStatus::Pending,
        },
        context.clone(),
    )
    .with_effect(VotingEffect::SubmitLaunch)
}

fn add_fund(state: &VotingState, context: &VotingContext, amount: f64) -> VotingTransition {
    let VotingState::Idle(status) = *state else {
        debug!("Voting {} is busy, ignoring fund request", context.detail.id);
        return Transition::stay(state, context);
    };
    if status.is_terminal() {
        debug!("Voting {} is archived, ignoring fund request", context.detail.id);
        return Transition::stay(state, context);
    }
    if !(amount.is_finite() && amount > 0.0) {
        return reject(
            state,
            context,
            VotingError::Validation(format!("fund amount must be a positive number, got {}", amount)),
        );
    }

    Transition::to(
        VotingState::Pending {
            op: PendingOp::Fund { amount },
            resume: status,
        },
        context.clone(),
    )
    .with_effect(VotingEffect::SubmitFund { amount })
}

fn vote(
    state: &VotingState,
    context: &VotingContext,
    option: VoteOption,
    deposit: f64,
) -> VotingTransition {
    if state.is_pending() {
        debug!("Voting {} is busy, ignoring vote", context.detail.id);
        return Transition::stay(state, context);
    }
    if context.has_voted || state.is_idle_in(&[VotingStatus::Voted]) {
        return reject(state, context, VotingError::DuplicateVote);
    }
    if !state.can_vote() {
        debug!("Voting {} is not open for votes in {}", context.detail.id, state);
        return Transition::stay(state, context);
    }
    if !(deposit.is_finite() && deposit >= 0.0) {
        return reject(
            state,
            context,
            VotingError::Validation(format!("deposit must not be negative, got {}", deposit)),
        );
    }

    Transition::to(
        VotingState::Pending {
            op: PendingOp::Vote { option, deposit },
            resume: VotingStatus::Running,
        },
        context.clone(),
    )
    .with_effect(VotingEffect::SubmitVote { option, deposit })
}

fn confirm(state: &VotingState, context: &VotingContext) -> VotingTransition {
    let VotingState::Pending { op, resume } = *state else {
        warn!("Voting {}: confirmation without a pending transaction", context.detail.id);
        return Transition::stay(state, context);
    };

    let id = Some(context.detail.id.clone());
    let optimistic = !context.reconciled_while_pending;
    let mut next = context.clone();
    next.last_error = None;
    next.reconciled_while_pending = false;
    let t = match op {
        PendingOp::Launch => {
            next.detail.status = VotingStatus::Running;
            Transition::to(VotingState::Idle(VotingStatus::Running), next)
                .notify(Notification::confirmed(id, "Voting launched"))
        }
        PendingOp::Fund { amount } => {
            if optimistic {
                next.detail.funding_amount += amount;
                next.detail.balance += amount;
            }
            Transition::to(VotingState::Idle(resume), next)
                .notify(Notification::confirmed(id, format!("Added {} to the prize pool", amount)))
        }
        PendingOp::Vote { option, .. } => {
            if optimistic {
                next.detail.votes_count += 1;
                next.detail.results.record(option);
            }
            next.my_vote = Some(option);
            next.has_voted = true;
            next.detail.status = VotingStatus::Voted;
            Transition::to(VotingState::Idle(VotingStatus::Voted), next)
                .notify(Notification::confirmed(id, format!("Voted {}", option)))
        }
    };
    t.with_effect(VotingEffect::Reload)
}

fn fail(state: &VotingState, context: &VotingContext, error: BackendError) -> VotingTransition {
    let VotingState::Pending { resume, .. } = *state else {
        warn!(
            "Voting {}: transaction failure without a pending transaction: {}",
            context.detail.id, error
        );
        return Transition::stay(state, context);
    };

    let error = VotingError::from_transaction(&error);
    let mut next = context.clone();
    next.reconciled_while_pending = false;
    if error == VotingError::DuplicateVote {
        next.has_voted = true;
    }
    next.last_error = Some(error.clone());
    Transition::to(VotingState::Idle(resume), next)
        .with_effect(VotingEffect::Reload)
        .notify(notify(context, error))
}

/// Applies backend truth; the status never moves backwards
fn reconcile(state: &VotingState, context: &VotingContext, record: VotingRecord) -> VotingTransition {
    if record.id != context.detail.id {
        warn!(
            "Voting {}: ignoring record of voting {}",
            context.detail.id, record.id
        );
        return Transition::stay(state, context);
    }

    let mut next = context.clone();
    let mut detail = VotingDetail::from_record(record);
    let current = state.status();
    let status = if current.can_advance_to(detail.status) {
        detail.status
    } else {
        debug!(
            "Voting {}: backend reports {} after {}, keeping {}",
            context.detail.id, detail.status, current, current
        );
        current
    };
    detail.status = status;
    if status == VotingStatus::Voted {
        next.has_voted = true;
    }
    next.detail = detail;

    let state = match *state {
        VotingState::Idle(_) => VotingState::Idle(status),
        VotingState::Pending { op, .. } => {
            next.reconciled_while_pending = true;
            VotingState::Pending { op, resume: status }
        }
    };
    Transition::to(state, next)
}
