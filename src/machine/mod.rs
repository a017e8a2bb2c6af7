// State machine plumbing shared by the list and voting machines

pub mod interpreter;

pub use interpreter::{EffectHandler, EventSender, Service, ServiceOptions, Snapshot};

use std::fmt;

use crate::errors::VotingError;
use crate::voting::VotingId;

/// A pure state machine.
///
/// `transition` never performs IO: side effects are returned as values and
/// executed by an [`EffectHandler`], which reports their outcome as new events.
pub trait Machine: Sized + Send + 'static {
    type State: Clone + fmt::Debug + PartialEq + Send + Sync + 'static;
    type Context: Clone + fmt::Debug + Send + Sync + 'static;
    type Event: fmt::Debug + Send + 'static;
    type Effect: fmt::Debug + Send + 'static;

    /// Name used in log lines
    const NAME: &'static str;

    fn transition(
        state: &Self::State,
        context: &Self::Context,
        event: Self::Event,
    ) -> Transition<Self>;

    /// Event injected on every poll tick, for machines that poll
    fn tick() -> Option<Self::Event> {
        None
    }
}

/// Outcome of processing one event
pub struct Transition<M: Machine> {
    pub state: M::State,
    pub context: M::Context,
    pub effects: Vec<M::Effect>,
    pub notifications: Vec<Notification>,
}

impl<M: Machine> Transition<M> {
    pub fn to(state: M::State, context: M::Context) -> Self {
        Self {
            state,
            context,
            effects: Vec::new(),
            notifications: Vec::new(),
        }
    }

    /// Leaves state and context untouched
    pub fn stay(state: &M::State, context: &M::Context) -> Self {
        Self::to(state.clone(), context.clone())
    }

    pub fn with_effect(mut self, effect: M::Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn notify(mut self, notification: Notification) -> Self {
        self.notifications.push(notification);
        self
    }
}

impl<M: Machine> fmt::Debug for Transition<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("state", &self.state)
            .field("effects", &self.effects)
            .field("notifications", &self.notifications)
            .finish()
    }
}

/// Toast-style message published next to the state, never part of it
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Voting the message is about, `None` for list-level messages
    pub voting: Option<VotingId>,
    pub kind: NotificationKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NotificationKind {
    Error(VotingError),
    Confirmed(String),
}

impl Notification {
    pub fn error(voting: Option<VotingId>, error: VotingError) -> Self {
        Self {
            voting,
            kind: NotificationKind::Error(error),
        }
    }

    pub fn confirmed(voting: Option<VotingId>, message: impl Into<String>) -> Self {
        Self {
            voting,
            kind: NotificationKind::Confirmed(message.into()),
        }
    }

    pub fn as_error(&self) -> Option<&VotingError> {
        match &self.kind {
            NotificationKind::Error(err) => Some(err),
            NotificationKind::Confirmed(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.as_error().is_some()
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NotificationKind::Error(err) => write!(f, "{}", err),
            NotificationKind::Confirmed(message) => write!(f, "{}", message),
        }
    }
}
