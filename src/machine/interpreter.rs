use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, trace, warn};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::{Machine, Notification};

/// Executes the effects a machine asks for.
///
/// Implementations must not block: anything asynchronous is spawned and
/// reports back through `events`.
pub trait EffectHandler<M: Machine>: Send + Sync + 'static {
    fn execute(&self, effect: M::Effect, events: EventSender<M>);
}

/// Handle used to feed events into a running machine
pub struct EventSender<M: Machine> {
    tx: mpsc::UnboundedSender<M::Event>,
}

impl<M: Machine> Clone for EventSender<M> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<M: Machine> EventSender<M> {
    /// Returns `false` once the machine has been stopped
    pub fn send(&self, event: M::Event) -> bool {
        match self.tx.send(event) {
            Ok(()) => true,
            Err(mpsc::error::SendError(event)) => {
                debug!("{} is stopped, dropping {:?}", M::NAME, event);
                false
            }
        }
    }
}

/// State and context published after every processed event
pub struct Snapshot<M: Machine> {
    pub state: M::State,
    pub context: M::Context,
}

impl<M: Machine> Clone for Snapshot<M> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            context: self.context.clone(),
        }
    }
}

impl<M: Machine> fmt::Debug for Snapshot<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("state", &self.state)
            .field("context", &self.context)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ServiceOptions {
    /// Period of [`Machine::tick`] events, `None` disables polling
    pub poll_interval: Option<Duration>,
    /// Buffered notifications per subscriber before the oldest are dropped
    pub notification_capacity: usize,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            poll_interval: None,
            notification_capacity: 64,
        }
    }
}

/// A running machine instance.
///
/// Events are processed one at a time, to completion, on a dedicated task.
/// Dropping or stopping the service tears down the loop; effects already
/// spawned (submitted transactions) keep running but their outcome is discarded.
pub struct Service<M: Machine> {
    events: EventSender<M>,
    snapshots: watch::Receiver<Snapshot<M>>,
    notifications: broadcast::Sender<Notification>,
    task: JoinHandle<()>,
}

impl<M: Machine> Service<M> {
    /// Starts the machine on the current tokio runtime
    pub fn spawn<H: EffectHandler<M>>(
        state: M::State,
        context: M::Context,
        handler: H,
        initial: Vec<M::Event>,
        options: ServiceOptions,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let events = EventSender { tx };
        for event in initial {
            events.send(event);
        }

        let (snapshot_tx, snapshots) = watch::channel(Snapshot {
            state: state.clone(),
            context: context.clone(),
        });
        let (notifications, _) = broadcast::channel(options.notification_capacity.max(1));

        let task = tokio::spawn(run_loop(
            state,
            context,
            Arc::new(handler),
            rx,
            events.clone(),
            snapshot_tx,
            notifications.clone(),
            options.poll_interval,
        ));

        Self {
            events,
            snapshots,
            notifications,
            task,
        }
    }

    pub fn send(&self, event: M::Event) -> bool {
        self.events.send(event)
    }

    pub fn sender(&self) -> EventSender<M> {
        self.events.clone()
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> Snapshot<M> {
        self.snapshots.borrow().clone()
    }

    pub fn state(&self) -> M::State {
        self.snapshots.borrow().state.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot<M>> {
        self.snapshots.clone()
    }

    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    /// Waits until a snapshot satisfies `predicate`; `None` if the machine stopped first
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&Snapshot<M>) -> bool,
    ) -> Option<Snapshot<M>> {
        let mut rx = self.snapshots.clone();
        let result = rx.wait_for(|snapshot| predicate(snapshot)).await;
        result.ok().map(|snapshot| (*snapshot).clone())
    }

    pub fn stop(&self) {
        if !self.task.is_finished() {
            debug!("Stopping {}", M::NAME);
        }
        self.task.abort();
    }

    pub fn is_stopped(&self) -> bool {
        self.task.is_finished()
    }
}

impl<M: Machine> Drop for Service<M> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_loop<M: Machine, H: EffectHandler<M>>(
    mut state: M::State,
    mut context: M::Context,
    handler: Arc<H>,
    mut rx: mpsc::UnboundedReceiver<M::Event>,
    events: EventSender<M>,
    snapshots: watch::Sender<Snapshot<M>>,
    notifications: broadcast::Sender<Notification>,
    poll_interval: Option<Duration>,
) {
    let mut ticker = poll_interval.map(|period| {
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        interval
    });

    loop {
        let event = match ticker.as_mut() {
            Some(ticker) => tokio::select! {
                event = rx.recv() => event,
                _ = ticker.tick() => match M::tick() {
                    Some(event) => Some(event),
                    None => continue,
                },
            },
            None => rx.recv().await,
        };
        let Some(event) = event else {
            break;
        };

        trace!("{} <- {:?}", M::NAME, event);
        let transition = M::transition(&state, &context, event);
        if transition.state != state {
            debug!("{}: {:?} -> {:?}", M::NAME, state, transition.state);
        }
        state = transition.state;
        context = transition.context;

        for notification in transition.notifications {
            if notifications.send(notification.clone()).is_err() {
                if notification.is_error() {
                    warn!("{}: {} (no subscriber)", M::NAME, notification);
                } else {
                    debug!("{}: {} (no subscriber)", M::NAME, notification);
                }
            }
        }

        snapshots.send_replace(Snapshot {
            state: state.clone(),
            context: context.clone(),
        });

        for effect in transition.effects {
            trace!("{} effect {:?}", M::NAME, effect);
            handler.execute(effect, events.clone());
        }
    }
}
