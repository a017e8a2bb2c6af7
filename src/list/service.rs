use std::sync::Arc;
use std::time::Duration;

use log::warn;

use super::machine::{ListContext, ListEffect, ListEvent, ListState, VotingListMachine};
use super::preferences::PreferenceStore;
use crate::backend::VotingBackend;
use crate::config::ListConfig;
use crate::machine::{EffectHandler, EventSender, Service, ServiceOptions};
use crate::voting::{EpochSnapshot, IdentitySnapshot};

pub type VotingListService = Service<VotingListMachine>;

#[derive(Debug, Clone)]
pub struct ListOptions {
    pub page_size: usize,
    /// Delay after which a pending fetch is reported as late
    pub late_after: Duration,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self::from(&ListConfig::default())
    }
}

impl From<&ListConfig> for ListOptions {
    fn from(config: &ListConfig) -> Self {
        Self {
            page_size: config.page_size,
            late_after: Duration::from_millis(config.late_after_ms),
        }
    }
}

pub struct ListEffectHandler {
    backend: Arc<dyn VotingBackend>,
    store: Arc<dyn PreferenceStore>,
    late_after: Duration,
}

impl ListEffectHandler {
    pub fn new(
        backend: Arc<dyn VotingBackend>,
        store: Arc<dyn PreferenceStore>,
        late_after: Duration,
    ) -> Self {
        Self {
            backend,
            store,
            late_after,
        }
    }
}

impl EffectHandler<VotingListMachine> for ListEffectHandler {
    fn execute(&self, effect: ListEffect, events: EventSender<VotingListMachine>) {
        match effect {
            ListEffect::LoadPreferences => {
                let store = Arc::clone(&self.store);
                tokio::spawn(async move {
                    let prefs = match tokio::task::spawn_blocking(move || store.load()).await {
                        Ok(Ok(prefs)) => prefs.unwrap_or_default(),
                        Ok(Err(err)) => {
                            warn!("Could not restore list preferences, using defaults: {}", err);
                            Default::default()
                        }
                        Err(err) => {
                            warn!("Preference loading task failed, using defaults: {}", err);
                            Default::default()
                        }
                    };
                    events.send(ListEvent::PreferencesLoaded(prefs));
                });
            }
            ListEffect::SavePreferences(prefs) => {
                let store = Arc::clone(&self.store);
                tokio::task::spawn_blocking(move || {
                    if let Err(err) = store.save(&prefs) {
                        warn!("Could not persist list preferences: {}", err);
                    }
                });
            }
            ListEffect::Fetch { request, query } => {
                let backend = Arc::clone(&self.backend);
                tokio::spawn(async move {
                    let event = match backend.fetch_votings(&query).await {
                        Ok(page) => ListEvent::FetchDone { request, page },
                        Err(error) => ListEvent::FetchFailed { request, error },
                    };
                    events.send(event);
                });
            }
            ListEffect::ScheduleLate { request } => {
                let delay = self.late_after;
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    events.send(ListEvent::LoadingLate { request });
                });
            }
        }
    }
}

/// Starts a list machine in `preload`; it restores preferences and loads the first page
pub fn spawn_list(
    backend: Arc<dyn VotingBackend>,
    store: Arc<dyn PreferenceStore>,
    identity: IdentitySnapshot,
    epoch: EpochSnapshot,
    options: ListOptions,
) -> VotingListService {
    let context = ListContext::new(identity, epoch, options.page_size);
    let handler = ListEffectHandler::new(backend, store, options.late_after);
    Service::spawn(
        ListState::Preload,
        context,
        handler,
        vec![ListEvent::Init],
        ServiceOptions::default(),
    )
}
