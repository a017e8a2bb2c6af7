use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use parking_lot::Mutex;

use super::service::{spawn_voting, VotingService};
use super::{EpochSnapshot, IdentitySnapshot, VotingDetail, VotingId, VotingRef, VotingSummary};
use crate::backend::VotingBackend;

/// Lazily binds voting references to running machines.
///
/// A machine is created on the first bind of a reference and lives until it is
/// released; the list that produced the reference never owns it.
pub struct VotingRegistry {
    backend: Arc<dyn VotingBackend>,
    identity: IdentitySnapshot,
    epoch: EpochSnapshot,
    poll_interval: Option<Duration>,
    services: Mutex<HashMap<VotingId, Arc<VotingService>>>,
}

impl VotingRegistry {
    pub fn new(
        backend: Arc<dyn VotingBackend>,
        identity: IdentitySnapshot,
        epoch: EpochSnapshot,
        poll_interval: Option<Duration>,
    ) -> Self {
        Self {
            backend,
            identity,
            epoch,
            poll_interval,
            services: Mutex::new(HashMap::new()),
        }
    }

    /// Machine behind the summary's reference, started from the summary if needed
    pub fn bind(&self, summary: &VotingSummary) -> Arc<VotingService> {
        let mut services = self.services.lock();
        if let Some(service) = services.get(summary.reference.id()) {
            return Arc::clone(service);
        }

        debug!("Binding voting {}", summary.id);
        let service = Arc::new(spawn_voting(
            Arc::clone(&self.backend),
            VotingDetail::from_summary(summary),
            self.identity.clone(),
            self.epoch,
            self.poll_interval,
            true,
        ));
        services.insert(summary.id.clone(), Arc::clone(&service));
        service
    }

    /// Same as [`bind`](Self::bind) for a voting loaded outside the list
    pub fn bind_detail(&self, detail: VotingDetail) -> Arc<VotingService> {
        let mut services = self.services.lock();
        if let Some(service) = services.get(&detail.id) {
            return Arc::clone(service);
        }

        let id = detail.id.clone();
        let service = Arc::new(spawn_voting(
            Arc::clone(&self.backend),
            detail,
            self.identity.clone(),
            self.epoch,
            self.poll_interval,
            false,
        ));
        services.insert(id, Arc::clone(&service));
        service
    }

    pub fn get(&self, reference: &VotingRef) -> Option<Arc<VotingService>> {
        self.services.lock().get(reference.id()).cloned()
    }

    /// Stops the machine of a view that went away; returns whether one was bound
    pub fn release(&self, reference: &VotingRef) -> bool {
        match self.services.lock().remove(reference.id()) {
            Some(service) => {
                service.stop();
                true
            }
            None => false,
        }
    }

    pub fn release_all(&self) {
        for (_, service) in self.services.lock().drain() {
            service.stop();
        }
    }

    pub fn len(&self) -> usize {
        self.services.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for VotingRegistry {
    fn drop(&mut self) {
        self.release_all();
    }
}
