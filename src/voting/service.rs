use std::sync::Arc;
use std::time::Duration;

use log::info;

use super::machine::{VotingContext, VotingEffect, VotingEvent, VotingMachine};
use super::{Address, EpochSnapshot, IdentitySnapshot, VotingDetail, VotingId};
use crate::backend::VotingBackend;
use crate::machine::{EffectHandler, EventSender, Service, ServiceOptions};

pub type VotingService = Service<VotingMachine>;

/// Runs the backend calls of one voting on behalf of one identity
pub struct VotingEffectHandler {
    backend: Arc<dyn VotingBackend>,
    id: VotingId,
    from: Address,
}

impl VotingEffectHandler {
    pub fn new(backend: Arc<dyn VotingBackend>, id: VotingId, from: Address) -> Self {
        Self { backend, id, from }
    }
}

impl EffectHandler<VotingMachine> for VotingEffectHandler {
    fn execute(&self, effect: VotingEffect, events: EventSender<VotingMachine>) {
        let backend = Arc::clone(&self.backend);
        let id = self.id.clone();
        let from = self.from.clone();

        tokio::spawn(async move {
            let submitted = match effect {
                VotingEffect::Reload => {
                    let event = match backend.fetch_voting(&id).await {
                        Ok(record) => VotingEvent::Loaded(record),
                        Err(error) => VotingEvent::LoadFailed(error),
                    };
                    events.send(event);
                    return;
                }
                VotingEffect::SubmitLaunch => backend.start_voting(&id, &from).await,
                VotingEffect::SubmitFund { amount } => backend.add_fund(&id, &from, amount).await,
                VotingEffect::SubmitVote { option, deposit } => {
                    backend.cast_vote(&id, &from, option, deposit).await
                }
            };

            let event = match submitted {
                Ok(tx_hash) => {
                    info!("Voting {}: transaction {} confirmed", id, tx_hash);
                    VotingEvent::TxConfirmed
                }
                Err(error) => VotingEvent::TxFailed(error),
            };
            events.send(event);
        });
    }
}

/// Starts a voting machine idle in the detail's status.
///
/// With `reload` set, the full record is fetched right away; `poll_interval`
/// keeps refreshing it for as long as the service lives.
pub fn spawn_voting(
    backend: Arc<dyn VotingBackend>,
    detail: VotingDetail,
    identity: IdentitySnapshot,
    epoch: EpochSnapshot,
    poll_interval: Option<Duration>,
    reload: bool,
) -> VotingService {
    let handler = VotingEffectHandler::new(backend, detail.id.clone(), identity.address.clone());
    let context = VotingContext::new(detail, identity, epoch);
    let initial = if reload {
        vec![VotingEvent::Refresh]
    } else {
        Vec::new()
    };
    Service::spawn(
        context.initial_state(),
        context,
        handler,
        initial,
        ServiceOptions {
            poll_interval,
            ..ServiceOptions::default()
        },
    )
}
