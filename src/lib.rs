pub mod backend;
pub mod config;
pub mod errors;
pub mod list;
pub mod machine;
pub mod utils;
pub mod voting;

// Re-export commonly used items
pub use backend::{BackendError, BackendErrorKind, HttpBackend, MemoryBackend, VotingBackend};
pub use config::{Network, OraclesConfig};
pub use errors::{OraclesError, VotingError};
pub use list::{
    spawn_list, ListEvent, ListSegment, ListState, VotingFilter, VotingListMachine,
    VotingListService,
};
pub use machine::{Machine, Notification, Service, Snapshot, Transition};
pub use voting::{
    spawn_voting, IdentitySnapshot, EpochSnapshot, VoteOption, VotingDetail, VotingEvent,
    VotingId, VotingMachine, VotingRegistry, VotingService, VotingState, VotingStatus,
    VotingSummary,
};
