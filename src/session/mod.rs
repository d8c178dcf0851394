//! Session Layer
//!
//! Keeps the store's identity in step with authentication and the server:
//! the bridge reconciles auth signals, the sync gate pulls remote data and
//! the coordinator orders both behind the local bootstrap.

mod bridge;
mod coordinator;
mod sync_gate;


pub use bridge::{reconcile, AuthState, SessionStep};
pub use coordinator::{Coordinator, CoordinatorError, CoordinatorResult, Phase};
pub use sync_gate::{RemoteSyncGate, SyncOutcome};
