//! Remote Sync Gate
//!
//! Pulls server data for an authenticated user while the store is loading.

use crate::remote::RemoteApi;
use crate::store::{Action, Store};

/// What a gate run ended with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The store was not waiting for data
    Idle,
    /// Anonymous user; loading cleared without a request
    Local,
    /// Remote data applied
    Synced,
    /// Remote data arrived for a user that is no longer active
    Stale,
    /// The request failed; existing data kept
    Failed,
}

pub struct RemoteSyncGate;

impl RemoteSyncGate {
    pub async fn run(store: &Store, remote: &dyn RemoteApi) -> SyncOutcome {
        let (user_id, is_loading) = {
            let state = store.state().await;
            (state.user_id, state.is_loading)
        };
        if !is_loading {
            return SyncOutcome::Idle;
        }

        if !user_id.is_authenticated() {
            store.dispatch(Action::SetLoading(false)).await;
            return SyncOutcome::Local;
        }

        tracing::info!(%user_id, "fetching remote snapshot");
        match remote.fetch_snapshot().await {
            Ok(data) => {
                // Tagged with the requesting user; dropped if the session moved on
                if store.dispatch(Action::LoadRemoteSnapshot { user_id, data }).await {
                    SyncOutcome::Synced
                } else {
                    SyncOutcome::Stale
                }
            }
            Err(e) => {
                tracing::error!(%user_id, error = %e, "remote fetch failed");
                store.dispatch(Action::SetLoading(false)).await;
                SyncOutcome::Failed
            }
        }
    }
}
