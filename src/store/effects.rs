//! Effect Runner
//!
//! Executes the side effects a transition asked for. Storage failures are
//! logged and never reach the caller.

use crate::repository::SnapshotRepository;

use super::reducer::Effect;
use super::state::AppState;

#[derive(Clone)]
pub struct EffectRunner {
    snapshots: SnapshotRepository,
}

impl EffectRunner {
    pub fn new(snapshots: SnapshotRepository) -> Self {
        Self { snapshots }
    }

    pub fn snapshots(&self) -> &SnapshotRepository {
        &self.snapshots
    }

    pub async fn run(&self, state: &AppState, effects: &[Effect]) {
        for effect in effects {
            match effect {
                Effect::Persist => {
                    if state.user_id.is_absent() {
                        continue;
                    }
                    if let Err(e) = self.snapshots.save(&state.user_id, state).await {
                        tracing::error!(user_id = %state.user_id, error = %e, "failed to persist state");
                    }
                }
                Effect::Evict(user_id) => {
                    if let Err(e) = self.snapshots.evict(user_id).await {
                        tracing::error!(%user_id, error = %e, "failed to evict snapshot");
                    } else {
                        tracing::info!(%user_id, "evicted snapshot");
                    }
                }
                Effect::RememberUser(user_id) => {
                    if let Err(e) = self.snapshots.set_last_active_user(user_id).await {
                        tracing::error!(%user_id, error = %e, "failed to record last active user");
                    }
                }
            }
        }
    }
}
