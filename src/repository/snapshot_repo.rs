//! Snapshot Repository
//!
//! Stores one JSON snapshot per user under `<prefix>_<userId>` and the last
//! active user under `<prefix>_lastActiveUser`.

use std::sync::Arc;

use crate::domain::{UserId, ANONYMOUS_PREFIX};
use crate::store::{AppState, Snapshot};

use super::traits::{KeyValueStore, StorageResult};

const LAST_ACTIVE_USER: &str = "lastActiveUser";

#[derive(Clone)]
pub struct SnapshotRepository {
    kv: Arc<dyn KeyValueStore>,
    prefix: String,
}

impl SnapshotRepository {
    pub fn new(kv: Arc<dyn KeyValueStore>, prefix: impl Into<String>) -> Self {
        Self {
            kv,
            prefix: prefix.into(),
        }
    }

    pub fn state_key(&self, user_id: &UserId) -> String {
        format!("{}_{}", self.prefix, user_id)
    }

    fn last_active_key(&self) -> String {
        format!("{}_{}", self.prefix, LAST_ACTIVE_USER)
    }

    /// Serialize `state` (minus the loading flag) under the user's key
    pub async fn save(&self, user_id: &UserId, state: &AppState) -> StorageResult<()> {
        let json = serde_json::to_string(&Snapshot::from(state))?;
        self.kv.set(&self.state_key(user_id), &json).await
    }

    /// Stored snapshot for `user_id`. Unreadable or malformed payloads are
    /// logged and reported as absent.
    pub async fn load(&self, user_id: &UserId) -> Option<Snapshot> {
        let key = self.state_key(user_id);
        let raw = match self.kv.get(&key).await {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(%key, error = %e, "failed to read snapshot");
                return None;
            }
        };

        match serde_json::from_str::<Snapshot>(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(%key, error = %e, "discarding malformed snapshot");
                None
            }
        }
    }

    pub async fn evict(&self, user_id: &UserId) -> StorageResult<()> {
        self.kv.remove(&self.state_key(user_id)).await
    }

    pub async fn last_active_user(&self) -> Option<UserId> {
        match self.kv.get(&self.last_active_key()).await {
            Ok(Some(id)) if !id.trim().is_empty() => Some(UserId::new(id.trim())),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read last active user");
                None
            }
        }
    }

    pub async fn set_last_active_user(&self, user_id: &UserId) -> StorageResult<()> {
        self.kv.set(&self.last_active_key(), user_id.as_str()).await
    }

    /// Drop every anonymous snapshot except `keep`'s. Anonymous identities
    /// are never resumed once replaced, so their snapshots are unreachable.
    /// Returns the evicted users.
    pub async fn prune_anonymous(&self, keep: &UserId) -> StorageResult<Vec<UserId>> {
        let key_prefix = format!("{}_", self.prefix);
        let keys = self
            .kv
            .keys_with_prefix(&format!("{}{}", key_prefix, ANONYMOUS_PREFIX))
            .await?;

        let mut pruned = Vec::new();
        for key in keys {
            let Some(user_id) = key.strip_prefix(&key_prefix).map(UserId::from) else {
                continue;
            };
            if user_id == *keep {
                continue;
            }
            self.kv.remove(&key).await?;
            pruned.push(user_id);
        }
        Ok(pruned)
    }
}
