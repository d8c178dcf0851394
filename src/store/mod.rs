//! Global Application State Store
//!
//! Holds the current [`AppState`], applies actions through the pure
//! reducer, persists through the effect runner and broadcasts every new
//! state to subscribers.

mod action;
mod effects;
mod reducer;
mod state;

#[cfg(test)]
mod tests;

use chrono::Utc;
use tokio::sync::{watch, RwLock};

use crate::domain::{Category, ShoppingList, ShoppingListItem, UserId};
use crate::repository::SnapshotRepository;

pub use action::{Action, RemotePreferences, RemoteSnapshot};
pub use effects::EffectRunner;
pub use reducer::{reduce, Effect, Reduction, Rejection};
pub use state::{resolve_selection, AppState, Policy, Snapshot};

pub struct Store {
    state: RwLock<AppState>,
    policy: Policy,
    effects: EffectRunner,
    updates: watch::Sender<AppState>,
}

impl Store {
    pub fn new(snapshots: SnapshotRepository, policy: Policy) -> Self {
        let initial = AppState::default();
        let (updates, _) = watch::channel(initial.clone());
        Self {
            state: RwLock::new(initial),
            policy,
            effects: EffectRunner::new(snapshots),
            updates,
        }
    }

    /// Copy of the current state
    pub async fn state(&self) -> AppState {
        self.state.read().await.clone()
    }

    pub async fn user_id(&self) -> UserId {
        self.state.read().await.user_id.clone()
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn snapshots(&self) -> &SnapshotRepository {
        self.effects.snapshots()
    }

    /// Receive every state the store settles on
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.updates.subscribe()
    }

    /// Apply `action`. Returns `false` when the reducer rejected it, in
    /// which case the state is untouched.
    pub async fn dispatch(&self, action: Action) -> bool {
        let name = action.name();
        let mut guard = self.state.write().await;

        match reduce(&guard, action, &self.policy) {
            Ok(Reduction { state, effects }) => {
                tracing::debug!(action = name, user_id = %state.user_id, "applied");
                self.effects.run(&state, &effects).await;
                *guard = state.clone();
                self.updates.send_replace(state);
                true
            }
            Err(rejection) => {
                tracing::warn!(action = name, user_id = %guard.user_id, reason = %rejection, "rejected");
                false
            }
        }
    }

    // ========================
    // Convenience dispatchers
    // ========================

    /// Create a list for the current user; returns its id when accepted
    pub async fn add_list(&self, name: &str, budget_limit: f64) -> Option<String> {
        let user_id = self.user_id().await;
        let list = ShoppingList::new(user_id.clone(), name, budget_limit);
        let id = list.id.clone();
        self.dispatch(Action::AddList { user_id, list }).await.then_some(id)
    }

    /// Add an item; `category` defaults to the list's default category
    pub async fn add_item(
        &self,
        list_id: &str,
        name: &str,
        quantity: u32,
        price: f64,
        category: Option<&str>,
    ) -> Option<String> {
        let (user_id, default_category) = {
            let state = self.state.read().await;
            let default_category = state
                .find_list(list_id)
                .map(|l| l.default_category.clone())
                .unwrap_or_else(|| crate::domain::UNCATEGORIZED_ID.to_string());
            (state.user_id.clone(), default_category)
        };
        let category = category.map(str::to_string).unwrap_or(default_category);
        let item = ShoppingListItem::new(user_id.clone(), list_id, name, quantity, price, category);
        let id = item.id.clone();
        self.dispatch(Action::AddItem { user_id, item }).await.then_some(id)
    }

    /// Flip an item's purchased flag, stamping it with the current time
    pub async fn toggle_item(&self, item_id: &str) -> bool {
        let user_id = self.user_id().await;
        self.dispatch(Action::ToggleItem {
            user_id,
            item_id: item_id.to_string(),
            at: Utc::now(),
        })
        .await
    }

    /// Create a custom category for the current user; returns its id
    pub async fn add_category(&self, name: &str) -> Option<String> {
        let user_id = self.user_id().await;
        let category = Category::custom(user_id.clone(), name);
        let id = category.id.clone();
        self.dispatch(Action::AddCategory { user_id, category }).await.then_some(id)
    }

    /// Switch to a fresh anonymous identity
    pub async fn logout(&self) -> bool {
        self.dispatch(Action::ResetForLogout {
            new_user_id: UserId::new_anonymous(),
        })
        .await
    }
}
