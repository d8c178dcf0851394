//! Store Actions
//!
//! Every mutation names the acting user; the reducer drops actions whose
//! user does not match the store's current user.

use chrono::{DateTime, Utc};

use crate::domain::{Category, Currency, ShoppingList, ShoppingListItem, Theme, UserId};

use super::state::Snapshot;

/// Preferences delivered with a remote snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemotePreferences {
    pub currency: Option<Currency>,
    pub is_premium: Option<bool>,
}

/// Server-side data for one authenticated user
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteSnapshot {
    pub lists: Vec<ShoppingList>,
    pub items: Vec<ShoppingListItem>,
    pub categories: Vec<Category>,
    pub preferences: RemotePreferences,
}

/// Actions accepted by [`reduce`](super::reduce)
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Replace state with a locally persisted snapshot
    LoadSnapshot { user_id: UserId, snapshot: Snapshot },
    /// Overlay server data for the user the fetch was issued for
    LoadRemoteSnapshot { user_id: UserId, data: RemoteSnapshot },
    /// The authenticated identity changed (or its premium flag)
    SetUserContext { user_id: UserId, is_premium: bool },
    SetLoading(bool),

    AddList { user_id: UserId, list: ShoppingList },
    UpdateList { user_id: UserId, list: ShoppingList },
    DeleteList { user_id: UserId, list_id: String },
    /// `None` deselects
    SelectList { user_id: UserId, list_id: Option<String> },

    AddItem { user_id: UserId, item: ShoppingListItem },
    UpdateItem { user_id: UserId, item: ShoppingListItem },
    RemoveItem { user_id: UserId, item_id: String },
    /// Flips `checked` and stamps `date_added` with `at`
    ToggleItem { user_id: UserId, item_id: String, at: DateTime<Utc> },
    /// Drop purchased items from a list
    ClearCheckedItems { user_id: UserId, list_id: String },

    AddCategory { user_id: UserId, category: Category },
    UpdateCategory { user_id: UserId, category: Category },
    /// Affected items and lists move to `reassign_to` (default `uncategorized`)
    RemoveCategory {
        user_id: UserId,
        category_id: String,
        reassign_to: Option<String>,
    },

    SetCurrency(Currency),
    SetTheme(Theme),

    /// Switch to a fresh anonymous identity, keeping currency and theme
    ResetForLogout { new_user_id: UserId },
}

impl Action {
    /// Stable name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Action::LoadSnapshot { .. } => "load_snapshot",
            Action::LoadRemoteSnapshot { .. } => "load_remote_snapshot",
            Action::SetUserContext { .. } => "set_user_context",
            Action::SetLoading(_) => "set_loading",
            Action::AddList { .. } => "add_list",
            Action::UpdateList { .. } => "update_list",
            Action::DeleteList { .. } => "delete_list",
            Action::SelectList { .. } => "select_list",
            Action::AddItem { .. } => "add_item",
            Action::UpdateItem { .. } => "update_item",
            Action::RemoveItem { .. } => "remove_item",
            Action::ToggleItem { .. } => "toggle_item",
            Action::ClearCheckedItems { .. } => "clear_checked_items",
            Action::AddCategory { .. } => "add_category",
            Action::UpdateCategory { .. } => "update_category",
            Action::RemoveCategory { .. } => "remove_category",
            Action::SetCurrency(_) => "set_currency",
            Action::SetTheme(_) => "set_theme",
            Action::ResetForLogout { .. } => "reset_for_logout",
        }
    }

    /// Whether the resulting state should be written to local storage
    pub fn persists(&self) -> bool {
        !matches!(self, Action::SetLoading(_))
    }
}
