//! Application State
//!
//! The aggregate root held by the store, and its persisted form.

use serde::{Deserialize, Serialize};

use crate::domain::{
    Category, Currency, Entity, ShoppingList, ShoppingListItem, Theme, UserId,
};

/// Freemium limits and category edit policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    pub max_free_lists: usize,
    pub max_free_categories: usize,
    /// Premium users may edit and delete global categories
    pub premium_edits_global_categories: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            max_free_lists: 3,
            max_free_categories: 5,
            premium_edits_global_categories: true,
        }
    }
}

/// Global application state
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub user_id: UserId,
    pub currency: Currency,
    /// Insertion order
    pub lists: Vec<ShoppingList>,
    pub selected_list_id: Option<String>,
    pub shopping_list_items: Vec<ShoppingListItem>,
    /// Global defaults merged with the user's own
    pub categories: Vec<Category>,
    /// Transient, never persisted
    pub is_loading: bool,
    pub is_premium: bool,
    pub theme: Theme,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            user_id: UserId::default(),
            currency: Currency::default(),
            lists: Vec::new(),
            selected_list_id: None,
            shopping_list_items: Vec::new(),
            categories: Category::defaults(),
            is_loading: true,
            is_premium: false,
            theme: Theme::default(),
        }
    }
}

impl AppState {
    /// Empty state for `user_id` carrying over display preferences
    pub fn fresh(user_id: UserId, currency: Currency, theme: Theme) -> Self {
        Self {
            user_id,
            currency,
            theme,
            is_loading: false,
            ..Default::default()
        }
    }

    pub fn owned_lists(&self) -> impl Iterator<Item = &ShoppingList> {
        self.lists.iter().filter(|l| l.user_id == self.user_id)
    }

    pub fn owned_list_count(&self) -> usize {
        self.owned_lists().count()
    }

    pub fn owned_category_count(&self) -> usize {
        self.categories
            .iter()
            .filter(|c| c.is_owned_by(&self.user_id))
            .count()
    }

    pub fn find_list(&self, list_id: &str) -> Option<&ShoppingList> {
        self.lists.iter().find(|l| l.id == list_id)
    }

    pub fn find_item(&self, item_id: &str) -> Option<&ShoppingListItem> {
        self.shopping_list_items.iter().find(|i| i.id == item_id)
    }

    pub fn find_category(&self, category_id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == category_id)
    }

    pub fn selected_list(&self) -> Option<&ShoppingList> {
        self.selected_list_id.as_deref().and_then(|id| self.find_list(id))
    }

    /// The current user's items on `list_id`, in insertion order
    pub fn items_for_list<'a>(&'a self, list_id: &'a str) -> impl Iterator<Item = &'a ShoppingListItem> {
        self.shopping_list_items
            .iter()
            .filter(move |i| i.list_id == list_id && i.user_id == self.user_id)
    }
}

/// Keep `preferred` if it names a list owned by `user`, else fall back to
/// the user's first list, else nothing.
pub fn resolve_selection(lists: &[ShoppingList], user: &UserId, preferred: Option<&str>) -> Option<String> {
    let owned = |id: &str| lists.iter().any(|l| l.id == id && &l.user_id == user);
    match preferred {
        Some(id) if owned(id) => Some(id.to_string()),
        _ => lists.iter().find(|l| &l.user_id == user).map(|l| l.id.clone()),
    }
}

/// Persisted subset of `AppState` (everything but the loading flag).
///
/// Every field is optional on the way in so that older or partial payloads
/// still load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub user_id: Option<UserId>,
    pub currency: Option<Currency>,
    pub lists: Vec<ShoppingList>,
    pub selected_list_id: Option<String>,
    pub shopping_list_items: Vec<ShoppingListItem>,
    pub categories: Vec<Category>,
    pub is_premium: bool,
    pub theme: Option<Theme>,
}

impl From<&AppState> for Snapshot {
    fn from(state: &AppState) -> Self {
        Self {
            user_id: Some(state.user_id.clone()),
            currency: Some(state.currency.clone()),
            lists: state.lists.clone(),
            selected_list_id: state.selected_list_id.clone(),
            shopping_list_items: state.shopping_list_items.clone(),
            categories: state.categories.clone(),
            is_premium: state.is_premium,
            theme: Some(state.theme.clone()),
        }
    }
}

impl Snapshot {
    /// Rebuild a state as stored, with the loading flag cleared
    pub fn into_state(self) -> AppState {
        AppState {
            user_id: self.user_id.unwrap_or_default(),
            currency: self.currency.unwrap_or_default(),
            lists: self.lists,
            selected_list_id: self.selected_list_id,
            shopping_list_items: self.shopping_list_items,
            categories: self.categories,
            is_loading: false,
            is_premium: self.is_premium,
            theme: self.theme.unwrap_or_default(),
        }
    }
}
