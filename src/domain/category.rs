//! Category Entity
//!
//! Categories label items. Global categories (no owner) are shared by all
//! users; `uncategorized` is global and can never be removed.

use serde::{Deserialize, Serialize};

use super::entity::{new_id, DomainError, DomainResult, Entity};
use super::user::UserId;

/// Id of the category that always exists
pub const UNCATEGORIZED_ID: &str = "uncategorized";

const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    (UNCATEGORIZED_ID, "Uncategorized"),
    ("produce", "Fruits & Vegetables"),
    ("dairy", "Dairy & Eggs"),
    ("meat", "Meat & Seafood"),
    ("bakery", "Bakery"),
    ("pantry", "Pantry"),
    ("frozen", "Frozen Foods"),
    ("beverages", "Beverages"),
    ("household", "Household"),
    ("personal_care", "Personal Care"),
];

/// A label for items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    /// `None` = global
    #[serde(default, alias = "user_id")]
    pub user_id: Option<UserId>,
}

impl Category {
    pub fn global(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            user_id: None,
        }
    }

    pub fn custom(user_id: UserId, name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            user_id: Some(user_id),
        }
    }

    /// The global set every user starts with
    pub fn defaults() -> Vec<Category> {
        DEFAULT_CATEGORIES
            .iter()
            .map(|(id, name)| Category::global(*id, *name))
            .collect()
    }

    pub fn is_global(&self) -> bool {
        self.user_id.is_none()
    }

    pub fn is_uncategorized(&self) -> bool {
        self.id == UNCATEGORIZED_ID
    }

    /// Visible to `user`: global or owned by them
    pub fn is_visible_to(&self, user: &UserId) -> bool {
        self.is_global() || self.is_owned_by(user)
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidInput("category name cannot be empty".to_string()));
        }
        Ok(())
    }
}

impl Entity for Category {
    fn id(&self) -> &str {
        &self.id
    }

    fn owner(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }
}

/// Merge `loaded` over the defaults: defaults first in their own order,
/// a loaded entry replaces the default with the same id, remaining loaded
/// entries are appended in their order.
pub fn merge_with_defaults(loaded: &[Category]) -> Vec<Category> {
    let mut merged: Vec<Category> = Category::defaults()
        .into_iter()
        .map(|default| {
            loaded
                .iter()
                .find(|c| c.id == default.id)
                .cloned()
                .unwrap_or(default)
        })
        .collect();

    for category in loaded {
        if !merged.iter().any(|c| c.id == category.id) {
            merged.push(category.clone());
        }
    }

    // `uncategorized` stays global whatever the payload said
    if let Some(uncategorized) = merged.iter_mut().find(|c| c.is_uncategorized()) {
        uncategorized.user_id = None;
    }
    merged
}
