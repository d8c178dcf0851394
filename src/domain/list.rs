//! Shopping List Entity
//!
//! A named collection of items with an optional budget.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::category::UNCATEGORIZED_ID;
use super::entity::{new_id, DomainError, DomainResult, Entity};
use super::user::UserId;

/// A shopping list owned by one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingList {
    pub id: String,
    #[serde(alias = "user_id")]
    pub user_id: UserId,
    pub name: String,
    /// Spending limit, 0 = unset
    #[serde(default, alias = "budget_limit")]
    pub budget_limit: f64,
    /// Prefills the category of new items
    #[serde(default = "default_category", alias = "default_category")]
    pub default_category: String,
    #[serde(default = "Utc::now", alias = "created_at")]
    pub created_at: DateTime<Utc>,
}

fn default_category() -> String {
    UNCATEGORIZED_ID.to_string()
}

impl ShoppingList {
    pub fn new(user_id: UserId, name: impl Into<String>, budget_limit: f64) -> Self {
        Self {
            id: new_id(),
            user_id,
            name: name.into(),
            budget_limit,
            default_category: default_category(),
            created_at: Utc::now(),
        }
    }

    pub fn with_default_category(mut self, category_id: impl Into<String>) -> Self {
        self.default_category = category_id.into();
        self
    }

    pub fn has_budget(&self) -> bool {
        self.budget_limit > 0.0
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidInput("list name cannot be empty".to_string()));
        }
        if !self.budget_limit.is_finite() || self.budget_limit < 0.0 {
            return Err(DomainError::InvalidInput(format!(
                "budget must be a non-negative number, got {}",
                self.budget_limit
            )));
        }
        Ok(())
    }
}

impl Entity for ShoppingList {
    fn id(&self) -> &str {
        &self.id
    }

    fn owner(&self) -> Option<&UserId> {
        Some(&self.user_id)
    }
}
