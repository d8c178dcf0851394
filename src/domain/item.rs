//! Shopping List Item Entity
//!
//! A purchasable entry on a list with price, quantity and category.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{new_id, DomainError, DomainResult, Entity};
use super::user::UserId;

/// A purchasable entry
///
/// `date_added` doubles as the purchase time: toggling the checked flag
/// re-stamps it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingListItem {
    pub id: String,
    #[serde(alias = "list_id")]
    pub list_id: String,
    #[serde(alias = "user_id")]
    pub user_id: UserId,
    pub name: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Unit price
    #[serde(default)]
    pub price: f64,
    pub category: String,
    #[serde(default)]
    pub checked: bool,
    #[serde(default = "Utc::now", alias = "date_added")]
    pub date_added: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

fn default_quantity() -> u32 {
    1
}

impl ShoppingListItem {
    pub fn new(
        user_id: UserId,
        list_id: impl Into<String>,
        name: impl Into<String>,
        quantity: u32,
        price: f64,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            list_id: list_id.into(),
            user_id,
            name: name.into(),
            quantity,
            price,
            category: category.into(),
            checked: false,
            date_added: Utc::now(),
            notes: None,
        }
    }

    /// Unit price times quantity
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidInput("item name cannot be empty".to_string()));
        }
        if self.quantity == 0 {
            return Err(DomainError::InvalidInput("quantity must be at least 1".to_string()));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(DomainError::InvalidInput(format!(
                "price must be a non-negative number, got {}",
                self.price
            )));
        }
        Ok(())
    }
}

impl Entity for ShoppingListItem {
    fn id(&self) -> &str {
        &self.id
    }

    fn owner(&self) -> Option<&UserId> {
        Some(&self.user_id)
    }
}
