//! Domain Layer - Core Entity Trait
//!
//! Every stored record has a string identifier and an owning user
//! (or none, for shared records such as global categories).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::user::UserId;

/// Core trait for all domain entities
pub trait Entity: Sized + Send + Sync + Clone {
    /// Returns the entity's unique identifier
    fn id(&self) -> &str;

    /// Owning user, `None` for records shared by everyone
    fn owner(&self) -> Option<&UserId>;

    /// Whether `user` owns this entity
    fn is_owned_by(&self, user: &UserId) -> bool {
        self.owner() == Some(user)
    }
}

/// Common result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level validation errors
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum DomainError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Generate a fresh record identifier
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
