//! Domain Layer
//!
//! Contains all domain entities and core abstractions.
//! This layer has no I/O; it only depends on serde, chrono and uuid.

mod entity;
mod user;
mod list;
mod item;
mod category;
mod currency;
mod theme;

pub use entity::{new_id, Entity, DomainError, DomainResult};
pub use user::{UserId, ANONYMOUS_PREFIX};
pub use list::ShoppingList;
pub use item::ShoppingListItem;
pub use category::{merge_with_defaults, Category, UNCATEGORIZED_ID};
pub use currency::Currency;
pub use theme::Theme;
