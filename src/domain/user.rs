//! User Identity
//!
//! Users are either server-issued (authenticated) or locally minted
//! anonymous placeholders prefixed with `anon_`.

use serde::{Deserialize, Serialize};

pub const ANONYMOUS_PREFIX: &str = "anon_";

/// Identifier of the user that owns state
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a fresh anonymous identity
    pub fn new_anonymous() -> Self {
        Self(format!("{}{}", ANONYMOUS_PREFIX, uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_anonymous(&self) -> bool {
        self.0.starts_with(ANONYMOUS_PREFIX)
    }

    /// No identity assigned yet
    pub fn is_absent(&self) -> bool {
        self.0.is_empty()
    }

    /// A server-issued identity
    pub fn is_authenticated(&self) -> bool {
        !self.is_absent() && !self.is_anonymous()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
