//! Remote Collaborators
//!
//! HTTP bindings to the backend API and the category suggestion service.

mod api;
mod models;
mod suggest;

use thiserror::Error;

pub use api::{HttpRemoteApi, RemoteApi};
pub use models::{AuthUser, SessionStatus};
pub use suggest::{resolve_suggestion, suggest_category, CategoryOption, CategorySuggester, HttpCategorySuggester};

pub type RemoteResult<T> = Result<T, RemoteError>;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Server rejected request: {0}")]
    Rejected(String),
    #[error("Response carried no data")]
    MissingData,
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
