//! Category Suggestion
//!
//! Asks an external service which category fits an item name. Whatever
//! comes back is checked against the categories that were offered.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::{Category, UNCATEGORIZED_ID};

use super::{RemoteError, RemoteResult};

/// A category as offered to the suggester
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryOption {
    pub id: String,
    pub name: String,
}

impl From<&Category> for CategoryOption {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id.clone(),
            name: category.name.clone(),
        }
    }
}

#[async_trait]
pub trait CategorySuggester: Send + Sync {
    /// Raw suggestion; may be empty or not one of `available`
    async fn suggest(&self, item_name: &str, available: &[CategoryOption]) -> RemoteResult<String>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SuggestRequest<'a> {
    item_name: &'a str,
    available_categories: &'a [CategoryOption],
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SuggestReply {
    #[serde(default)]
    suggested_category_id: String,
}

pub struct HttpCategorySuggester {
    client: Client,
    url: Url,
}

impl HttpCategorySuggester {
    pub fn new(url: &str, timeout: Duration) -> RemoteResult<Self> {
        let url = Url::parse(url).map_err(|e| RemoteError::InvalidUrl(e.to_string()))?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl CategorySuggester for HttpCategorySuggester {
    async fn suggest(&self, item_name: &str, available: &[CategoryOption]) -> RemoteResult<String> {
        let reply: SuggestReply = self
            .client
            .post(self.url.clone())
            .json(&SuggestRequest {
                item_name,
                available_categories: available,
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(reply.suggested_category_id)
    }
}

/// `suggested` if it was offered, else `uncategorized`, else the first
/// offered id. `None` only when nothing was offered.
pub fn resolve_suggestion(suggested: &str, available: &[CategoryOption]) -> Option<String> {
    let suggested = suggested.trim();
    if !suggested.is_empty() && available.iter().any(|c| c.id == suggested) {
        return Some(suggested.to_string());
    }
    available
        .iter()
        .find(|c| c.id == UNCATEGORIZED_ID)
        .or_else(|| available.first())
        .map(|c| c.id.clone())
}

/// Suggest a category id for `item_name` among `categories`, falling back
/// locally when the service fails or answers with an unknown id.
pub async fn suggest_category(
    suggester: &dyn CategorySuggester,
    item_name: &str,
    categories: &[Category],
) -> Option<String> {
    let available: Vec<CategoryOption> = categories.iter().map(CategoryOption::from).collect();
    if item_name.trim().is_empty() {
        return resolve_suggestion("", &available);
    }

    let suggested = match suggester.suggest(item_name, &available).await {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(item_name, error = %e, "category suggestion failed");
            String::new()
        }
    };
    resolve_suggestion(&suggested, &available)
}
