//! Remote API Client
//!
//! Bindings to the PHP backend. The session lives in a cookie, so one
//! client (with its cookie jar) is shared by all calls.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::domain::UserId;
use crate::store::RemoteSnapshot;

use super::models::{
    AuthReply, AuthUser, Envelope, LoginRequest, PreferencesRequest, RegisterRequest, RemoteData,
    SessionStatus,
};
use super::{RemoteError, RemoteResult};

/// Operations the store needs from the backend
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Lists, items, categories and preferences of the session's user
    async fn fetch_snapshot(&self) -> RemoteResult<RemoteSnapshot>;

    async fn session_status(&self) -> RemoteResult<SessionStatus>;

    async fn login(&self, email: &str, password: &str) -> RemoteResult<AuthUser>;

    async fn register(&self, name: &str, email: &str, password: &str) -> RemoteResult<AuthUser>;

    async fn logout(&self) -> RemoteResult<()>;

    async fn update_preferences(&self, user_id: &UserId, currency_code: &str) -> RemoteResult<()>;
}

/// reqwest implementation of [`RemoteApi`]
#[derive(Clone)]
pub struct HttpRemoteApi {
    client: Client,
    base_url: Url,
}

impl HttpRemoteApi {
    pub fn new(base_url: &str, timeout: Duration) -> RemoteResult<Self> {
        // Url::join drops the last segment unless the base ends with '/'
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized).map_err(|e| RemoteError::InvalidUrl(e.to_string()))?;
        let client = Client::builder().cookie_store(true).timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> RemoteResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| RemoteError::InvalidUrl(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> RemoteResult<T> {
        let url = self.endpoint(path)?;
        tracing::debug!(%url, "GET");
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.json::<T>().await?)
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> RemoteResult<T> {
        let url = self.endpoint(path)?;
        tracing::debug!(%url, "POST");
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<T>().await?)
    }

    fn auth_user(reply: AuthReply) -> RemoteResult<AuthUser> {
        if !reply.success {
            return Err(RemoteError::Rejected(
                reply.message.unwrap_or_else(|| "authentication failed".to_string()),
            ));
        }
        reply.user.ok_or(RemoteError::MissingData)
    }
}

#[async_trait]
impl RemoteApi for HttpRemoteApi {
    async fn fetch_snapshot(&self) -> RemoteResult<RemoteSnapshot> {
        let envelope: Envelope<RemoteData> = self.get_json("data/index.php").await?;
        Ok(envelope.into_data()?.into())
    }

    async fn session_status(&self) -> RemoteResult<SessionStatus> {
        self.get_json("auth/session_status.php").await
    }

    async fn login(&self, email: &str, password: &str) -> RemoteResult<AuthUser> {
        let reply: AuthReply = self
            .post_json("auth/login.php", &LoginRequest { email, password })
            .await?;
        Self::auth_user(reply)
    }

    async fn register(&self, name: &str, email: &str, password: &str) -> RemoteResult<AuthUser> {
        let reply: AuthReply = self
            .post_json("auth/register.php", &RegisterRequest { name, email, password })
            .await?;
        Self::auth_user(reply)
    }

    async fn logout(&self) -> RemoteResult<()> {
        let envelope: Envelope<Value> = self.post_json("auth/logout.php", &serde_json::json!({})).await?;
        envelope.into_unit()
    }

    async fn update_preferences(&self, user_id: &UserId, currency_code: &str) -> RemoteResult<()> {
        let body = PreferencesRequest {
            currency_code,
            user_id: user_id.as_str(),
        };
        let envelope: Envelope<Value> = self.post_json("user/preferences.php", &body).await?;
        envelope.into_unit()
    }
}
