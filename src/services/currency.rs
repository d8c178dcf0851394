//! Currency Resolution
//!
//! Best-effort detection of the user's currency: device position, then
//! reverse geocoding to a country, then the country table; failing that an
//! IP lookup. Every step is time-bounded and any failure falls through to
//! the next strategy. `None` means the caller should use its default.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::domain::Currency;

#[derive(Debug, Error)]
pub enum LocateError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("location unavailable: {0}")]
    Unavailable(String),
    #[error("lookup failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Device positioning (GPS, platform location service)
#[async_trait]
pub trait GeoLocator: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates, LocateError>;
}

/// Coordinates to ISO country code
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn country_code(&self, at: Coordinates) -> Result<String, LocateError>;
}

/// Country of the caller's public IP
#[async_trait]
pub trait IpLocator: Send + Sync {
    async fn country_code(&self) -> Result<String, LocateError>;
}

#[derive(Clone)]
pub struct CurrencyResolver {
    device: Option<Arc<dyn GeoLocator>>,
    geocoder: Option<Arc<dyn ReverseGeocoder>>,
    ip: Option<Arc<dyn IpLocator>>,
    step_timeout: Duration,
}

impl CurrencyResolver {
    pub fn new(step_timeout: Duration) -> Self {
        Self {
            device: None,
            geocoder: None,
            ip: None,
            step_timeout,
        }
    }

    pub fn with_device(mut self, locator: Arc<dyn GeoLocator>, geocoder: Arc<dyn ReverseGeocoder>) -> Self {
        self.device = Some(locator);
        self.geocoder = Some(geocoder);
        self
    }

    pub fn with_ip(mut self, locator: Arc<dyn IpLocator>) -> Self {
        self.ip = Some(locator);
        self
    }

    pub async fn resolve(&self) -> Option<Currency> {
        if let Some(currency) = self.from_device().await {
            return Some(currency);
        }
        if let Some(currency) = self.from_ip().await {
            return Some(currency);
        }
        tracing::info!("currency detection found nothing");
        None
    }

    async fn bounded<T, F>(&self, step: &'static str, fut: F) -> Option<T>
    where
        F: Future<Output = Result<T, LocateError>>,
    {
        match tokio::time::timeout(self.step_timeout, fut).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                tracing::debug!(step, error = %e, "currency detection step failed");
                None
            }
            Err(_) => {
                tracing::debug!(step, "currency detection step timed out");
                None
            }
        }
    }

    async fn from_device(&self) -> Option<Currency> {
        let (device, geocoder) = (self.device.as_ref()?, self.geocoder.as_ref()?);
        let position = self.bounded("device_position", device.current_position()).await?;
        let country = self.bounded("reverse_geocode", geocoder.country_code(position)).await?;
        currency_for(&country)
    }

    async fn from_ip(&self) -> Option<Currency> {
        let ip = self.ip.as_ref()?;
        let country = self.bounded("ip_lookup", ip.country_code()).await?;
        currency_for(&country)
    }
}

fn currency_for(country: &str) -> Option<Currency> {
    let currency = Currency::for_country(country);
    if currency.is_none() {
        tracing::debug!(country, "no currency for country");
    }
    currency
}

const REVERSE_GEOCODE_URL: &str = "https://api.bigdatacloud.net/data/reverse-geocode-client";
const IP_LOOKUP_URL: &str = "https://ipapi.co/json/";

#[derive(Deserialize)]
struct CountryReply {
    #[serde(default, rename = "countryCode", alias = "country_code")]
    country_code: Option<String>,
    #[serde(default)]
    country: Option<String>,
}

impl CountryReply {
    fn into_code(self) -> Result<String, LocateError> {
        self.country_code
            .or(self.country)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| LocateError::Unavailable("no country in reply".to_string()))
    }
}

/// Reverse geocoding over HTTP
pub struct HttpReverseGeocoder {
    client: Client,
    url: String,
}

impl HttpReverseGeocoder {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            url: REVERSE_GEOCODE_URL.to_string(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[async_trait]
impl ReverseGeocoder for HttpReverseGeocoder {
    async fn country_code(&self, at: Coordinates) -> Result<String, LocateError> {
        let url = Url::parse_with_params(
            &self.url,
            &[
                ("latitude", at.latitude.to_string()),
                ("longitude", at.longitude.to_string()),
                ("localityLanguage", "en".to_string()),
            ],
        )
        .map_err(|e| LocateError::Unavailable(e.to_string()))?;

        let reply: CountryReply = self.client.get(url).send().await?.error_for_status()?.json().await?;
        reply.into_code()
    }
}

/// IP geolocation over HTTP
pub struct HttpIpLocator {
    client: Client,
    url: String,
}

impl HttpIpLocator {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            url: IP_LOOKUP_URL.to_string(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[async_trait]
impl IpLocator for HttpIpLocator {
    async fn country_code(&self) -> Result<String, LocateError> {
        let reply: CountryReply = self
            .client
            .get(self.url.as_str())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        reply.into_code()
    }
}
