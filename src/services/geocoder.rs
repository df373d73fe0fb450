use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::models::Coordinates;

#[derive(Debug, Error)]
pub enum GeocoderError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Geocoder returned error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Turns a free-text address into coordinates
///
/// Lookups never fail the caller: any error is logged and reported as an
/// unresolved address (`None`).
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Option<Coordinates>;
}

#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

/// Nominatim-compatible geocoder with an in-memory result cache
pub struct NominatimGeocoder {
    base_url: String,
    user_agent: String,
    client: Client,
    cache: moka::future::Cache<String, Coordinates>,
}

impl NominatimGeocoder {
    pub fn new(
        base_url: String,
        user_agent: String,
        timeout: Duration,
        cache_size: u64,
        cache_ttl: Duration,
    ) -> Result<Self, GeocoderError> {
        let client = Client::builder().timeout(timeout).build()?;

        let cache = moka::future::CacheBuilder::new(cache_size)
            .time_to_live(cache_ttl)
            .build();

        Ok(Self {
            base_url,
            user_agent,
            client,
            cache,
        })
    }

    async fn lookup(&self, address: &str) -> Result<Option<Coordinates>, GeocoderError> {
        let url = format!("{}/search", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GeocoderError::ApiError(format!(
                "search failed: {}",
                response.status()
            )));
        }

        let places: Vec<Place> = response.json().await?;
        let Some(place) = places.first() else {
            return Ok(None);
        };

        let latitude: f64 = place
            .lat
            .parse()
            .map_err(|_| GeocoderError::InvalidResponse(format!("bad latitude '{}'", place.lat)))?;
        let longitude: f64 = place
            .lon
            .parse()
            .map_err(|_| GeocoderError::InvalidResponse(format!("bad longitude '{}'", place.lon)))?;

        Ok(Some(Coordinates::new(latitude, longitude)))
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> Option<Coordinates> {
        let key = address.trim().to_lowercase();
        if key.is_empty() {
            return None;
        }

        if let Some(hit) = self.cache.get(&key).await {
            tracing::trace!("Geocode cache hit: {}", key);
            return Some(hit);
        }

        match self.lookup(address).await {
            Ok(Some(coordinates)) => {
                self.cache.insert(key, coordinates).await;
                Some(coordinates)
            }
            Ok(None) => {
                tracing::info!("No geocoding result for address '{}'", address);
                None
            }
            Err(e) => {
                tracing::warn!("Geocoding failed for address '{}': {}", address, e);
                None
            }
        }
    }
}

/// Geocoder for deployments without a lookup service; every address stays unresolved
pub struct NoopGeocoder;

#[async_trait]
impl Geocoder for NoopGeocoder {
    async fn geocode(&self, _address: &str) -> Option<Coordinates> {
        None
    }
}
