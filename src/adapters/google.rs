//! Forward geocoding against the Google Geocoding API (v3).

use crate::domain::model::GeocodeResult;
use crate::domain::ports::{GeocodeOutcome, Geocoder};
use crate::utils::error::{Result, ServiceError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/geocode/json";
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

#[derive(Debug, Clone)]
pub struct GeocoderSettings {
    pub endpoint: String,
    pub api_key: Option<String>,
    /// Region bias as a ccTLD code, e.g. "us".
    pub region: Option<String>,
    pub timeout: Duration,
}

impl Default for GeocoderSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            region: None,
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<ApiResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResult {
    #[serde(default)]
    address_components: Vec<AddressComponent>,
    formatted_address: Option<String>,
    geometry: Option<Geometry>,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AddressComponent {
    long_name: String,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Location,
}

#[derive(Debug, Deserialize)]
struct Location {
    lat: f64,
    lng: f64,
}

impl ApiResult {
    fn component(&self, kind: &str) -> Option<String> {
        self.address_components
            .iter()
            .find(|c| c.types.iter().any(|t| t == kind))
            .map(|c| c.long_name.clone())
    }

    fn into_result(self) -> GeocodeResult {
        let state = self.component("administrative_area_level_1");
        GeocodeResult {
            latitude: self.geometry.as_ref().map(|g| g.location.lat),
            longitude: self.geometry.as_ref().map(|g| g.location.lng),
            street_number: self.component("street_number"),
            street: self.component("route"),
            city: self.component("locality"),
            county: self.component("administrative_area_level_2"),
            neighborhood: self.component("neighborhood"),
            province: state.clone(),
            state,
            postal_code: self.component("postal_code"),
            country: self.component("country"),
            valid: self.types.iter().any(|t| t == "street_address"),
            formatted_address: self.formatted_address,
        }
    }
}

pub struct GoogleGeocoder {
    client: Client,
    settings: GeocoderSettings,
}

impl GoogleGeocoder {
    pub fn new(settings: GeocoderSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("geocode-csv/", env!("CARGO_PKG_VERSION")))
            .timeout(settings.timeout)
            .build()?;

        if settings.api_key.is_none() {
            tracing::warn!("No Google API key configured; requests are sent without a key");
        }

        Ok(Self { client, settings })
    }

    async fn request(&self, address: &str) -> GeocodeOutcome {
        let mut query = vec![("address", address)];
        if let Some(key) = &self.settings.api_key {
            query.push(("key", key.as_str()));
        }
        if let Some(region) = &self.settings.region {
            query.push(("region", region.as_str()));
        }

        let response = self
            .client
            .get(&self.settings.endpoint)
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let parsed: GeocodeResponse = serde_json::from_str(&body)?;

        match parsed.status.as_str() {
            "OK" => parsed
                .results
                .into_iter()
                .next()
                .map(ApiResult::into_result)
                .ok_or(ServiceError::NoMatch),
            "ZERO_RESULTS" => Err(ServiceError::NoMatch),
            _ => Err(ServiceError::Rejected {
                status: parsed.status,
                message: parsed.error_message,
            }),
        }
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn geocode(&self, address: &str) -> GeocodeOutcome {
        let outcome = self.request(address).await;
        if let Ok(result) = &outcome {
            tracing::debug!(
                "Resolved '{}' to {:?} (valid: {})",
                address,
                result.formatted_address,
                result.valid
            );
        }
        outcome
    }
}
