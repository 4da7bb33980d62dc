//! Reverse geocoding for the patient's location display.

use async_trait::async_trait;
use serde::Deserialize;
use vitalwatch_core::patient::LOCATION_FALLBACK;

pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";

/// Nominatim's usage policy requires an identifying agent.
const USER_AGENT: &str = concat!("vitalwatch/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Geocoder returned HTTP {0}")]
    HttpStatus(u16),

    #[error("Geocoder response had no usable address")]
    NoAddress,
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn reverse(&self, lat: f64, lng: f64) -> Result<String, GeocodeError>;
}

/// Resolve `(lat, lng)` to a display address, or the static fallback.
pub async fn resolve_address(geocoder: &dyn Geocoder, lat: f64, lng: f64) -> String {
    match geocoder.reverse(lat, lng).await {
        Ok(address) => address,
        Err(e) => {
            tracing::warn!(error = %e, lat, lng, "Reverse geocode failed, using fallback address");
            LOCATION_FALLBACK.to_string()
        }
    }
}

// ---------------------------------------------------------------------------
// Nominatim
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
    #[serde(default)]
    address: Option<AddressParts>,
}

#[derive(Debug, Deserialize)]
struct AddressParts {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
}

impl ReverseResponse {
    /// First segment of the display name plus the settlement, e.g.
    /// `"221B Baker Street, London"`.
    fn short_address(self) -> Option<String> {
        let head = self
            .display_name?
            .split(',')
            .next()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())?;
        let settlement = self
            .address
            .and_then(|a| a.city.or(a.town).or(a.village));
        Some(match settlement {
            Some(place) => format!("{head}, {place}"),
            None => head,
        })
    }
}

pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn reverse(&self, lat: f64, lng: f64) -> Result<String, GeocodeError> {
        let response = self
            .client
            .get(format!("{}/reverse", self.base_url))
            .query(&[
                ("format", "json".to_string()),
                ("lat", lat.to_string()),
                ("lon", lng.to_string()),
            ])
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GeocodeError::HttpStatus(response.status().as_u16()));
        }

        let parsed: ReverseResponse = response.json().await?;
        parsed.short_address().ok_or(GeocodeError::NoAddress)
    }
}
