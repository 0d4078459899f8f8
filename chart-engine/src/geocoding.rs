//! Place-name resolution behind a narrow port.
//!
//! The production adapter talks to Nominatim (OpenStreetMap); tests plug in
//! deterministic stubs through the [`Geocoder`] trait.

use crate::error::ChartError;

use serde::Deserialize;
use std::{future::Future, pin::Pin};
use tracing::{debug, warn};

/// Resolved coordinates for a place name.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Port for place-name resolution.
///
/// `Ok(None)` means the place is unknown; transport and service failures are
/// errors.
pub trait Geocoder: Send + Sync {
    fn resolve<'a>(
        &'a self,
        place: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<GeoPoint>, ChartError>> + Send + 'a>>;
}

/// Nominatim (OpenStreetMap) geocoding adapter. Free, no API key.
pub struct NominatimGeocoder {
    http: reqwest::Client,
    base: String,
    /// Country appended to the query for better accuracy on bare city names.
    country_bias: String,
}

impl NominatimGeocoder {
    /// Builds an adapter against the public Nominatim endpoint.
    ///
    /// # Errors
    /// Returns `ChartError::Http` if the HTTP client cannot be constructed.
    pub fn new() -> Result<Self, ChartError> {
        Self::with_endpoint("https://nominatim.openstreetmap.org", "India")
    }

    /// Builds an adapter against a custom endpoint (self-hosted instances,
    /// test servers).
    pub fn with_endpoint(base: &str, country_bias: &str) -> Result<Self, ChartError> {
        let http = reqwest::Client::builder()
            .user_agent("astrochat-backend")
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base: base.trim_end_matches('/').to_string(),
            country_bias: country_bias.to_string(),
        })
    }

    async fn search(&self, query: &str) -> Result<Option<GeoPoint>, ChartError> {
        #[derive(Deserialize)]
        struct Hit {
            lat: String,
            lon: String,
        }

        let url = format!("{}/search", self.base);
        debug!("GET {} q={}", url, query);

        let resp = self
            .http
            .get(&url)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ChartError::Geocoding(format!(
                "HTTP {} from {}",
                resp.status(),
                url
            )));
        }

        let hits: Vec<Hit> = resp.json().await?;
        let Some(hit) = hits.into_iter().next() else {
            return Ok(None);
        };

        let latitude = hit
            .lat
            .parse::<f64>()
            .map_err(|e| ChartError::Geocoding(format!("bad latitude '{}': {e}", hit.lat)))?;
        let longitude = hit
            .lon
            .parse::<f64>()
            .map_err(|e| ChartError::Geocoding(format!("bad longitude '{}': {e}", hit.lon)))?;

        Ok(Some(GeoPoint {
            latitude,
            longitude,
        }))
    }
}

impl Geocoder for NominatimGeocoder {
    fn resolve<'a>(
        &'a self,
        place: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<GeoPoint>, ChartError>> + Send + 'a>> {
        Box::pin(async move {
            // Country-qualified query first, bare place name as fallback.
            let qualified = format!("{}, {}", place, self.country_bias);
            if let Some(point) = self.search(&qualified).await? {
                return Ok(Some(point));
            }
            warn!("no result for '{}', retrying without country", qualified);
            self.search(place).await
        })
    }
}
