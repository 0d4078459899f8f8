//! Chart calculation: ephemeris port + house placement.
//!
//! The astronomical side (ascendant and planetary longitudes) is an opaque
//! collaborator behind [`Ephemeris`]. This module owns what the rest of the
//! system depends on: the house mapping and the Ketu derivation.

use crate::chart::Chart;
use crate::error::ChartError;
use crate::geocoding::Geocoder;
use crate::houses::{degree_to_house, ketu_longitude};
use crate::planet::Planet;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{future::Future, pin::Pin};
use tracing::{debug, info};

/// Normalized birth details, produced by the extraction gate.
#[derive(Clone, Debug, PartialEq)]
pub struct BirthData {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub place: String,
    /// Offset from UTC in hours, e.g. 5.5 for IST.
    pub timezone_offset: f64,
}

/// Sidereal positions for one birth instant.
///
/// `longitudes` holds the eight directly computed bodies; Ketu is
/// intentionally absent and always derived from Rahu by the calculator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Positions {
    /// Ascendant longitude in [0, 360).
    pub ascendant: f64,
    /// Longitude in [0, 360) per planet.
    pub longitudes: BTreeMap<Planet, f64>,
}

/// Port over the astronomical ephemeris.
///
/// Implementations wrap whatever position source is available (a Swiss
/// Ephemeris sidecar service, test stubs).
pub trait Ephemeris: Send + Sync {
    fn positions<'a>(
        &'a self,
        birth: &'a BirthData,
        latitude: f64,
        longitude: f64,
    ) -> Pin<Box<dyn Future<Output = Result<Positions, ChartError>> + Send + 'a>>;
}

/// Computes complete natal charts from birth data.
pub struct ChartCalculator<E, G> {
    ephemeris: E,
    geocoder: G,
}

impl<E: Ephemeris, G: Geocoder> ChartCalculator<E, G> {
    pub fn new(ephemeris: E, geocoder: G) -> Self {
        Self {
            ephemeris,
            geocoder,
        }
    }

    /// Resolves the birth place and computes the chart.
    ///
    /// # Errors
    /// - [`ChartError::PlaceNotFound`] when geocoding yields nothing
    /// - [`ChartError::Computation`] when positions are missing or invalid
    pub async fn compute(&self, birth: &BirthData) -> Result<Chart, ChartError> {
        let point = self
            .geocoder
            .resolve(&birth.place)
            .await?
            .ok_or_else(|| ChartError::PlaceNotFound(birth.place.clone()))?;

        debug!(
            "resolved '{}' to ({:.4}, {:.4})",
            birth.place, point.latitude, point.longitude
        );

        self.compute_at(birth, point.latitude, point.longitude).await
    }

    /// Computes the chart for explicit coordinates.
    pub async fn compute_at(
        &self,
        birth: &BirthData,
        latitude: f64,
        longitude: f64,
    ) -> Result<Chart, ChartError> {
        let positions = self.ephemeris.positions(birth, latitude, longitude).await?;

        let rahu = *positions.longitudes.get(&Planet::Rahu).ok_or_else(|| {
            ChartError::Computation("ephemeris returned no Rahu longitude".into())
        })?;

        let mut houses = BTreeMap::new();
        for planet in Planet::ALL {
            let degree = match planet {
                Planet::Ketu => ketu_longitude(rahu),
                p => *positions.longitudes.get(&p).ok_or_else(|| {
                    ChartError::Computation(format!("ephemeris returned no {p} longitude"))
                })?,
            };
            houses.insert(planet, degree_to_house(degree, positions.ascendant));
        }

        let chart = Chart::new(houses);
        info!(
            "computed chart for '{}': {} planets",
            birth.place,
            chart.len()
        );
        Ok(chart)
    }
}

/// HTTP adapter for an ephemeris sidecar service.
///
/// Expected contract: `POST {endpoint}/positions` with the birth instant and
/// coordinates, returning a [`Positions`] JSON body.
pub struct HttpEphemeris {
    http: reqwest::Client,
    url: String,
}

impl HttpEphemeris {
    /// Builds an adapter against the given service endpoint.
    ///
    /// # Errors
    /// Returns `ChartError::Http` if the HTTP client cannot be constructed.
    pub fn new(endpoint: &str) -> Result<Self, ChartError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()?;
        Ok(Self {
            http,
            url: format!("{}/positions", endpoint.trim_end_matches('/')),
        })
    }
}

impl Ephemeris for HttpEphemeris {
    fn positions<'a>(
        &'a self,
        birth: &'a BirthData,
        latitude: f64,
        longitude: f64,
    ) -> Pin<Box<dyn Future<Output = Result<Positions, ChartError>> + Send + 'a>> {
        #[derive(Serialize)]
        struct Req<'r> {
            date: &'r str,
            time: &'r str,
            timezone_offset: f64,
            latitude: f64,
            longitude: f64,
        }

        Box::pin(async move {
            let date = birth.date.format("%Y-%m-%d").to_string();
            let time = birth.time.format("%H:%M").to_string();

            debug!("POST {}", self.url);
            let resp = self
                .http
                .post(&self.url)
                .json(&Req {
                    date: &date,
                    time: &time,
                    timezone_offset: birth.timezone_offset,
                    latitude,
                    longitude,
                })
                .send()
                .await?;

            if !resp.status().is_success() {
                return Err(ChartError::Computation(format!(
                    "HTTP {} from {}",
                    resp.status(),
                    self.url
                )));
            }

            let positions: Positions = resp
                .json()
                .await
                .map_err(|e| ChartError::Computation(format!("bad positions payload: {e}")))?;
            Ok(positions)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocoding::GeoPoint;

    /// Fixed ephemeris: every body at `deg`, ascendant at `asc`.
    struct FlatEphemeris {
        deg: f64,
        asc: f64,
    }

    impl Ephemeris for FlatEphemeris {
        fn positions<'a>(
            &'a self,
            _birth: &'a BirthData,
            _lat: f64,
            _lon: f64,
        ) -> Pin<Box<dyn Future<Output = Result<Positions, ChartError>> + Send + 'a>> {
            let longitudes = Planet::ALL
                .iter()
                .filter(|p| **p != Planet::Ketu)
                .map(|p| (*p, self.deg))
                .collect();
            let positions = Positions {
                ascendant: self.asc,
                longitudes,
            };
            Box::pin(async move { Ok(positions) })
        }
    }

    struct FixedGeocoder(Option<GeoPoint>);

    impl Geocoder for FixedGeocoder {
        fn resolve<'a>(
            &'a self,
            _place: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<Option<GeoPoint>, ChartError>> + Send + 'a>>
        {
            Box::pin(async move { Ok(self.0) })
        }
    }

    fn birth() -> BirthData {
        BirthData {
            date: NaiveDate::from_ymd_opt(2004, 1, 16).unwrap(),
            time: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
            place: "Ahmedabad".into(),
            timezone_offset: 5.5,
        }
    }

    #[tokio::test]
    async fn ketu_is_derived_from_rahu() {
        // Rahu at 200°, ascendant 50°: Rahu in house 6, Ketu in house 12.
        let calc = ChartCalculator::new(
            FlatEphemeris {
                deg: 200.0,
                asc: 50.0,
            },
            FixedGeocoder(Some(GeoPoint {
                latitude: 23.0,
                longitude: 72.5,
            })),
        );
        let chart = calc.compute(&birth()).await.unwrap();
        assert!(chart.validate());
        assert_eq!(chart.house_of(Planet::Rahu).unwrap().number(), 6);
        assert_eq!(chart.house_of(Planet::Ketu).unwrap().number(), 12);
    }

    #[tokio::test]
    async fn unresolvable_place_is_not_found() {
        let calc = ChartCalculator::new(
            FlatEphemeris {
                deg: 10.0,
                asc: 0.0,
            },
            FixedGeocoder(None),
        );
        let err = calc.compute(&birth()).await.unwrap_err();
        assert!(matches!(err, ChartError::PlaceNotFound(_)));
    }

    #[tokio::test]
    async fn missing_body_is_a_computation_error() {
        struct NoRahu;
        impl Ephemeris for NoRahu {
            fn positions<'a>(
                &'a self,
                _: &'a BirthData,
                _: f64,
                _: f64,
            ) -> Pin<Box<dyn Future<Output = Result<Positions, ChartError>> + Send + 'a>>
            {
                Box::pin(async move {
                    Ok(Positions {
                        ascendant: 0.0,
                        longitudes: BTreeMap::from([(Planet::Sun, 10.0)]),
                    })
                })
            }
        }

        let calc = ChartCalculator::new(
            NoRahu,
            FixedGeocoder(Some(GeoPoint {
                latitude: 0.0,
                longitude: 0.0,
            })),
        );
        let err = calc.compute(&birth()).await.unwrap_err();
        assert!(matches!(err, ChartError::Computation(_)));
    }
}
