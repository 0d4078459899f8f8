//! Natal chart model and house placement.
//!
//! This crate owns the data model the rest of the application depends on:
//! - [`Planet`] — the closed 9-planet vocabulary
//! - [`House`] — a bounded 1..=12 house number
//! - [`Chart`] — an immutable planet → house mapping with validation and
//!   grouping queries
//! - the whole-sign house placement math ([`houses::degree_to_house`])
//!
//! Astronomical position data and place resolution are external collaborators
//! behind the [`Ephemeris`] and [`Geocoder`] ports; [`ChartCalculator`] wires
//! them together.

mod calculator;
mod chart;
mod error;
mod geocoding;
pub mod houses;
mod planet;

pub use calculator::{BirthData, ChartCalculator, Ephemeris, HttpEphemeris, Positions};
pub use chart::{Chart, House};
pub use error::ChartError;
pub use geocoding::{GeoPoint, Geocoder, NominatimGeocoder};
pub use planet::Planet;
