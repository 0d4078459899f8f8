//! Unified error type for the crate.

use thiserror::Error;

/// Top-level error for chart construction and calculation.
#[derive(Debug, Error)]
pub enum ChartError {
    /// House number outside 1..=12.
    #[error("house number out of range: {0} (expected 1..=12)")]
    HouseOutOfRange(u8),

    /// Place name could not be resolved to coordinates.
    #[error("could not find coordinates for '{0}'; please check the spelling")]
    PlaceNotFound(String),

    /// Geocoding service failed (transport, bad payload).
    #[error("geocoding error: {0}")]
    Geocoding(String),

    /// The ephemeris collaborator failed to produce a position.
    #[error("chart computation error: {0}")]
    Computation(String),

    /// HTTP transport errors from the geocoding adapter.
    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),
}
