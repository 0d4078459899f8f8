//! The closed planet vocabulary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the nine planets of the Lal Kitab system.
///
/// The set is closed: charts, rule headings and store metadata all use this
/// enumeration rather than open strings. Rahu and Ketu are the lunar nodes;
/// Ketu's position is always derived from Rahu's (see [`crate::houses`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Planet {
    Sun,
    Moon,
    Mars,
    Mercury,
    Jupiter,
    Venus,
    Saturn,
    Rahu,
    Ketu,
}

impl Planet {
    /// All nine planets, in canonical order.
    pub const ALL: [Planet; 9] = [
        Planet::Sun,
        Planet::Moon,
        Planet::Mars,
        Planet::Mercury,
        Planet::Jupiter,
        Planet::Venus,
        Planet::Saturn,
        Planet::Rahu,
        Planet::Ketu,
    ];

    /// Canonical capitalized name, as stored in rule metadata.
    pub fn name(self) -> &'static str {
        match self {
            Planet::Sun => "Sun",
            Planet::Moon => "Moon",
            Planet::Mars => "Mars",
            Planet::Mercury => "Mercury",
            Planet::Jupiter => "Jupiter",
            Planet::Venus => "Venus",
            Planet::Saturn => "Saturn",
            Planet::Rahu => "Rahu",
            Planet::Ketu => "Ketu",
        }
    }
}

impl fmt::Display for Planet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Planet {
    type Err = ();

    /// Case-insensitive lookup; any string outside the vocabulary is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sun" => Ok(Planet::Sun),
            "moon" => Ok(Planet::Moon),
            "mars" => Ok(Planet::Mars),
            "mercury" => Ok(Planet::Mercury),
            "jupiter" => Ok(Planet::Jupiter),
            "venus" => Ok(Planet::Venus),
            "saturn" => Ok(Planet::Saturn),
            "rahu" => Ok(Planet::Rahu),
            "ketu" => Ok(Planet::Ketu),
            _ => Err(()),
        }
    }
}
