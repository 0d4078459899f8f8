//! Houses and the immutable chart mapping.

use crate::error::ChartError;
use crate::planet::Planet;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A house number, guaranteed to lie in 1..=12.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct House(pub(crate) u8);

impl House {
    /// Builds a house from a raw number.
    ///
    /// # Errors
    /// Returns [`ChartError::HouseOutOfRange`] for anything outside 1..=12.
    pub fn new(n: u8) -> Result<Self, ChartError> {
        if (1..=12).contains(&n) {
            Ok(House(n))
        } else {
            Err(ChartError::HouseOutOfRange(n))
        }
    }

    /// The raw house number.
    pub fn number(self) -> u8 {
        self.0
    }
}

impl fmt::Display for House {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A natal chart: each planet's house placement.
///
/// Charts are built once from computed planetary positions and never mutated;
/// a new consultation produces a new chart.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chart {
    houses: BTreeMap<Planet, House>,
}

impl Chart {
    /// Wraps a planet → house mapping. Use [`Chart::validate`] before acting
    /// on charts coming from external computation.
    pub fn new(houses: BTreeMap<Planet, House>) -> Self {
        Chart { houses }
    }

    /// True iff all nine planets are placed.
    ///
    /// House range is structural ([`House`] cannot hold an out-of-range
    /// number), so validation reduces to completeness. Fails closed: an
    /// empty or partial chart is simply invalid, never a panic.
    pub fn validate(&self) -> bool {
        Planet::ALL.iter().all(|p| self.houses.contains_key(p))
    }

    /// House assigned to `planet`, if placed.
    pub fn house_of(&self, planet: Planet) -> Option<House> {
        self.houses.get(&planet).copied()
    }

    /// All planets whose assigned house equals `house`.
    ///
    /// An out-of-range house is not an error; it simply matches nothing.
    pub fn planets_in_house(&self, house: u8) -> Vec<Planet> {
        self.houses
            .iter()
            .filter(|(_, h)| h.0 == house)
            .map(|(p, _)| *p)
            .collect()
    }

    /// Iterates `(planet, house)` pairs in canonical planet order.
    pub fn iter(&self) -> impl Iterator<Item = (Planet, House)> + '_ {
        self.houses.iter().map(|(p, h)| (*p, *h))
    }

    /// Number of placed planets.
    pub fn len(&self) -> usize {
        self.houses.len()
    }

    /// True when no planet is placed.
    pub fn is_empty(&self) -> bool {
        self.houses.is_empty()
    }

    /// Chart grouped by houses 1..=12, with an "Empty" placeholder for
    /// uninhabited houses. Pure projection, no side effects.
    pub fn format_by_houses(&self) -> String {
        let mut out = String::from("Chart by Houses:\n");
        for house in 1..=12u8 {
            let planets = self.planets_in_house(house);
            let planets_str = if planets.is_empty() {
                "Empty".to_string()
            } else {
                planets
                    .iter()
                    .map(|p| p.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            out.push_str(&format!("House {house:2}: {planets_str}\n"));
        }
        out
    }

    /// Sorted planet → house listing.
    pub fn summary(&self) -> String {
        let mut out = String::from("Horoscope Chart:\n");
        for (planet, house) in self.iter() {
            out.push_str(&format!("{:8} -> House {:2}\n", planet.name(), house.0));
        }
        out
    }
}
