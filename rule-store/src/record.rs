//! Core data models used by the library.

use crate::errors::RuleStoreError;
use chart_engine::{House, Planet};
use rule_indexer::Chunk;
use serde::{Deserialize, Serialize};

/// Canonical record stored in Qdrant: one rule chunk plus its embedding.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuleRecord {
    pub planet: Planet,
    pub house: House,
    pub heading: String,
    pub content: String,
    pub char_count: usize,
    pub embedding: Vec<f32>,
}

impl RuleRecord {
    /// Attaches an embedding to an extracted chunk.
    pub fn from_chunk(chunk: Chunk, embedding: Vec<f32>) -> Self {
        Self {
            planet: chunk.planet,
            house: chunk.house,
            heading: chunk.heading,
            content: chunk.content,
            char_count: chunk.char_count,
            embedding,
        }
    }

    /// Storage identity of this record; at most one authoritative rule is
    /// kept per planet/house pair (last write wins on re-ingestion).
    pub fn rule_id(&self) -> String {
        rule_id(self.planet, self.house)
    }
}

/// Store key for a planet/house pair: `"{planet_lowercase}_house_{house}"`.
pub fn rule_id(planet: Planet, house: House) -> String {
    format!("{}_house_{}", planet.name().to_lowercase(), house.number())
}

/// A rule re-hydrated from the store for one query.
///
/// `score` is the cosine similarity for hybrid retrieval and the `0.0`
/// sentinel for pure metadata lookups.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetrievedRule {
    pub planet: Planet,
    pub house: House,
    pub id: String,
    pub score: f32,
    pub content: String,
    pub heading: String,
    /// The full stored payload, for callers that need more than the
    /// canonical fields.
    pub metadata: serde_json::Value,
}

impl RetrievedRule {
    /// Rebuilds a rule from a scored Qdrant payload.
    ///
    /// # Errors
    /// Returns [`RuleStoreError::Payload`] when the payload is missing or
    /// corrupts the planet/house identity.
    pub fn from_payload(score: f32, payload: serde_json::Value) -> Result<Self, RuleStoreError> {
        let planet = payload
            .get("planet")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse::<Planet>().ok())
            .ok_or_else(|| RuleStoreError::Payload("missing or unknown planet".into()))?;

        let house = payload
            .get("house")
            .and_then(|v| v.as_i64())
            .and_then(|n| u8::try_from(n).ok())
            .and_then(|n| House::new(n).ok())
            .ok_or_else(|| RuleStoreError::Payload("missing or out-of-range house".into()))?;

        let id = payload
            .get("rule_id")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| rule_id(planet, house));

        let content = payload
            .get("content")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        let heading = payload
            .get("heading")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        Ok(Self {
            planet,
            house,
            id,
            score,
            content,
            heading,
            metadata: payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rule_id_is_lowercase_planet_and_house() {
        let id = rule_id(Planet::Sun, House::new(1).unwrap());
        assert_eq!(id, "sun_house_1");
        let id = rule_id(Planet::Jupiter, House::new(12).unwrap());
        assert_eq!(id, "jupiter_house_12");
    }

    #[test]
    fn payload_roundtrip() {
        let payload = json!({
            "planet": "Moon",
            "house": 3,
            "rule_id": "moon_house_3",
            "heading": "Moon in 3rd House",
            "content": "Benefic: intelligent and wise.",
            "char_count": 30,
        });
        let rule = RetrievedRule::from_payload(0.42, payload).unwrap();
        assert_eq!(rule.planet, Planet::Moon);
        assert_eq!(rule.house.number(), 3);
        assert_eq!(rule.id, "moon_house_3");
        assert_eq!(rule.score, 0.42);
        assert!(rule.content.starts_with("Benefic"));
    }

    #[test]
    fn corrupt_payload_is_rejected() {
        assert!(RetrievedRule::from_payload(0.0, json!({"planet": "Pluto", "house": 1})).is_err());
        assert!(RetrievedRule::from_payload(0.0, json!({"planet": "Sun", "house": 13})).is_err());
        assert!(RetrievedRule::from_payload(0.0, json!({"planet": "Sun"})).is_err());
    }
}
