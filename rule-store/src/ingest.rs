//! Ingestion pipeline: embedded rule chunks → Qdrant points → batched upsert.

use crate::config::RuleStoreConfig;
use crate::errors::RuleStoreError;
use crate::qdrant_facade::QdrantFacade;
use crate::record::RuleRecord;

use indicatif::{ProgressBar, ProgressStyle};
use qdrant_client::qdrant::{PointId, PointStruct, Value as QValue, Vector, Vectors, value, vectors};
use services::uuid::stable_uuid;
use std::collections::HashMap;
use std::collections::HashSet;
use tracing::{info, warn};

/// Upserts rule records in batches.
///
/// Point ids are derived from the rule id (`sun_house_1` → UUIDv5), so
/// re-ingesting the same planet/house pair overwrites the stored vector
/// instead of duplicating it. When one document yields several chunks for
/// the same pair, the last occurrence wins; earlier ones are reported with a
/// warning.
///
/// # Errors
/// Returns [`RuleStoreError::VectorSizeMismatch`] when any embedding does
/// not match the configured dimension, or a Qdrant error, which aborts the
/// remaining batches.
pub async fn upsert_rules(
    cfg: &RuleStoreConfig,
    client: &QdrantFacade,
    records: Vec<RuleRecord>,
) -> Result<usize, RuleStoreError> {
    if records.is_empty() {
        info!("No rule records to upsert");
        return Ok(0);
    }

    for r in &records {
        if r.embedding.len() != cfg.embedding_dim {
            return Err(RuleStoreError::VectorSizeMismatch {
                got: r.embedding.len(),
                want: cfg.embedding_dim,
            });
        }
    }

    warn_duplicate_pairs(&records);

    client.ensure_collection(cfg.embedding_dim).await?;

    let batch_size = cfg.upsert_batch.max(1);
    let total_batches = records.len().div_ceil(batch_size);

    let pb = ProgressBar::new(total_batches as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})",
        )
        .unwrap()
        .progress_chars("##-"),
    );

    let mut total = 0usize;
    for batch in records.chunks(batch_size) {
        let points = build_points(batch);
        total += client.upsert_points(points).await?;
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!("Upserted {} rule records", total);
    Ok(total)
}

/// Builds Qdrant points for a batch of records.
///
/// Payload layout (also the persisted schema): `planet` keyword, `house`
/// integer, `heading`, `content`, `char_count`, plus `rule_id` so retrieval
/// can report the storage key without re-deriving it.
pub(crate) fn build_points(batch: &[RuleRecord]) -> Vec<PointStruct> {
    let mut pts = Vec::with_capacity(batch.len());

    for r in batch {
        let rule_id = r.rule_id();

        let mut payload: HashMap<String, QValue> = HashMap::new();
        payload.insert("planet".into(), qstring(r.planet.name()));
        payload.insert("house".into(), qinteger(r.house.number() as i64));
        payload.insert("heading".into(), qstring(&r.heading));
        payload.insert("content".into(), qstring(&r.content));
        payload.insert("char_count".into(), qinteger(r.char_count as i64));
        payload.insert("rule_id".into(), qstring(&rule_id));

        let pid: PointId = stable_uuid(&rule_id).to_string().into();

        let vectors = Vectors {
            vectors_options: Some(vectors::VectorsOptions::Vector(Vector {
                data: r.embedding.clone(),
                indices: None,
                vectors_count: None,
                vector: None,
            })),
        };

        pts.push(PointStruct {
            id: Some(pid),
            payload,
            vectors: Some(vectors),
            ..Default::default()
        });
    }

    pts
}

/// Duplicate planet/house pairs within one ingestion collapse to a single
/// stored point; surface that instead of resolving it silently.
fn warn_duplicate_pairs(records: &[RuleRecord]) {
    let mut seen: HashSet<String> = HashSet::with_capacity(records.len());
    for r in records {
        let id = r.rule_id();
        if !seen.insert(id.clone()) {
            warn!("duplicate heading for {}, last occurrence wins", id);
        }
    }
}

fn qstring(s: &str) -> QValue {
    QValue {
        kind: Some(value::Kind::StringValue(s.to_string())),
    }
}

fn qinteger(i: i64) -> QValue {
    QValue {
        kind: Some(value::Kind::IntegerValue(i)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chart_engine::{House, Planet};

    fn record(planet: Planet, house: u8) -> RuleRecord {
        RuleRecord {
            planet,
            house: House::new(house).unwrap(),
            heading: format!("{planet} in {house}th House"),
            content: "rule text".into(),
            char_count: 9,
            embedding: vec![0.1; 768],
        }
    }

    fn kind_of<'a>(payload: &'a HashMap<String, QValue>, key: &str) -> &'a value::Kind {
        payload.get(key).unwrap().kind.as_ref().unwrap()
    }

    #[test]
    fn points_carry_identity_payload() {
        let pts = build_points(&[record(Planet::Sun, 1)]);
        assert_eq!(pts.len(), 1);

        let payload = &pts[0].payload;
        assert_eq!(
            kind_of(payload, "planet"),
            &value::Kind::StringValue("Sun".into())
        );
        assert_eq!(kind_of(payload, "house"), &value::Kind::IntegerValue(1));
        assert_eq!(
            kind_of(payload, "rule_id"),
            &value::Kind::StringValue("sun_house_1".into())
        );
    }

    #[test]
    fn same_pair_maps_to_same_point_id() {
        let a = build_points(&[record(Planet::Moon, 3)]);
        let b = build_points(&[record(Planet::Moon, 3)]);
        assert_eq!(a[0].id, b[0].id);

        let c = build_points(&[record(Planet::Moon, 4)]);
        assert_ne!(a[0].id, c[0].id);
    }
}
