//! High-level rule store facade: ingestion + retrieval over Qdrant.
//!
//! Rules are text chunks keyed by a planet/house pair. The store supports:
//! - batched, idempotent upsert of embedded chunks
//! - metadata-filtered retrieval for a whole chart (per-pair, best-effort)
//! - hybrid retrieval for a chart plus a question embedding (atomic)
//!
//! The design is flat and splits responsibilities into focused modules; all
//! `qdrant-client` usage lives behind [`qdrant_facade`].

mod config;
mod errors;
mod filters;
mod ingest;
mod qdrant_facade;
mod record;
mod retrieve;

pub use config::{DistanceKind, RuleStoreConfig};
pub use errors::RuleStoreError;
pub use record::{RetrievedRule, RuleRecord, rule_id};

use tracing::trace;

/// High-level facade that wires configuration and the Qdrant client.
///
/// This is the single entry point recommended for application code.
pub struct RuleStore {
    cfg: RuleStoreConfig,
    client: qdrant_facade::QdrantFacade,
}

impl RuleStore {
    /// Constructs a new store from the given configuration.
    ///
    /// # Errors
    /// Returns `RuleStoreError::Config` if the client initialization fails.
    pub fn new(cfg: RuleStoreConfig) -> Result<Self, RuleStoreError> {
        trace!("RuleStore::new collection={}", cfg.collection);
        let client = qdrant_facade::QdrantFacade::new(&cfg)?;
        Ok(Self { cfg, client })
    }

    /// Upserts embedded rule chunks in batches; idempotent per planet/house
    /// pair (last write wins). Returns the number of records written.
    ///
    /// # Errors
    /// Returns errors on vector size mismatch or Qdrant failures; the first
    /// failure aborts the remaining batches.
    pub async fn upsert_rules(&self, records: Vec<RuleRecord>) -> Result<usize, RuleStoreError> {
        trace!("RuleStore::upsert_rules count={}", records.len());
        ingest::upsert_rules(&self.cfg, &self.client, records).await
    }

    /// Metadata-filtered retrieval for every pair in `chart`, up to `top_k`
    /// rules per pair. Failed pairs degrade result completeness instead of
    /// failing the call.
    pub async fn query_by_chart(&self, chart: &chart_engine::Chart, top_k: u32) -> Vec<RetrievedRule> {
        trace!("RuleStore::query_by_chart top_k={top_k}");
        retrieve::query_by_chart(&self.client, chart, top_k).await
    }

    /// Hybrid retrieval: similarity over `question_embedding` constrained to
    /// the chart's pairs, globally top-`top_k`.
    ///
    /// # Errors
    /// Propagates any Qdrant failure; this path is atomic, not best-effort.
    pub async fn query_by_chart_and_question(
        &self,
        chart: &chart_engine::Chart,
        question_embedding: Vec<f32>,
        top_k: u64,
    ) -> Result<Vec<RetrievedRule>, RuleStoreError> {
        trace!("RuleStore::query_by_chart_and_question top_k={top_k}");
        retrieve::query_by_chart_and_question(&self.cfg, &self.client, chart, question_embedding, top_k)
            .await
    }
}
