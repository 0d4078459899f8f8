//! Runtime and collection configuration.

use crate::errors::RuleStoreError;

/// Distance function used for the vector space.
#[derive(Clone, Copy, Debug)]
pub enum DistanceKind {
    /// Cosine distance (recommended for text embeddings).
    Cosine,
    /// Dot product (useful for normalized vectors).
    Dot,
    /// Euclidean distance (L2).
    Euclid,
}

/// Configuration for rule ingestion and retrieval.
#[derive(Clone, Debug)]
pub struct RuleStoreConfig {
    /// Qdrant HTTP endpoint, e.g. `http://localhost:6334`.
    pub qdrant_url: String,
    /// Optional API key for Qdrant Cloud.
    pub qdrant_api_key: Option<String>,
    /// Target collection name.
    pub collection: String,
    /// Distance function (Cosine by default).
    pub distance: DistanceKind,
    /// Embedding dimensionality; every stored vector must match.
    pub embedding_dim: usize,
    /// Upsert batch size.
    pub upsert_batch: usize,
    /// Exact search flag (false = HNSW ANN).
    pub exact_search: bool,
}

impl RuleStoreConfig {
    /// Creates a sane default config for a given collection name and Qdrant
    /// endpoint. The 768 dimension matches the Gemini `text-embedding-004`
    /// model.
    pub fn new_default(url: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            qdrant_url: url.into(),
            qdrant_api_key: None,
            collection: collection.into(),
            distance: DistanceKind::Cosine,
            embedding_dim: 768,
            upsert_batch: 100,
            exact_search: false,
        }
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), RuleStoreError> {
        if self.qdrant_url.trim().is_empty() {
            return Err(RuleStoreError::Config("qdrant_url is empty".into()));
        }
        if self.collection.trim().is_empty() {
            return Err(RuleStoreError::Config("collection is empty".into()));
        }
        if self.embedding_dim == 0 {
            return Err(RuleStoreError::Config("embedding_dim must be > 0".into()));
        }
        if self.upsert_batch == 0 {
            return Err(RuleStoreError::Config("upsert_batch must be > 0".into()));
        }
        Ok(())
    }
}
