//! POST /ingest — load a reference document into the rule store.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::app_state::AppState;
use rule_indexer::{ChunkStats, extract_chunks, load_text};
use rule_store::RuleRecord;

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    /// Path to a PDF or plain-text reference document on the server.
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub uploaded: usize,
    pub stats: ChunkStats,
}

/// Handler: POST /ingest
///
/// Pipeline: load text → extract planet/house chunks → embed → upsert.
/// A document without any matching headings is a 200 with zero uploads, not
/// an error.
pub async fn ingest(
    State(state): State<Arc<AppState>>,
    Json(body): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, (StatusCode, String)> {
    let text =
        load_text(&body.path).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let chunks = extract_chunks(&text);
    let stats = ChunkStats::from_chunks(&chunks);
    info!(
        "ingest: {} chunks from {:?} ({} chars)",
        stats.total_chunks, body.path, stats.total_chars
    );

    if chunks.is_empty() {
        return Ok(Json(IngestResponse { uploaded: 0, stats }));
    }

    let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
    let embeddings = state
        .llm_profiles
        .embed_batch(&texts)
        .await
        .map_err(|e| (StatusCode::BAD_GATEWAY, e.to_string()))?;

    let records: Vec<RuleRecord> = chunks
        .into_iter()
        .zip(embeddings)
        .map(|(chunk, embedding)| RuleRecord::from_chunk(chunk, embedding))
        .collect();

    let uploaded = state
        .store
        .upsert_rules(records)
        .await
        .map_err(|e| (StatusCode::BAD_GATEWAY, e.to_string()))?;

    Ok(Json(IngestResponse { uploaded, stats }))
}
