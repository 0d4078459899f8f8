//! GET /chart/{session_id} — the established chart for a consultation.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;
use uuid::Uuid;

use crate::core::app_state::AppState;

#[derive(Debug, Serialize)]
pub struct ChartResponse {
    pub session_id: Uuid,
    /// Planet name → house number.
    pub placements: Vec<Placement>,
    /// Houses 1..=12 with their occupants ("Empty" when uninhabited).
    pub by_houses: String,
}

#[derive(Debug, Serialize)]
pub struct Placement {
    pub planet: String,
    pub house: u8,
}

/// Handler: GET /chart/{session_id}
pub async fn chart(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<ChartResponse>, (StatusCode, String)> {
    let sessions = state.sessions.read().await;
    let consultation = sessions
        .get(&session_id)
        .ok_or((StatusCode::NOT_FOUND, "unknown session".to_string()))?
        .clone();
    drop(sessions);

    let consultation = consultation.lock().await;
    let chart = consultation
        .chart()
        .ok_or((StatusCode::NOT_FOUND, "no chart established yet".to_string()))?;

    let placements = chart
        .iter()
        .map(|(planet, house)| Placement {
            planet: planet.name().to_string(),
            house: house.number(),
        })
        .collect();

    Ok(Json(ChartResponse {
        session_id,
        placements,
        by_houses: chart.format_by_houses(),
    }))
}
