//! Shared state for all HTTP handlers.

use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;

use chart_engine::{ChartCalculator, HttpEphemeris, NominatimGeocoder};
use llm_service::LlmServiceProfiles;
use readings::ports::ChartPort;
use readings::{Consultation, ReadingsConfig};
use rule_store::{RuleStore, RuleStoreConfig};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// Shared state for all HTTP handlers.
pub struct AppState {
    pub cfg: ReadingsConfig,
    pub llm_profiles: Arc<LlmServiceProfiles>,
    pub store: Arc<RuleStore>,
    pub charts: Arc<dyn ChartPort>,
    /// In-memory consultations; sessions die with the process.
    pub sessions: RwLock<HashMap<Uuid, Arc<Mutex<Consultation>>>>,
}

impl AppState {
    /// Load shared state from environment variables.
    pub fn from_env() -> Result<Self, Box<dyn Error>> {
        let llm_profiles = Arc::new(LlmServiceProfiles::from_env()?);

        let mut store_cfg = RuleStoreConfig::new_default(
            std::env::var("QDRANT_URL").unwrap_or_else(|_| "http://localhost:6334".into()),
            std::env::var("QDRANT_COLLECTION").unwrap_or_else(|_| "lal-kitab-rules".into()),
        );
        store_cfg.qdrant_api_key = std::env::var("QDRANT_API_KEY").ok();
        let store = Arc::new(RuleStore::new(store_cfg)?);

        let ephemeris = HttpEphemeris::new(
            &std::env::var("EPHEMERIS_URL").unwrap_or_else(|_| "http://localhost:8010".into()),
        )?;
        let geocoder = NominatimGeocoder::new()?;
        let charts: Arc<dyn ChartPort> = Arc::new(ChartCalculator::new(ephemeris, geocoder));

        Ok(Self {
            cfg: ReadingsConfig::from_env(),
            llm_profiles,
            store,
            charts,
            sessions: RwLock::new(HashMap::new()),
        })
    }

    /// Returns the consultation for `session_id`, creating a fresh one when
    /// the id is unknown or absent.
    pub async fn session(&self, session_id: Option<Uuid>) -> (Uuid, Arc<Mutex<Consultation>>) {
        if let Some(id) = session_id {
            if let Some(existing) = self.sessions.read().await.get(&id) {
                return (id, existing.clone());
            }
        }

        let id = session_id.unwrap_or_else(Uuid::new_v4);
        let consultation = Arc::new(Mutex::new(Consultation::new(
            self.cfg.clone(),
            self.llm_profiles.clone(),
            self.store.clone(),
            self.charts.clone(),
        )));
        self.sessions
            .write()
            .await
            .insert(id, consultation.clone());
        (id, consultation)
    }
}
