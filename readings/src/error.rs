//! Typed error for the readings crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReadingsError {
    /// Errors from the underlying rule-store crate.
    #[error("store error: {0}")]
    Store(#[from] rule_store::RuleStoreError),

    /// Errors from the LLM service.
    #[error("llm error: {0}")]
    Llm(#[from] llm_service::LlmError),

    /// Chart computation / geocoding errors.
    #[error("chart error: {0}")]
    Chart(#[from] chart_engine::ChartError),

    /// A model reply could not be parsed into the expected shape.
    #[error("parse error: {0}")]
    Parse(String),
}
