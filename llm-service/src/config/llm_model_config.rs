//! Universal per-profile model configuration.

use crate::config::llm_provider::LlmProvider;

/// Configuration of one model profile, provider-agnostic.
#[derive(Clone, Debug, PartialEq)]
pub struct LlmModelConfig {
    pub provider: LlmProvider,
    /// Model name, e.g. `gemini-3-flash-preview` or `text-embedding-004`.
    pub model: String,
    /// Base endpoint, e.g. `https://generativelanguage.googleapis.com`.
    pub endpoint: String,
    /// API key; required for Gemini, unused by Ollama.
    pub api_key: Option<String>,
    pub max_tokens: Option<u32>,
    /// Default sampling temperature; callers may override per request.
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub timeout_secs: Option<u64>,
}
