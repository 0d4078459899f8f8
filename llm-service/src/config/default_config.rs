//! Environment-driven profile construction.
//!
//! Variables, per profile prefix (`LLM_FAST`, `LLM_SLOW`, `LLM_EMBEDDING`):
//! `<PREFIX>_PROVIDER`, `<PREFIX>_MODEL`, `<PREFIX>_ENDPOINT`,
//! `<PREFIX>_TEMPERATURE`. The Gemini API key comes from `GEMINI_API_KEY`.
//! Unset values fall back to Gemini defaults; the slow profile falls back to
//! the fast one entirely.

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{ConfigError, Result, must_env, validate_http_endpoint};

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
const GEMINI_GENERATION_MODEL: &str = "gemini-3-flash-preview";
const GEMINI_EMBEDDING_MODEL: &str = "text-embedding-004";

/// The three profiles loaded from the environment.
#[derive(Clone, Debug)]
pub struct ProfileSet {
    pub fast: LlmModelConfig,
    pub slow: Option<LlmModelConfig>,
    pub embedding: LlmModelConfig,
}

/// Loads all profiles from environment variables.
///
/// # Errors
/// Returns [`ConfigError`] variants for a missing Gemini key, unsupported
/// provider names or malformed endpoints.
pub fn profiles_from_env() -> Result<ProfileSet> {
    let fast = profile_from_env("LLM_FAST", GEMINI_GENERATION_MODEL, 0.1)?;
    let slow = match std::env::var("LLM_SLOW_MODEL") {
        Ok(_) => Some(profile_from_env("LLM_SLOW", GEMINI_GENERATION_MODEL, 0.7)?),
        Err(_) => None,
    };
    let embedding = profile_from_env("LLM_EMBEDDING", GEMINI_EMBEDDING_MODEL, 0.0)?;
    Ok(ProfileSet {
        fast,
        slow,
        embedding,
    })
}

fn profile_from_env(
    prefix: &'static str,
    default_model: &str,
    default_temperature: f32,
) -> Result<LlmModelConfig> {
    let provider = match env_opt(&format!("{prefix}_PROVIDER")) {
        Some(raw) => raw
            .parse::<LlmProvider>()
            .map_err(ConfigError::UnsupportedProvider)?,
        None => LlmProvider::Gemini,
    };

    let model = env_opt(&format!("{prefix}_MODEL")).unwrap_or_else(|| default_model.to_string());
    if model.trim().is_empty() {
        return Err(ConfigError::EmptyModel.into());
    }

    let endpoint = env_opt(&format!("{prefix}_ENDPOINT")).unwrap_or_else(|| match provider {
        LlmProvider::Gemini => GEMINI_ENDPOINT.to_string(),
        LlmProvider::Ollama => "http://localhost:11434".to_string(),
    });
    validate_http_endpoint("endpoint", &endpoint)?;

    let api_key = match provider {
        LlmProvider::Gemini => Some(must_env("GEMINI_API_KEY")?),
        LlmProvider::Ollama => None,
    };

    let temperature = env_opt(&format!("{prefix}_TEMPERATURE"))
        .and_then(|v| v.parse::<f32>().ok())
        .or(Some(default_temperature));

    Ok(LlmModelConfig {
        provider,
        model,
        endpoint,
        api_key,
        max_tokens: None,
        temperature,
        top_p: None,
        timeout_secs: Some(30),
    })
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
