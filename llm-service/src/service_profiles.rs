//! Shared LLM service with three active profiles: `fast`, `slow`, and
//! `embedding`.
//!
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Provider clients are built eagerly from the profile configs.
//! - If the `slow` profile is not provided, it falls back to `fast`.

use crate::config::default_config::profiles_from_env;
use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::Result;
use crate::services::gemini_service::GeminiService;
use crate::services::ollama_service::OllamaService;

/// One provider client, dispatched by the profile's configuration.
enum ProviderClient {
    Gemini(GeminiService),
    Ollama(OllamaService),
}

impl ProviderClient {
    fn new(cfg: &LlmModelConfig) -> Result<Self> {
        match cfg.provider {
            LlmProvider::Gemini => Ok(ProviderClient::Gemini(GeminiService::new(cfg.clone())?)),
            LlmProvider::Ollama => Ok(ProviderClient::Ollama(OllamaService::new(cfg.clone())?)),
        }
    }

    async fn generate(&self, prompt: &str, temperature: Option<f32>) -> Result<String> {
        match self {
            ProviderClient::Gemini(cli) => cli.generate(prompt, temperature).await,
            ProviderClient::Ollama(cli) => cli.generate(prompt, temperature).await,
        }
    }

    async fn embed(&self, input: &str) -> Result<Vec<f32>> {
        match self {
            ProviderClient::Gemini(cli) => cli.embeddings(input).await,
            ProviderClient::Ollama(cli) => cli.embeddings(input).await,
        }
    }

    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        match self {
            ProviderClient::Gemini(cli) => cli.embeddings_batch(inputs).await,
            // Ollama has no batch endpoint; issue sequential calls, first
            // failure aborts the rest.
            ProviderClient::Ollama(cli) => {
                let mut out = Vec::with_capacity(inputs.len());
                for input in inputs {
                    out.push(cli.embeddings(input).await?);
                }
                Ok(out)
            }
        }
    }
}

/// Shared service that manages the **fast**, **slow** and **embedding**
/// profiles.
pub struct LlmServiceProfiles {
    fast: ProviderClient,
    slow: ProviderClient,
    embedding: ProviderClient,
}

impl LlmServiceProfiles {
    /// Creates a new service with three profiles.
    ///
    /// - `fast`: required low-temperature profile (classification,
    ///   extraction).
    /// - `slow_opt`: optional generation profile (quality). `None` falls
    ///   back to `fast`.
    /// - `embedding`: required embedding profile.
    ///
    /// # Errors
    /// Returns [`LlmError`] if any provider client cannot be built.
    pub fn new(
        fast: LlmModelConfig,
        slow_opt: Option<LlmModelConfig>,
        embedding: LlmModelConfig,
    ) -> Result<Self> {
        let slow_cfg = slow_opt.unwrap_or_else(|| fast.clone());

        Ok(Self {
            fast: ProviderClient::new(&fast)?,
            slow: ProviderClient::new(&slow_cfg)?,
            embedding: ProviderClient::new(&embedding)?,
        })
    }

    /// Builds the service from environment variables (see
    /// [`crate::config::default_config`]).
    ///
    /// # Errors
    /// Propagates config errors (missing API key, bad endpoint).
    pub fn from_env() -> Result<Self> {
        let set = profiles_from_env()?;
        Self::new(set.fast, set.slow, set.embedding)
    }

    /// Completion on the **fast** profile at its configured temperature.
    ///
    /// # Errors
    /// Returns [`LlmError`] if generation fails.
    pub async fn complete_fast(&self, prompt: &str) -> Result<String> {
        self.fast.generate(prompt, None).await
    }

    /// Completion on the **slow** profile; `temperature` overrides the
    /// profile default for this call.
    ///
    /// # Errors
    /// Returns [`LlmError`] if generation fails.
    pub async fn complete_slow(&self, prompt: &str, temperature: Option<f32>) -> Result<String> {
        self.slow.generate(prompt, temperature).await
    }

    /// One embedding vector via the **embedding** profile.
    ///
    /// # Errors
    /// Returns [`LlmError`] if embedding fails.
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>> {
        self.embedding.embed(input).await
    }

    /// Embeddings for several texts; the first failure aborts the batch.
    ///
    /// # Errors
    /// Returns [`LlmError`] if any embedding call fails.
    pub async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        self.embedding.embed_batch(inputs).await
    }
}
