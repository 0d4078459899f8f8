//! Gemini REST client for text generation and embeddings.
//!
//! Endpoints used:
//! - `POST {endpoint}/v1beta/models/{model}:generateContent` — generation
//! - `POST {endpoint}/v1beta/models/{model}:embedContent` — one embedding
//! - `POST {endpoint}/v1beta/models/{model}:batchEmbedContents` — batch
//!
//! The API key is passed via the `x-goog-api-key` header.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{ConfigError, LlmError, Result};

/// Thin client for the Gemini REST API.
pub struct GeminiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    api_key: String,
    base: String,
}

impl GeminiService {
    /// Creates a new service from the given config.
    ///
    /// # Errors
    /// - [`ConfigError::UnsupportedProvider`] if the provider is not Gemini
    /// - [`ConfigError::MissingVar`] if no API key is configured
    /// - [`ConfigError::InvalidFormat`] for a malformed endpoint
    pub fn new(cfg: LlmModelConfig) -> Result<Self> {
        if cfg.provider != LlmProvider::Gemini {
            return Err(ConfigError::UnsupportedProvider("expected gemini".into()).into());
        }

        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ConfigError::InvalidFormat {
                var: "endpoint",
                reason: "must start with http:// or https://",
            }
            .into());
        }

        let api_key = cfg
            .api_key
            .clone()
            .ok_or(ConfigError::MissingVar("GEMINI_API_KEY"))?;

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base = format!("{}/v1beta/models", endpoint.trim_end_matches('/'));

        Ok(Self {
            client,
            cfg,
            api_key,
            base,
        })
    }

    /// Non-streaming text generation.
    ///
    /// `temperature` overrides the profile default for this call.
    ///
    /// # Errors
    /// - [`LlmError::HttpStatus`] for non-2xx responses
    /// - [`LlmError::Decode`] when no candidate text comes back
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn generate(&self, prompt: &str, temperature: Option<f32>) -> Result<String> {
        let url = format!("{}/{}:generateContent", self.base, self.cfg.model);

        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: Some(GenerationConfig {
                temperature: temperature.or(self.cfg.temperature),
                top_p: self.cfg.top_p,
                max_output_tokens: self.cfg.max_tokens,
            }),
        };

        debug!("POST {}", url);
        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let resp = check_status(resp, &url).await?;
        let out: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Decode(format!("serde error: {e}")))?;

        out.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| LlmError::Decode("empty candidate list".into()))
    }

    /// One embedding vector for `input`.
    ///
    /// # Errors
    /// Same classes as [`GeminiService::generate`].
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn embeddings(&self, input: &str) -> Result<Vec<f32>> {
        let url = format!("{}/{}:embedContent", self.base, self.cfg.model);

        let body = EmbedRequest {
            content: OwnedContent {
                parts: vec![OwnedPart {
                    text: input.to_string(),
                }],
            },
        };

        debug!("POST {}", url);
        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let resp = check_status(resp, &url).await?;
        let out: EmbedResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Decode(format!("serde error: {e}")))?;

        Ok(out.embedding.values)
    }

    /// Embeddings for several texts in one request.
    ///
    /// # Errors
    /// [`LlmError::Decode`] when the response count does not match the
    /// request count, plus the usual transport classes.
    #[instrument(skip_all, fields(model = %self.cfg.model, count = inputs.len()))]
    pub async fn embeddings_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/{}:batchEmbedContents", self.base, self.cfg.model);
        let model_path = format!("models/{}", self.cfg.model);

        let body = BatchEmbedRequest {
            requests: inputs
                .iter()
                .map(|text| EmbedRequestEntry {
                    model: model_path.clone(),
                    content: OwnedContent {
                        parts: vec![OwnedPart { text: text.clone() }],
                    },
                })
                .collect(),
        };

        debug!("POST {}", url);
        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let resp = check_status(resp, &url).await?;
        let out: BatchEmbedResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Decode(format!("serde error: {e}")))?;

        if out.embeddings.len() != inputs.len() {
            return Err(LlmError::Decode(format!(
                "expected {} embeddings, got {}",
                inputs.len(),
                out.embeddings.len()
            )));
        }

        Ok(out.embeddings.into_iter().map(|e| e.values).collect())
    }
}

async fn check_status(resp: reqwest::Response, url: &str) -> Result<reqwest::Response> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    let snippet = text.chars().take(240).collect::<String>();
    Err(LlmError::HttpStatus {
        status,
        url: url.to_string(),
        snippet,
    })
}

/* ==========================
HTTP payloads
========================== */

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(rename = "topP", skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: String,
}

#[derive(Debug, Serialize)]
struct EmbedRequest {
    content: OwnedContent,
}

#[derive(Debug, Serialize)]
struct OwnedContent {
    parts: Vec<OwnedPart>,
}

#[derive(Debug, Serialize)]
struct OwnedPart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct BatchEmbedRequest {
    requests: Vec<EmbedRequestEntry>,
}

#[derive(Debug, Serialize)]
struct EmbedRequestEntry {
    model: String,
    content: OwnedContent,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<EmbeddingValues>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Gemini,
            model: "gemini-3-flash-preview".into(),
            endpoint: "https://generativelanguage.googleapis.com".into(),
            api_key: Some("test-key".into()),
            max_tokens: None,
            temperature: Some(0.1),
            top_p: None,
            timeout_secs: Some(5),
        }
    }

    #[test]
    fn rejects_missing_api_key() {
        let mut c = cfg();
        c.api_key = None;
        assert!(GeminiService::new(c).is_err());
    }

    #[test]
    fn rejects_wrong_provider() {
        let mut c = cfg();
        c.provider = LlmProvider::Ollama;
        assert!(GeminiService::new(c).is_err());
    }

    #[test]
    fn response_shapes_decode() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"hello"}],"role":"model"}}]}"#;
        let out: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(out.candidates[0].content.parts[0].text, "hello");

        let raw = r#"{"embeddings":[{"values":[0.1,0.2]},{"values":[0.3,0.4]}]}"#;
        let out: BatchEmbedResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(out.embeddings.len(), 2);
    }
}
