//! Supported LLM providers.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which backend serves a profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LlmProvider {
    /// Google Gemini REST API (generation + embeddings).
    Gemini,
    /// Local Ollama server (generation + embeddings).
    Ollama,
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gemini" => Ok(LlmProvider::Gemini),
            "ollama" => Ok(LlmProvider::Ollama),
            other => Err(other.to_string()),
        }
    }
}
