//! Shared LLM service with three profiles: `fast`, `slow`, and `embedding`.
//!
//! The `fast` profile runs low-temperature classification and extraction
//! calls, the `slow` profile runs reading generation, and the `embedding`
//! profile produces 768-dimensional vectors. Providers (Gemini, Ollama) sit
//! behind one config shape so the rest of the application never touches
//! provider-specific payloads.

pub mod config;
pub mod error_handler;
pub mod service_profiles;
pub mod services;

pub use config::llm_model_config::LlmModelConfig;
pub use config::llm_provider::LlmProvider;
pub use error_handler::LlmError;
pub use service_profiles::LlmServiceProfiles;
