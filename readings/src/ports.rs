//! Capability ports for external collaborators.
//!
//! The language model, the rule store and chart computation are all
//! non-deterministic external calls; the gate and the retrieval logic only
//! see these traits, so unit tests can plug in deterministic stubs.

use crate::error::ReadingsError;
use chart_engine::{BirthData, Chart, ChartCalculator, ChartError, Ephemeris, Geocoder};
use rule_store::{RetrievedRule, RuleStore};
use std::{future::Future, pin::Pin};

/// Boxed future alias used by the port traits.
pub type BoxFut<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Language model port: fast completions for classification/extraction,
/// slow completions for generation, plus query embeddings.
pub trait LanguagePort: Send + Sync {
    fn complete_fast<'a>(&'a self, prompt: &'a str) -> BoxFut<'a, Result<String, ReadingsError>>;

    fn complete_slow<'a>(
        &'a self,
        prompt: &'a str,
        temperature: Option<f32>,
    ) -> BoxFut<'a, Result<String, ReadingsError>>;

    fn embed<'a>(&'a self, text: &'a str) -> BoxFut<'a, Result<Vec<f32>, ReadingsError>>;
}

impl LanguagePort for llm_service::LlmServiceProfiles {
    fn complete_fast<'a>(&'a self, prompt: &'a str) -> BoxFut<'a, Result<String, ReadingsError>> {
        Box::pin(async move { Ok(self.complete_fast(prompt).await?) })
    }

    fn complete_slow<'a>(
        &'a self,
        prompt: &'a str,
        temperature: Option<f32>,
    ) -> BoxFut<'a, Result<String, ReadingsError>> {
        Box::pin(async move { Ok(self.complete_slow(prompt, temperature).await?) })
    }

    fn embed<'a>(&'a self, text: &'a str) -> BoxFut<'a, Result<Vec<f32>, ReadingsError>> {
        Box::pin(async move { Ok(self.embed(text).await?) })
    }
}

/// Rule store port, mirroring the two store query shapes.
pub trait RuleSearch: Send + Sync {
    /// Best-effort per-pair metadata retrieval; never fails, degraded pairs
    /// are simply absent.
    fn by_chart<'a>(&'a self, chart: &'a Chart, top_k: u32) -> BoxFut<'a, Vec<RetrievedRule>>;

    /// Atomic hybrid retrieval; store errors propagate.
    fn by_chart_and_question<'a>(
        &'a self,
        chart: &'a Chart,
        question_embedding: Vec<f32>,
        top_k: u64,
    ) -> BoxFut<'a, Result<Vec<RetrievedRule>, ReadingsError>>;
}

impl RuleSearch for RuleStore {
    fn by_chart<'a>(&'a self, chart: &'a Chart, top_k: u32) -> BoxFut<'a, Vec<RetrievedRule>> {
        Box::pin(self.query_by_chart(chart, top_k))
    }

    fn by_chart_and_question<'a>(
        &'a self,
        chart: &'a Chart,
        question_embedding: Vec<f32>,
        top_k: u64,
    ) -> BoxFut<'a, Result<Vec<RetrievedRule>, ReadingsError>> {
        Box::pin(async move {
            Ok(self
                .query_by_chart_and_question(chart, question_embedding, top_k)
                .await?)
        })
    }
}

/// Chart computation port.
pub trait ChartPort: Send + Sync {
    fn compute<'a>(&'a self, birth: &'a BirthData) -> BoxFut<'a, Result<Chart, ChartError>>;
}

impl<E, G> ChartPort for ChartCalculator<E, G>
where
    E: Ephemeris,
    G: Geocoder,
{
    fn compute<'a>(&'a self, birth: &'a BirthData) -> BoxFut<'a, Result<Chart, ChartError>> {
        Box::pin(self.compute(birth))
    }
}
