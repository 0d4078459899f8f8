//! The retrieval orchestrator: which rules ground which answer.

use crate::cfg::ReadingsConfig;
use crate::error::ReadingsError;
use crate::ports::{LanguagePort, RuleSearch};

use chart_engine::Chart;
use rule_store::RetrievedRule;
use tracing::{debug, info};

/// Broad retrieval for the initial reading: every rule matching one of the
/// chart's planet/house pairs, `chart_top_k` per pair.
///
/// An empty result is a first-class outcome (the knowledge base may simply
/// hold nothing yet); callers must render "no data", not an error.
pub async fn retrieve_for_chart(
    search: &dyn RuleSearch,
    cfg: &ReadingsConfig,
    chart: &Chart,
) -> Vec<RetrievedRule> {
    let rules = search.by_chart(chart, cfg.chart_top_k).await;
    info!("retrieved {} rules for chart summary", rules.len());
    rules
}

/// Focused retrieval for a follow-up question: embed the question, then run
/// one hybrid search constrained to the chart's pairs.
///
/// # Errors
/// Embedding and store failures propagate; unlike the per-pair chart query
/// there is no best-effort fallback here.
pub async fn retrieve_for_question(
    search: &dyn RuleSearch,
    lang: &dyn LanguagePort,
    cfg: &ReadingsConfig,
    chart: &Chart,
    question: &str,
    top_k: Option<u64>,
) -> Result<Vec<RetrievedRule>, ReadingsError> {
    let top_k = top_k.unwrap_or(cfg.question_top_k);

    let embedding = lang.embed(question).await?;
    debug!(
        "question embedded ({} dims), hybrid top_k={}",
        embedding.len(),
        top_k
    );

    let rules = search.by_chart_and_question(chart, embedding, top_k).await?;
    info!("retrieved {} rules for question", rules.len());
    Ok(rules)
}
