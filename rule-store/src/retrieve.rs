//! Retrieval helpers: per-pair metadata lookups and hybrid search.

use crate::config::RuleStoreConfig;
use crate::errors::RuleStoreError;
use crate::filters::{chart_filter, pair_filter};
use crate::qdrant_facade::QdrantFacade;
use crate::record::RetrievedRule;

use chart_engine::{Chart, House, Planet};
use futures::stream::{self, StreamExt};
use std::future::Future;
use tracing::{debug, warn};

/// Bounded concurrency for the per-pair fan-out. The pairs share no mutable
/// state, so the bound only protects the store from burst load.
const PAIR_CONCURRENCY: usize = 4;

/// Metadata-filtered retrieval: one exact-match lookup per planet/house pair
/// in the chart, up to `top_k` rules each, accumulated in pair order.
///
/// Best-effort by contract: a pair whose lookup fails is dropped with a
/// warning and must not sink the rest of the chart. The returned scores are
/// the `0.0` sentinel since no similarity ranking took place.
pub async fn query_by_chart(
    client: &QdrantFacade,
    chart: &Chart,
    top_k: u32,
) -> Vec<RetrievedRule> {
    debug!("query_by_chart over {} pairs, top_k={}", chart.len(), top_k);

    fan_out_pairs(chart, |planet, house| async move {
        let payloads = client.scroll(pair_filter(planet, house), top_k).await?;
        let rules: Result<Vec<RetrievedRule>, RuleStoreError> = payloads
            .into_iter()
            .map(|p| RetrievedRule::from_payload(0.0, p))
            .collect();
        rules
    })
    .await
}

/// Hybrid retrieval: one similarity search over the question embedding,
/// constrained to the union of the chart's planet/house pairs, globally
/// top-`top_k` by score.
///
/// Unlike [`query_by_chart`] this is a single atomic request; any store
/// error propagates. Zero matching vectors yield an empty list, not an
/// error.
pub async fn query_by_chart_and_question(
    cfg: &RuleStoreConfig,
    client: &QdrantFacade,
    chart: &Chart,
    question_embedding: Vec<f32>,
    top_k: u64,
) -> Result<Vec<RetrievedRule>, RuleStoreError> {
    if question_embedding.len() != cfg.embedding_dim {
        return Err(RuleStoreError::VectorSizeMismatch {
            got: question_embedding.len(),
            want: cfg.embedding_dim,
        });
    }

    debug!("hybrid query over {} pairs, top_k={}", chart.len(), top_k);

    let hits = client
        .search(
            question_embedding,
            top_k,
            Some(chart_filter(chart)),
            cfg.exact_search,
        )
        .await?;

    hits.into_iter()
        .map(|(score, payload)| RetrievedRule::from_payload(score, payload))
        .collect()
}

/// Fans one lookup out per chart pair with bounded concurrency, capturing
/// each pair's outcome instead of letting one failure abort the group.
/// Results keep the chart's pair-iteration order regardless of completion
/// order.
pub(crate) async fn fan_out_pairs<F, Fut>(chart: &Chart, lookup: F) -> Vec<RetrievedRule>
where
    F: Fn(Planet, House) -> Fut,
    Fut: Future<Output = Result<Vec<RetrievedRule>, RuleStoreError>>,
{
    let tasks = chart.iter().enumerate().map(|(i, (planet, house))| {
        let fut = lookup(planet, house);
        async move { (i, planet, house, fut.await) }
    });

    let mut outcomes: Vec<(usize, Planet, House, Result<Vec<RetrievedRule>, RuleStoreError>)> =
        stream::iter(tasks)
            .buffer_unordered(PAIR_CONCURRENCY)
            .collect()
            .await;
    outcomes.sort_by_key(|(i, ..)| *i);

    let mut out = Vec::new();
    for (_, planet, house, result) in outcomes {
        match result {
            Ok(rules) => out.extend(rules),
            Err(e) => warn!("could not retrieve {} in house {}: {}", planet, house, e),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::rule_id;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn chart(pairs: &[(Planet, u8)]) -> Chart {
        let houses: BTreeMap<Planet, House> = pairs
            .iter()
            .map(|(p, h)| (*p, House::new(*h).unwrap()))
            .collect();
        Chart::new(houses)
    }

    fn stub_rule(planet: Planet, house: House) -> RetrievedRule {
        RetrievedRule::from_payload(
            0.0,
            json!({
                "planet": planet.name(),
                "house": house.number(),
                "rule_id": rule_id(planet, house),
                "heading": format!("{planet} in {} House", house),
                "content": "stub",
                "char_count": 4,
            }),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn one_failing_pair_does_not_sink_the_others() {
        let chart = chart(&[(Planet::Sun, 1), (Planet::Moon, 3), (Planet::Mars, 7)]);

        let results = fan_out_pairs(&chart, |planet, house| async move {
            if planet == Planet::Moon {
                Err(RuleStoreError::Qdrant("induced failure".into()))
            } else {
                Ok(vec![stub_rule(planet, house)])
            }
        })
        .await;

        let planets: Vec<Planet> = results.iter().map(|r| r.planet).collect();
        assert_eq!(planets, vec![Planet::Sun, Planet::Mars]);
    }

    #[tokio::test]
    async fn results_keep_pair_iteration_order() {
        let chart = chart(&[
            (Planet::Sun, 1),
            (Planet::Moon, 2),
            (Planet::Mars, 3),
            (Planet::Mercury, 4),
            (Planet::Jupiter, 5),
        ]);

        // Later pairs resolve first; accumulation order must not change.
        let results = fan_out_pairs(&chart, |planet, house| async move {
            let delay = 50u64.saturating_sub(house.number() as u64 * 10);
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
            Ok(vec![stub_rule(planet, house)])
        })
        .await;

        let houses: Vec<u8> = results.iter().map(|r| r.house.number()).collect();
        assert_eq!(houses, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn all_pairs_failing_yields_empty_not_error() {
        let chart = chart(&[(Planet::Sun, 1), (Planet::Moon, 2)]);
        let results = fan_out_pairs(&chart, |_, _| async {
            Err::<Vec<RetrievedRule>, _>(RuleStoreError::Qdrant("down".into()))
        })
        .await;
        assert!(results.is_empty());
    }
}
