//! Filter construction for Qdrant queries.
//!
//! Two shapes are used: an AND filter for one planet/house pair, and an OR
//! of those AND groups covering every pair in a chart.

use chart_engine::{Chart, House, Planet};
use qdrant_client::qdrant::{
    Condition, FieldCondition, Filter, Match, condition::ConditionOneOf, r#match::MatchValue,
};
use tracing::debug;

fn eq_keyword(field: &str, value: &str) -> Condition {
    Condition {
        condition_one_of: Some(ConditionOneOf::Field(FieldCondition {
            key: field.to_string(),
            r#match: Some(Match {
                match_value: Some(MatchValue::Keyword(value.to_string())),
            }),
            ..Default::default()
        })),
    }
}

fn eq_integer(field: &str, value: i64) -> Condition {
    Condition {
        condition_one_of: Some(ConditionOneOf::Field(FieldCondition {
            key: field.to_string(),
            r#match: Some(Match {
                match_value: Some(MatchValue::Integer(value)),
            }),
            ..Default::default()
        })),
    }
}

/// Exact-equality filter for one planet/house pair:
/// `planet = <name> AND house = <n>`.
pub fn pair_filter(planet: Planet, house: House) -> Filter {
    Filter {
        must: vec![
            eq_keyword("planet", planet.name()),
            eq_integer("house", house.number() as i64),
        ],
        ..Default::default()
    }
}

/// Union filter over every pair in the chart:
/// `(planet=Sun AND house=10) OR (planet=Moon AND house=6) OR ...`.
pub fn chart_filter(chart: &Chart) -> Filter {
    let should: Vec<Condition> = chart
        .iter()
        .map(|(planet, house)| Condition {
            condition_one_of: Some(ConditionOneOf::Filter(pair_filter(planet, house))),
        })
        .collect();

    debug!("chart_filter over {} pairs", should.len());

    Filter {
        should,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn pair_filter_requires_both_fields() {
        let f = pair_filter(Planet::Sun, House::new(10).unwrap());
        assert_eq!(f.must.len(), 2);
        assert!(f.should.is_empty());
    }

    #[test]
    fn chart_filter_is_or_of_pair_groups() {
        let mut houses = BTreeMap::new();
        houses.insert(Planet::Sun, House::new(10).unwrap());
        houses.insert(Planet::Moon, House::new(6).unwrap());
        let chart = Chart::new(houses);

        let f = chart_filter(&chart);
        assert_eq!(f.should.len(), 2);
        assert!(f.must.is_empty());
        for cond in &f.should {
            match &cond.condition_one_of {
                Some(ConditionOneOf::Filter(inner)) => assert_eq!(inner.must.len(), 2),
                other => panic!("expected nested filter, got {other:?}"),
            }
        }
    }
}
