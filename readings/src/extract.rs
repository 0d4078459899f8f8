//! Birth-data extraction from free-form chat.
//!
//! The fast model profile turns a message into either the literal
//! `non_astrology` or a JSON object with normalized `date`/`time`/`place`
//! fields. Everything that can go wrong (model failure, malformed JSON,
//! unparseable values) degrades to "no fields extracted" rather than
//! erroring the conversation; the gate's draft just stays incomplete.

use crate::ports::LanguagePort;
use crate::prompt::build_extraction_prompt;

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use std::fmt;
use tracing::{debug, warn};

/// A birth-data field the user has not supplied yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissingField {
    Date,
    Time,
    Place,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingField::Date => f.write_str("birth date"),
            MissingField::Time => f.write_str("birth time"),
            MissingField::Place => f.write_str("birth place"),
        }
    }
}

/// Normalized birth fields found in one message. Any subset may be present;
/// the gate accumulates them into its draft.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExtractedFields {
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub place: Option<String>,
}

/// Classification of one inbound message while awaiting birth data.
#[derive(Clone, Debug, PartialEq)]
pub enum ExtractionSignal {
    /// The message supplies birth details (possibly none parseable).
    Fields(ExtractedFields),
    /// The message is not about providing birth details.
    NonAstrology,
}

/// Classifies `message` via the fast model profile.
///
/// A model failure is not surfaced: the signal degrades to empty fields and
/// the user is simply asked again.
pub async fn extract_birth_fields(lang: &dyn LanguagePort, message: &str) -> ExtractionSignal {
    let prompt = build_extraction_prompt(message);
    match lang.complete_fast(&prompt).await {
        Ok(reply) => parse_extraction_reply(&reply),
        Err(e) => {
            warn!("birth-data extraction failed: {e}; treating as no fields");
            ExtractionSignal::Fields(ExtractedFields::default())
        }
    }
}

/// Raw field shape the extraction prompt demands.
#[derive(Debug, Deserialize)]
struct RawFields {
    date: Option<String>,
    time: Option<String>,
    place: Option<String>,
}

/// Parses a model reply into an [`ExtractionSignal`].
///
/// Accepts the sentinel `non_astrology` (bare or quoted), optionally fenced
/// JSON, and treats any unparseable reply or field value as absent data.
pub fn parse_extraction_reply(reply: &str) -> ExtractionSignal {
    let cleaned = strip_fences(reply).trim().to_string();

    if cleaned
        .trim_matches('"')
        .eq_ignore_ascii_case("non_astrology")
    {
        return ExtractionSignal::NonAstrology;
    }

    let raw: RawFields = match serde_json::from_str(&cleaned) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("unparseable extraction reply ({e}); treating as no fields");
            return ExtractionSignal::Fields(ExtractedFields::default());
        }
    };

    let fields = ExtractedFields {
        date: raw
            .date
            .as_deref()
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()),
        time: raw.time.as_deref().and_then(parse_clock_time),
        place: raw
            .place
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    };

    debug!(
        "extracted fields: date={} time={} place={}",
        fields.date.is_some(),
        fields.time.is_some(),
        fields.place.is_some()
    );
    ExtractionSignal::Fields(fields)
}

fn parse_clock_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .ok()
}

/// Drops a wrapping markdown code fence if the model added one.
fn strip_fences(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_only_reply_yields_just_the_date() {
        // Model reply for "born 16 jan 2004".
        let signal = parse_extraction_reply(r#"{"date": "2004-01-16", "time": null, "place": null}"#);
        match signal {
            ExtractionSignal::Fields(fields) => {
                assert_eq!(fields.date.unwrap().to_string(), "2004-01-16");
                assert!(fields.time.is_none());
                assert!(fields.place.is_none());
            }
            other => panic!("expected fields, got {other:?}"),
        }
    }

    #[test]
    fn full_reply_yields_all_fields() {
        let signal = parse_extraction_reply(
            r#"{"date": "2004-01-16", "time": "10:30", "place": "Ahmedabad"}"#,
        );
        match signal {
            ExtractionSignal::Fields(fields) => {
                assert_eq!(fields.time.unwrap().to_string(), "10:30:00");
                assert_eq!(fields.place.as_deref(), Some("Ahmedabad"));
            }
            other => panic!("expected fields, got {other:?}"),
        }
    }

    #[test]
    fn sentinel_is_non_astrology() {
        assert_eq!(
            parse_extraction_reply("non_astrology"),
            ExtractionSignal::NonAstrology
        );
        assert_eq!(
            parse_extraction_reply("\"NON_ASTROLOGY\""),
            ExtractionSignal::NonAstrology
        );
    }

    #[test]
    fn fenced_json_is_accepted() {
        let reply =
            "```json\n{\"date\": \"1990-01-15\", \"time\": \"14:30\", \"place\": \"Mumbai\"}\n```";
        match parse_extraction_reply(reply) {
            ExtractionSignal::Fields(fields) => assert!(fields.date.is_some()),
            other => panic!("expected fields, got {other:?}"),
        }
    }

    #[test]
    fn garbage_degrades_to_no_fields() {
        assert_eq!(
            parse_extraction_reply("I could not parse that, sorry!"),
            ExtractionSignal::Fields(ExtractedFields::default())
        );
    }

    #[test]
    fn unparseable_values_count_as_absent() {
        let signal =
            parse_extraction_reply(r#"{"date": "16/01/2004", "time": "10:30", "place": "Mumbai"}"#);
        match signal {
            ExtractionSignal::Fields(fields) => {
                assert!(fields.date.is_none());
                assert!(fields.time.is_some());
            }
            other => panic!("expected fields, got {other:?}"),
        }
    }
}
