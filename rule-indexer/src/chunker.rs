//! Partitioning a document into per-heading chunks.

use crate::headings::{HeadingMatcher, HeadingOccurrence};
use chart_engine::{House, Planet};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A contiguous span of rule text owned by one planet/house heading.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub planet: Planet,
    pub house: House,
    /// The heading text as it appeared in the source.
    pub heading: String,
    /// Trimmed text from this heading up to the next one (or document end).
    pub content: String,
    pub char_count: usize,
}

/// Aggregate statistics over an extraction pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkStats {
    pub total_chunks: usize,
    pub total_chars: usize,
    /// Integer-truncated mean.
    pub avg_chars_per_chunk: usize,
    pub planets_covered: Vec<Planet>,
    pub houses_covered: Vec<House>,
}

impl ChunkStats {
    pub fn from_chunks(chunks: &[Chunk]) -> Self {
        if chunks.is_empty() {
            return Self {
                total_chunks: 0,
                total_chars: 0,
                avg_chars_per_chunk: 0,
                planets_covered: Vec::new(),
                houses_covered: Vec::new(),
            };
        }

        let total_chars: usize = chunks.iter().map(|c| c.char_count).sum();

        let mut planets: Vec<Planet> = chunks.iter().map(|c| c.planet).collect();
        planets.sort();
        planets.dedup();

        let mut houses: Vec<House> = chunks.iter().map(|c| c.house).collect();
        houses.sort();
        houses.dedup();

        Self {
            total_chunks: chunks.len(),
            total_chars,
            avg_chars_per_chunk: total_chars / chunks.len(),
            planets_covered: planets,
            houses_covered: houses,
        }
    }
}

/// Extracts one chunk per heading occurrence.
///
/// Each chunk spans from its heading's start offset to the start of the next
/// heading (document end for the last one), then trims surrounding
/// whitespace. Text before the first heading is preamble and is discarded.
/// An empty heading list yields an empty chunk list; callers must treat that
/// as "no extractable content", not as a failure.
pub fn extract_chunks(text: &str) -> Vec<Chunk> {
    let headings = HeadingMatcher::new().find_headings(text);
    chunks_between(text, &headings)
}

fn chunks_between(text: &str, headings: &[HeadingOccurrence]) -> Vec<Chunk> {
    let mut chunks = Vec::with_capacity(headings.len());

    for (i, heading) in headings.iter().enumerate() {
        let end = headings
            .get(i + 1)
            .map(|next| next.start)
            .unwrap_or(text.len());

        let content = text[heading.start..end].trim();

        chunks.push(Chunk {
            planet: heading.planet,
            house: heading.house,
            heading: heading.raw.trim().to_string(),
            content: content.to_string(),
            char_count: content.chars().count(),
        });
    }

    debug!("extracted {} chunks from {} bytes", chunks.len(), text.len());
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Preamble the chunker must discard.

Sun in 1st House
Benefic: The native will be good and wealthy.
Malefic: Health problems may occur.

Moon in 3rd House
Benefic: Intelligent and wise.
Malefic: Mental stress possible.
";

    #[test]
    fn two_headings_give_two_chunks_with_exact_boundary() {
        let chunks = extract_chunks(SAMPLE);
        assert_eq!(chunks.len(), 2);

        let sun = &chunks[0];
        assert_eq!(sun.planet, Planet::Sun);
        assert_eq!(sun.house.number(), 1);
        assert!(sun.content.starts_with("Sun in 1st House"));
        // The Sun chunk ends exactly before the Moon heading begins.
        assert!(sun.content.ends_with("Health problems may occur."));
        assert!(!sun.content.contains("Moon in 3rd House"));

        let moon = &chunks[1];
        assert_eq!(moon.planet, Planet::Moon);
        assert_eq!(moon.house.number(), 3);
        assert!(moon.content.starts_with("Moon in 3rd House"));
        assert!(moon.content.ends_with("Mental stress possible."));
    }

    #[test]
    fn chunks_cover_headings_to_document_end_without_overlap() {
        let headings = HeadingMatcher::new().find_headings(SAMPLE);
        assert_eq!(headings.len(), 2);

        // Span starts are the heading starts; each span ends where the next
        // begins, the last at document end.
        assert!(headings[0].start < headings[1].start);
        let first_span = &SAMPLE[headings[0].start..headings[1].start];
        let second_span = &SAMPLE[headings[1].start..];
        assert_eq!(
            first_span.len() + second_span.len(),
            SAMPLE.len() - headings[0].start
        );
    }

    #[test]
    fn content_is_at_least_the_heading() {
        for chunk in extract_chunks("Venus in 2nd House") {
            assert!(chunk.content.len() >= chunk.heading.len());
        }
    }

    #[test]
    fn no_headings_means_no_chunks() {
        assert!(extract_chunks("just ordinary prose").is_empty());
        assert!(extract_chunks("").is_empty());
    }

    #[test]
    fn stats_aggregate_and_dedup() {
        let text = "\
Sun in 1st House
aaaa
Sun in 1st House
bb
Moon in 2nd House
cc
";
        let chunks = extract_chunks(text);
        assert_eq!(chunks.len(), 3);

        let stats = ChunkStats::from_chunks(&chunks);
        assert_eq!(stats.total_chunks, 3);
        assert_eq!(stats.planets_covered, vec![Planet::Sun, Planet::Moon]);
        assert_eq!(stats.houses_covered.len(), 2);
        let manual_total: usize = chunks.iter().map(|c| c.char_count).sum();
        assert_eq!(stats.total_chars, manual_total);
        assert_eq!(stats.avg_chars_per_chunk, manual_total / 3);
    }

    #[test]
    fn empty_stats_are_zeroed() {
        let stats = ChunkStats::from_chunks(&[]);
        assert_eq!(stats.total_chunks, 0);
        assert_eq!(stats.avg_chars_per_chunk, 0);
        assert!(stats.planets_covered.is_empty());
    }
}
