//! Planet/house heading detection.

use chart_engine::{House, Planet};
use regex::Regex;
use tracing::{trace, warn};

/// Pattern for `<Planet> in <N>(st|nd|rd|th) House` headings.
///
/// Line-anchored (leading whitespace allowed) so prose mentioning a
/// combination mid-sentence is not mistaken for a heading. The bare ordinal
/// `I` is the roman numeral for house 1, common in scanned editions.
const HEADING_PATTERN: &str =
    r"(?mi)^[ \t]*(sun|moon|mars|mercury|jupiter|venus|saturn|rahu|ketu)\s+in\s+(\d+|I)(?:st|nd|rd|th)?\s+house";

/// A located heading match inside a source document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeadingOccurrence {
    pub planet: Planet,
    pub house: House,
    /// Byte offset of the match start in the document.
    pub start: usize,
    /// Byte offset one past the match end.
    pub end: usize,
    /// The heading text exactly as matched.
    pub raw: String,
}

/// Scans documents for planet/house headings.
///
/// Each scan starts from scratch; there is no shared state between calls, so
/// results are order-stable and repeatable.
pub struct HeadingMatcher {
    pattern: Regex,
}

impl Default for HeadingMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadingMatcher {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(HEADING_PATTERN).unwrap(),
        }
    }

    /// All heading occurrences in `text`, ordered by position.
    ///
    /// A document without headings yields an empty vector, not an error.
    /// Headings whose ordinal falls outside 1..=12 are skipped with a
    /// warning.
    pub fn find_headings(&self, text: &str) -> Vec<HeadingOccurrence> {
        let mut out = Vec::new();

        for caps in self.pattern.captures_iter(text) {
            let whole = caps.get(0).unwrap();
            let planet_raw = caps.get(1).unwrap().as_str();
            let house_raw = caps.get(2).unwrap().as_str();

            // The alternation only admits vocabulary planet names.
            let planet: Planet = planet_raw.parse().unwrap();

            let number = if house_raw.eq_ignore_ascii_case("I") {
                1
            } else {
                match house_raw.parse::<u8>() {
                    Ok(n) => n,
                    Err(_) => {
                        warn!("unparseable house ordinal '{}' in heading", house_raw);
                        continue;
                    }
                }
            };
            let house = match House::new(number) {
                Ok(h) => h,
                Err(_) => {
                    warn!("house {} out of range in heading '{}'", number, whole.as_str());
                    continue;
                }
            };

            // The heading keeps its source casing; the anchored match may
            // include leading indentation, which we do not strip here since
            // offsets must stay span-accurate.
            out.push(HeadingOccurrence {
                planet,
                house,
                start: whole.start(),
                end: whole.end(),
                raw: whole.as_str().to_string(),
            });
        }

        trace!("find_headings: {} occurrences", out.len());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_ordinals_and_roman_one() {
        let matcher = HeadingMatcher::new();
        let text = "Sun in 1st House\ncontent\nMoon in 3rd house\nmore\nMars in I House\n";
        let found = matcher.find_headings(text);
        assert_eq!(found.len(), 3);
        assert_eq!(found[0].planet, Planet::Sun);
        assert_eq!(found[0].house.number(), 1);
        assert_eq!(found[1].planet, Planet::Moon);
        assert_eq!(found[1].house.number(), 3);
        assert_eq!(found[2].planet, Planet::Mars);
        assert_eq!(found[2].house.number(), 1);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let matcher = HeadingMatcher::new();
        let found = matcher.find_headings("SATURN in 7TH HOUSE\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].planet, Planet::Saturn);
        assert_eq!(found[0].house.number(), 7);
    }

    #[test]
    fn headings_must_start_a_line() {
        let matcher = HeadingMatcher::new();
        let text = "As discussed, Sun in 1st House brings wealth.\n  Venus in 2nd House\n";
        let found = matcher.find_headings(text);
        // Only the indented line-start heading counts.
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].planet, Planet::Venus);
    }

    #[test]
    fn rescan_is_identical() {
        let matcher = HeadingMatcher::new();
        let text = "Sun in 1st House\nx\nMoon in 2nd House\n";
        assert_eq!(matcher.find_headings(text), matcher.find_headings(text));
    }

    #[test]
    fn out_of_range_ordinal_is_skipped() {
        let matcher = HeadingMatcher::new();
        let found = matcher.find_headings("Sun in 13th House\nSun in 12th House\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].house.number(), 12);
    }

    #[test]
    fn no_headings_is_empty_not_error() {
        let matcher = HeadingMatcher::new();
        assert!(matcher.find_headings("nothing astrological here").is_empty());
    }
}
