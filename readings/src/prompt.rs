//! Prompt builders and reply parsing.
//!
//! Prompt wording is a contract with the parsing code next to it, not with
//! the user: the extraction prompt demands a strict JSON shape and the
//! relevance prompt a bare yes/no, so the parsers in this module stay
//! trivial.

use chart_engine::Chart;
use regex::Regex;
use rule_store::RetrievedRule;
use std::collections::BTreeMap;

use crate::gate::ChatMessage;

/// The four life aspects covered by the initial summary.
pub const ASPECTS: [&str; 4] = ["Health", "Education", "Wealth", "Marriage"];

/// Fixed reply for off-topic questions once a chart exists.
pub const REFUSAL_MESSAGE: &str = "I am an astrology assistant and can only answer questions \
related to your birth chart and astrological predictions. Please ask me about topics like \
health, career, relationships, wealth, education, or other life aspects based on your horoscope.";

/// Extraction prompt: pull birth details out of a chat message.
///
/// The model must reply with either the literal `non_astrology` or a JSON
/// object `{"date": ..., "time": ..., "place": ...}` with null for absent
/// fields (see [`crate::extract::parse_extraction_reply`]).
pub fn build_extraction_prompt(message: &str) -> String {
    format!(
        r#"You are a birth data extraction assistant. Extract birth information from the user's message.

USER MESSAGE:
{message}

TASK:
1. Check if the message is trying to provide birth details (date, time, place)
2. If it is clearly NOT about birth details (e.g. "what's the weather?", "tell me a joke"), return "non_astrology"
3. Otherwise, extract whatever birth information is present

Extract and return in this EXACT JSON format:
{{
    "date": "YYYY-MM-DD" or null,
    "time": "HH:MM" (24-hour) or null,
    "place": "City name" or null
}}

RULES:
- Convert ANY date format to YYYY-MM-DD (e.g. "jan 16 2004" -> "2004-01-16")
- Convert ANY time format to HH:MM in 24-hour (e.g. "10.30 AM" -> "10:30", "2:30 PM" -> "14:30")
- Fix common place name typos (Ahmadabad -> Ahmedabad)
- Assume 2000s for 2-digit years (04 -> 2004)
- If a field is not mentioned, set it to null
- Return ONLY the JSON, nothing else

EXAMPLES:
Input: "date: jan 16 2004 time: 10.30 place: Ahmedabad"
Output: {{"date": "2004-01-16", "time": "10:30", "place": "Ahmedabad"}}

Input: "born 16 jan 2004"
Output: {{"date": "2004-01-16", "time": null, "place": null}}

Input: "what's the weather today?"
Output: "non_astrology"
"#
    )
}

/// Relevance prompt: is this question about astrology at all?
///
/// The model must reply with a bare `yes` or `no`.
pub fn build_relevance_prompt(question: &str) -> String {
    format!(
        r#"You are a question validator. Determine if this question is related to astrology or not.

USER QUESTION:
{question}

ASTROLOGY-RELATED topics include:
- Birth chart, planetary positions, houses
- Health, career, wealth, marriage, education predictions
- Astrological remedies
- Personality traits from astrology

NON-ASTROLOGY topics include:
- General knowledge, current events, news
- Technical/coding questions
- Weather, recipes, jokes
- Medical/legal/financial advice (not astrological)

Return ONLY "yes" if astrology-related, or "no" if not.
"#
    )
}

fn rules_block(title: &str, rules: &[RetrievedRule], with_scores: bool) -> String {
    let mut out = format!("{title}:\n\n");
    for (i, rule) in rules.iter().enumerate() {
        if with_scores {
            out.push_str(&format!(
                "Rule {}: {} (Relevance: {:.2})\n",
                i + 1,
                rule.heading,
                rule.score
            ));
        } else {
            out.push_str(&format!("Rule {}: {}\n", i + 1, rule.heading));
        }
        out.push_str(&rule.content);
        out.push_str("\n\n");
    }
    out
}

fn chart_block(chart: &Chart) -> String {
    let mut out = String::from("USER'S HOROSCOPE CHART:\n");
    for (planet, house) in chart.iter() {
        out.push_str(&format!("- {} in House {}\n", planet, house));
    }
    out
}

/// Summary prompt over the four aspects, grounded in the retrieved rules.
pub fn build_summary_prompt(rules: &[RetrievedRule], chart: &Chart) -> String {
    let rules_text = rules_block("RETRIEVED ASTROLOGICAL RULES", rules, false);
    let chart_text = chart_block(chart);
    let aspects_text = ASPECTS.join(", ");

    let mut sections = String::new();
    for aspect in ASPECTS {
        sections.push_str(&format!("**{aspect}:**\n[Your summary here]\n\n"));
    }

    format!(
        r#"You are an expert astrologer. Below are the specific astrological rules that apply to this user's chart.

{rules_text}
{chart_text}
TASK:
Provide a comprehensive summary for the following life aspects: {aspects_text}

For each aspect, analyze the relevant rules and provide:
1. A clear summary of what the rules indicate
2. Specific predictions or characteristics
3. Any remedies mentioned (if applicable)

IMPORTANT:
- Use ONLY the information provided in the rules above
- If an aspect is not covered in the rules, say "Not mentioned in the provided rules"
- Be specific and reference which planet-house combination you're discussing
- Keep each aspect summary to 3-4 sentences

Format your response as:

{sections}"#
    )
}

/// Splits a summary reply into per-aspect sections.
///
/// Works like the chunk extractor: locate every `**Aspect:**` header, then
/// take the text from each header to the next one (or end of reply). A
/// missing aspect gets a fixed fallback line rather than being dropped; a
/// repeated header keeps its first section.
pub fn parse_summary_response(response: &str) -> BTreeMap<&'static str, String> {
    let header = Regex::new(r"(?i)\*\*(health|education|wealth|marriage):?\*\*").unwrap();

    let mut sections: Vec<(usize, usize, &'static str)> = Vec::new();
    for caps in header.captures_iter(response) {
        let whole = caps.get(0).unwrap();
        let name = caps.get(1).unwrap().as_str();
        // The alternation only admits the four aspect names.
        let aspect = ASPECTS
            .iter()
            .find(|a| a.eq_ignore_ascii_case(name))
            .copied()
            .unwrap();
        sections.push((whole.start(), whole.end(), aspect));
    }

    let mut summaries: BTreeMap<&'static str, String> = BTreeMap::new();
    for (i, &(_, end, aspect)) in sections.iter().enumerate() {
        let next = sections
            .get(i + 1)
            .map(|&(start, _, _)| start)
            .unwrap_or(response.len());
        let body = response[end..next].trim();
        if !body.is_empty() {
            summaries
                .entry(aspect)
                .or_insert_with(|| body.to_string());
        }
    }

    for aspect in ASPECTS {
        summaries
            .entry(aspect)
            .or_insert_with(|| format!("No information found for {aspect}"));
    }

    summaries
}

/// Renders parsed aspect summaries as the initial reading text.
pub fn format_summary(summaries: &BTreeMap<&'static str, String>) -> String {
    let mut out = String::from("## Your Astrological Summary\n\n");
    for aspect in ASPECTS {
        out.push_str(&format!("### {aspect}\n\n"));
        out.push_str(
            summaries
                .get(aspect)
                .map(String::as_str)
                .unwrap_or("No information available"),
        );
        out.push_str("\n\n");
    }
    out
}

/// Question prompt: scored rules + chart + trailing conversation history.
pub fn build_question_prompt(
    rules: &[RetrievedRule],
    chart: &Chart,
    question: &str,
    history: &[ChatMessage],
) -> String {
    let rules_text = rules_block("RELEVANT ASTROLOGICAL RULES", rules, true);
    let chart_text = chart_block(chart);

    let mut history_text = String::new();
    if !history.is_empty() {
        history_text.push_str("\nPREVIOUS CONVERSATION:\n");
        for msg in history {
            history_text.push_str(&format!("{}: {}\n\n", msg.role, msg.content));
        }
        history_text.push_str(
            "Use this conversation history to understand context and answer follow-up questions.\n",
        );
    }

    format!(
        r#"You are an expert astrologer. Your ONLY purpose is to answer questions about astrology based on the user's birth chart.

{rules_text}
{chart_text}{history_text}
USER'S QUESTION:
{question}

INSTRUCTIONS:
1. If the question is NOT about astrology or the birth chart, respond exactly with:
   "{refusal}"
2. Otherwise provide a clear, specific answer based on the rules above:
   - Reference specific planet-house combinations
   - Explain the reasoning from astrological principles
   - Mention any remedies if applicable
   - Be honest if the rules don't fully address the question
   - If this is a follow-up question, build on previous answers

Keep your answer concise (3-5 sentences).
"#,
        refusal = REFUSAL_MESSAGE
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chart_engine::{House, Planet};
    use std::collections::BTreeMap as Map;

    fn chart() -> Chart {
        let mut houses = Map::new();
        houses.insert(Planet::Sun, House::new(10).unwrap());
        houses.insert(Planet::Moon, House::new(6).unwrap());
        Chart::new(houses)
    }

    #[test]
    fn summary_parsing_extracts_all_sections() {
        let reply = "\
**Health:**\nStrong constitution overall.\n\n\
**Education:**\nSteady academic progress.\n\n\
**Wealth:**\nGradual accumulation.\n\n\
**Marriage:**\nHarmonious partnership.\n";
        let parsed = parse_summary_response(reply);
        assert_eq!(parsed["Health"], "Strong constitution overall.");
        assert_eq!(parsed["Marriage"], "Harmonious partnership.");
    }

    #[test]
    fn missing_aspect_gets_fallback() {
        let parsed = parse_summary_response("**Health:** Fine.\n");
        assert_eq!(parsed["Health"], "Fine.");
        assert!(parsed["Wealth"].contains("No information found"));
    }

    #[test]
    fn question_prompt_includes_chart_and_history() {
        let history = vec![
            ChatMessage::user("when will I marry?"),
            ChatMessage::assistant("The seventh house suggests..."),
        ];
        let prompt = build_question_prompt(&[], &chart(), "tell me more", &history);
        assert!(prompt.contains("Sun in House 10"));
        assert!(prompt.contains("PREVIOUS CONVERSATION"));
        assert!(prompt.contains("when will I marry?"));
        assert!(prompt.contains("tell me more"));
    }

    #[test]
    fn summary_prompt_lists_rules_in_order() {
        let rule = rule_store::RetrievedRule::from_payload(
            0.0,
            serde_json::json!({
                "planet": "Sun", "house": 10,
                "heading": "Sun in 10th House",
                "content": "Authority and standing.",
                "rule_id": "sun_house_10",
            }),
        )
        .unwrap();
        let prompt = build_summary_prompt(&[rule], &chart());
        assert!(prompt.contains("Rule 1: Sun in 10th House"));
        assert!(prompt.contains("Authority and standing."));
        assert!(prompt.contains("Health, Education, Wealth, Marriage"));
    }
}
