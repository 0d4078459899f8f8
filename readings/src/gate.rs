//! The conversational gate: birth data first, grounded answers after.
//!
//! A consultation is a small state machine. While awaiting birth data,
//! every message is classified and its fields merged into a draft; the
//! transition to [`GateState::ChartReady`] happens only when the draft is
//! complete AND the chart computes. A computation failure discards the
//! draft entirely (half-normalized data is not trusted across turns) and
//! the user resupplies all fields. Once a chart exists, off-topic messages
//! get a fixed refusal and never reach retrieval.

use crate::cfg::ReadingsConfig;
use crate::error::ReadingsError;
use crate::extract::{ExtractedFields, ExtractionSignal, MissingField, extract_birth_fields};
use crate::ports::{ChartPort, LanguagePort, RuleSearch};
use crate::prompt::{
    REFUSAL_MESSAGE, build_question_prompt, build_relevance_prompt, build_summary_prompt,
    format_summary, parse_summary_response,
};
use crate::retrieve::{retrieve_for_chart, retrieve_for_question};

use chart_engine::{BirthData, Chart};
use chrono::{NaiveDate, NaiveTime};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Who said what, for the follow-up prompt's context window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.write_str("User"),
            Role::Assistant => f.write_str("Assistant"),
        }
    }
}

/// One conversation turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Where the consultation currently stands.
#[derive(Clone, Debug)]
pub enum GateState {
    /// No chart yet; messages are mined for birth details.
    AwaitingBirthData,
    /// Chart established; messages are astrology questions (or refused).
    ChartReady(Chart),
}

/// Birth fields gathered so far. Lives only until a chart is derived, and
/// is wiped on a failed computation.
#[derive(Clone, Debug, Default)]
struct BirthDraft {
    date: Option<NaiveDate>,
    time: Option<NaiveTime>,
    place: Option<String>,
}

impl BirthDraft {
    /// Folds newly extracted fields in; a restated field overwrites the
    /// previous value.
    fn merge(&mut self, fields: ExtractedFields) {
        if fields.date.is_some() {
            self.date = fields.date;
        }
        if fields.time.is_some() {
            self.time = fields.time;
        }
        if fields.place.is_some() {
            self.place = fields.place;
        }
    }

    fn missing(&self) -> Vec<MissingField> {
        let mut missing = Vec::new();
        if self.date.is_none() {
            missing.push(MissingField::Date);
        }
        if self.time.is_none() {
            missing.push(MissingField::Time);
        }
        if self.place.is_none() {
            missing.push(MissingField::Place);
        }
        missing
    }

    fn into_birth_data(self, timezone_offset: f64) -> Option<BirthData> {
        Some(BirthData {
            date: self.date?,
            time: self.time?,
            place: self.place?,
            timezone_offset,
        })
    }
}

const WELCOME_MESSAGE: &str = "Welcome! I'm your AI astrologer. I can provide personalized \
astrological insights based on your birth chart.\n\nTo get started, please tell me:\n\
- Your birth date (e.g., January 15, 1990)\n- Your birth time (e.g., 10:30 AM)\n\
- Your birth place (e.g., Ahmedabad)";

const PROVIDE_DETAILS_MESSAGE: &str = "I'm an astrology assistant. To get started, please \
provide your birth date, time, and place.";

const NO_DATA_MESSAGE: &str = "I don't have any astrological data in my knowledge base yet. \
Please upload a reference document first.";

/// One user's consultation: state machine plus conversation history.
pub struct Consultation {
    cfg: ReadingsConfig,
    state: GateState,
    draft: BirthDraft,
    history: Vec<ChatMessage>,
    lang: Arc<dyn LanguagePort>,
    search: Arc<dyn RuleSearch>,
    charts: Arc<dyn ChartPort>,
}

impl Consultation {
    pub fn new(
        cfg: ReadingsConfig,
        lang: Arc<dyn LanguagePort>,
        search: Arc<dyn RuleSearch>,
        charts: Arc<dyn ChartPort>,
    ) -> Self {
        Self {
            cfg,
            state: GateState::AwaitingBirthData,
            draft: BirthDraft::default(),
            history: Vec::new(),
            lang,
            search,
            charts,
        }
    }

    /// Greeting shown before the first user message.
    pub fn welcome_message() -> &'static str {
        WELCOME_MESSAGE
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    /// The established chart, once ready.
    pub fn chart(&self) -> Option<&Chart> {
        match &self.state {
            GateState::ChartReady(chart) => Some(chart),
            GateState::AwaitingBirthData => None,
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Drives one conversation turn and returns the assistant reply.
    ///
    /// Never fails: internal errors degrade to safe user-facing messages
    /// (ask again, refuse, apologize) per the state machine contract.
    pub async fn handle_message(&mut self, text: &str) -> String {
        let reply = match self.state.clone() {
            GateState::AwaitingBirthData => self.handle_awaiting(text).await,
            GateState::ChartReady(chart) => self.handle_ready(&chart, text).await,
        };

        self.history.push(ChatMessage::user(text));
        self.history.push(ChatMessage::assistant(reply.clone()));
        reply
    }

    async fn handle_awaiting(&mut self, text: &str) -> String {
        let signal = extract_birth_fields(self.lang.as_ref(), text).await;
        match signal {
            ExtractionSignal::Fields(fields) => {
                self.draft.merge(fields);

                let missing = self.draft.missing();
                if !missing.is_empty() {
                    let fields = missing
                        .iter()
                        .map(|f| format!("- {f}"))
                        .collect::<Vec<_>>()
                        .join("\n");
                    return format!("I need more information. Please provide:\n\n{fields}");
                }

                // Complete draft: consume it. Whatever happens next, the
                // draft does not survive this attempt.
                let Some(birth) = std::mem::take(&mut self.draft)
                    .into_birth_data(self.cfg.default_timezone_offset)
                else {
                    return PROVIDE_DETAILS_MESSAGE.to_string();
                };

                let computed = self.charts.compute(&birth).await;
                match computed {
                    Ok(chart) if chart.validate() => {
                        info!("chart established for '{}'", birth.place);
                        let summary = self.initial_summary(&chart).await;
                        self.state = GateState::ChartReady(chart);
                        format!(
                            "Got it! I calculated your birth chart for {}.\n\n{}\n\
                             Feel free to ask me any questions about your chart!",
                            birth.place, summary
                        )
                    }
                    Ok(_) => {
                        warn!("chart computation produced an invalid chart");
                        "I couldn't calculate a valid birth chart from those details.\n\n\
                         Please provide your birth details again."
                            .to_string()
                    }
                    Err(e) => {
                        warn!("chart computation failed: {e}");
                        format!(
                            "I couldn't calculate your birth chart: {e}\n\n\
                             Please provide your birth details again."
                        )
                    }
                }
            }
            ExtractionSignal::NonAstrology => PROVIDE_DETAILS_MESSAGE.to_string(),
        }
    }

    async fn handle_ready(&mut self, chart: &Chart, text: &str) -> String {
        if !self.is_astrology_question(text).await {
            return REFUSAL_MESSAGE.to_string();
        }

        match self.answer_question(chart, text).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("question answering failed: {e}");
                format!("I encountered an error: {e}\n\nPlease try rephrasing your question.")
            }
        }
    }

    /// Relevance gate on the fast profile. Fails open: when the classifier
    /// itself errors, the question is allowed through.
    async fn is_astrology_question(&self, question: &str) -> bool {
        let prompt = build_relevance_prompt(question);
        match self.lang.complete_fast(&prompt).await {
            Ok(reply) => reply.trim().eq_ignore_ascii_case("yes"),
            Err(e) => {
                warn!("relevance check failed: {e}; allowing question through");
                true
            }
        }
    }

    async fn initial_summary(&self, chart: &Chart) -> String {
        let rules = retrieve_for_chart(self.search.as_ref(), &self.cfg, chart).await;
        if rules.is_empty() {
            return NO_DATA_MESSAGE.to_string();
        }

        let prompt = build_summary_prompt(&rules, chart);
        match self.lang.complete_slow(&prompt, Some(1.0)).await {
            Ok(reply) => format_summary(&parse_summary_response(&reply)),
            Err(e) => {
                warn!("summary generation failed: {e}");
                "Your chart is ready, but I couldn't generate the summary just now. \
                 Feel free to ask questions directly."
                    .to_string()
            }
        }
    }

    async fn answer_question(&self, chart: &Chart, question: &str) -> Result<String, ReadingsError> {
        let rules = retrieve_for_question(
            self.search.as_ref(),
            self.lang.as_ref(),
            &self.cfg,
            chart,
            question,
            None,
        )
        .await?;

        let window = self.history.len().saturating_sub(self.cfg.history_window);
        let prompt = build_question_prompt(&rules, chart, question, &self.history[window..]);

        self.lang.complete_slow(&prompt, Some(0.7)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::BoxFut;
    use chart_engine::{ChartError, House, Planet};
    use rule_store::RetrievedRule;
    use serde_json::json;
    use std::collections::{BTreeMap, VecDeque};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const DATE_ONLY: &str = r#"{"date": "2004-01-16", "time": null, "place": null}"#;
    const TIME_AND_PLACE: &str = r#"{"date": null, "time": "10:30", "place": "Ahmedabad"}"#;
    const FULL: &str = r#"{"date": "2004-01-16", "time": "10:30", "place": "Ahmedabad"}"#;
    const SUMMARY: &str =
        "**Health:** H.\n**Education:** E.\n**Wealth:** W.\n**Marriage:** M.\n";

    /// Scripted language port: fast replies pop from a queue, slow replies
    /// are fixed, embeddings are a constant vector.
    struct StubLang {
        fast: Mutex<VecDeque<String>>,
        slow: String,
    }

    impl StubLang {
        fn new(fast: &[&str], slow: &str) -> Arc<Self> {
            Arc::new(Self {
                fast: Mutex::new(fast.iter().map(|s| s.to_string()).collect()),
                slow: slow.to_string(),
            })
        }
    }

    impl LanguagePort for StubLang {
        fn complete_fast<'a>(&'a self, _: &'a str) -> BoxFut<'a, Result<String, ReadingsError>> {
            let next = self.fast.lock().unwrap().pop_front();
            Box::pin(async move {
                next.ok_or_else(|| ReadingsError::Parse("no scripted fast reply".into()))
            })
        }

        fn complete_slow<'a>(
            &'a self,
            _: &'a str,
            _: Option<f32>,
        ) -> BoxFut<'a, Result<String, ReadingsError>> {
            Box::pin(async move { Ok(self.slow.clone()) })
        }

        fn embed<'a>(&'a self, _: &'a str) -> BoxFut<'a, Result<Vec<f32>, ReadingsError>> {
            Box::pin(async move { Ok(vec![0.1; 768]) })
        }
    }

    struct StubSearch {
        chart_rules: Vec<RetrievedRule>,
        question_rules: Vec<RetrievedRule>,
        hybrid_calls: AtomicUsize,
    }

    impl StubSearch {
        fn new(chart_rules: Vec<RetrievedRule>, question_rules: Vec<RetrievedRule>) -> Arc<Self> {
            Arc::new(Self {
                chart_rules,
                question_rules,
                hybrid_calls: AtomicUsize::new(0),
            })
        }
    }

    impl RuleSearch for StubSearch {
        fn by_chart<'a>(&'a self, _: &'a Chart, _: u32) -> BoxFut<'a, Vec<RetrievedRule>> {
            Box::pin(async move { self.chart_rules.clone() })
        }

        fn by_chart_and_question<'a>(
            &'a self,
            _: &'a Chart,
            _: Vec<f32>,
            _: u64,
        ) -> BoxFut<'a, Result<Vec<RetrievedRule>, ReadingsError>> {
            self.hybrid_calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move { Ok(self.question_rules.clone()) })
        }
    }

    struct StubCharts {
        fail: bool,
    }

    impl ChartPort for StubCharts {
        fn compute<'a>(&'a self, birth: &'a BirthData) -> BoxFut<'a, Result<Chart, ChartError>> {
            Box::pin(async move {
                if self.fail {
                    Err(ChartError::PlaceNotFound(birth.place.clone()))
                } else {
                    let houses: BTreeMap<Planet, House> = Planet::ALL
                        .iter()
                        .enumerate()
                        .map(|(i, p)| (*p, House::new((i % 12 + 1) as u8).unwrap()))
                        .collect();
                    Ok(Chart::new(houses))
                }
            })
        }
    }

    fn rule() -> RetrievedRule {
        RetrievedRule::from_payload(
            0.0,
            json!({
                "planet": "Sun", "house": 1,
                "heading": "Sun in 1st House",
                "content": "The native will be good and wealthy.",
                "rule_id": "sun_house_1",
            }),
        )
        .unwrap()
    }

    fn consultation(
        lang: Arc<StubLang>,
        search: Arc<StubSearch>,
        charts_fail: bool,
    ) -> Consultation {
        Consultation::new(
            ReadingsConfig::default(),
            lang,
            search,
            Arc::new(StubCharts { fail: charts_fail }),
        )
    }

    #[test]
    fn welcome_asks_for_all_three_fields() {
        let welcome = Consultation::welcome_message();
        assert!(welcome.contains("birth date"));
        assert!(welcome.contains("birth time"));
        assert!(welcome.contains("birth place"));
    }

    #[tokio::test]
    async fn partial_birth_data_names_missing_fields() {
        let lang = StubLang::new(&[DATE_ONLY], "");
        let search = StubSearch::new(vec![rule()], vec![]);
        let mut c = consultation(lang, search, false);

        let reply = c.handle_message("born 16 jan 2004").await;
        assert!(reply.contains("birth time"));
        assert!(reply.contains("birth place"));
        assert!(!reply.contains("- birth date"));
        assert!(matches!(c.state(), GateState::AwaitingBirthData));
    }

    #[tokio::test]
    async fn draft_accumulates_across_turns() {
        let lang = StubLang::new(&[DATE_ONLY, TIME_AND_PLACE], SUMMARY);
        let search = StubSearch::new(vec![rule()], vec![]);
        let mut c = consultation(lang, search, false);

        let reply = c.handle_message("born 16 jan 2004").await;
        assert!(reply.contains("birth time"));

        // The second message only supplies the remainder; the date from the
        // first turn must still count.
        let reply = c.handle_message("10:30 in Ahmedabad").await;
        assert!(matches!(c.state(), GateState::ChartReady(_)));
        assert!(reply.contains("Ahmedabad"));
    }

    #[tokio::test]
    async fn complete_birth_data_establishes_chart_and_summarizes() {
        let lang = StubLang::new(
            &[FULL],
            "**Health:** Good.\n**Education:** Fine.\n**Wealth:** Solid.\n**Marriage:** Happy.\n",
        );
        let search = StubSearch::new(vec![rule()], vec![]);
        let mut c = consultation(lang, search, false);

        let reply = c
            .handle_message("born 16 jan 2004 at 10:30 in Ahmedabad")
            .await;
        assert!(matches!(c.state(), GateState::ChartReady(_)));
        assert!(c.chart().unwrap().validate());
        assert!(reply.contains("Ahmedabad"));
        assert!(reply.contains("Your Astrological Summary"));
        assert!(reply.contains("Good."));
    }

    #[tokio::test]
    async fn chart_failure_resets_and_discards_draft() {
        let lang = StubLang::new(&[FULL, TIME_AND_PLACE], SUMMARY);
        let search = StubSearch::new(vec![rule()], vec![]);
        let mut c = consultation(lang, search, true);

        let reply = c.handle_message("full details").await;
        assert!(reply.contains("Please provide your birth details again"));
        assert!(matches!(c.state(), GateState::AwaitingBirthData));
        assert!(c.chart().is_none());

        // The draft was discarded with the failure: supplying only time and
        // place now leaves the date missing again.
        let reply = c.handle_message("10:30 in Ahmedabad").await;
        assert!(reply.contains("birth date"));
    }

    #[tokio::test]
    async fn empty_store_yields_no_data_message() {
        let lang = StubLang::new(&[FULL], "irrelevant");
        let search = StubSearch::new(vec![], vec![]);
        let mut c = consultation(lang, search, false);

        let reply = c.handle_message("full details").await;
        assert!(reply.contains("knowledge base"));
        assert!(matches!(c.state(), GateState::ChartReady(_)));
    }

    #[tokio::test]
    async fn off_topic_message_before_birth_data_redirects() {
        let lang = StubLang::new(&["non_astrology"], "");
        let search = StubSearch::new(vec![], vec![]);
        let mut c = consultation(lang, search, false);

        let reply = c.handle_message("tell me a joke").await;
        assert!(reply.contains("birth date, time, and place"));
        assert!(matches!(c.state(), GateState::AwaitingBirthData));
    }

    #[tokio::test]
    async fn off_topic_question_is_refused_without_retrieval() {
        let lang = StubLang::new(&[FULL, "no"], SUMMARY);
        let search = StubSearch::new(vec![rule()], vec![rule()]);
        let mut c = consultation(lang.clone(), search.clone(), false);

        c.handle_message("full details").await;
        let reply = c.handle_message("what's the capital of France?").await;

        assert_eq!(reply, REFUSAL_MESSAGE);
        assert_eq!(search.hybrid_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn relevant_question_is_answered_from_retrieval() {
        let lang = StubLang::new(&[FULL, "yes"], SUMMARY);
        let search = StubSearch::new(vec![rule()], vec![rule()]);
        let mut c = consultation(lang.clone(), search.clone(), false);

        c.handle_message("full details").await;
        let reply = c.handle_message("why am I facing health problems?").await;

        // The scripted slow reply answers both summary and question calls.
        assert!(reply.contains("**Health:** H."));
        assert_eq!(search.hybrid_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn classifier_failure_degrades_to_incomplete() {
        // Empty queue: complete_fast errors, extraction must fall back.
        let lang = StubLang::new(&[], "");
        let search = StubSearch::new(vec![], vec![]);
        let mut c = consultation(lang, search, false);

        let reply = c.handle_message("born sometime").await;
        assert!(reply.contains("birth date"));
        assert!(reply.contains("birth time"));
        assert!(reply.contains("birth place"));
    }
}
