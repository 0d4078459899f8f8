//! Runtime configuration for reading orchestration.

/// Config bag for retrieval and conversation knobs. All fields have
/// defaults via [`ReadingsConfig::from_env`].
#[derive(Clone, Debug)]
pub struct ReadingsConfig {
    /// Rules fetched per planet/house pair for the initial summary.
    pub chart_top_k: u32,
    /// Globally top-k rules for follow-up questions.
    pub question_top_k: u64,
    /// How many trailing conversation messages feed the question prompt.
    pub history_window: usize,
    /// Fixed UTC offset assumed for all birth times (IST). There is no
    /// multi-timezone fallback; the offset is not inferred from the
    /// geocoded coordinates.
    pub default_timezone_offset: f64,
}

impl Default for ReadingsConfig {
    fn default() -> Self {
        Self {
            chart_top_k: 10,
            question_top_k: 3,
            history_window: 5,
            default_timezone_offset: 5.5,
        }
    }
}

impl ReadingsConfig {
    /// Builds from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            chart_top_k: parse("READINGS_CHART_TOP_K", d.chart_top_k),
            question_top_k: parse("READINGS_QUESTION_TOP_K", d.question_top_k),
            history_window: parse("READINGS_HISTORY_WINDOW", d.history_window),
            default_timezone_offset: parse("READINGS_TZ_OFFSET", d.default_timezone_offset),
        }
    }
}

fn parse<T: std::str::FromStr>(k: &str, dflt: T) -> T {
    std::env::var(k)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(dflt)
}
