/// Application-level constants
pub const APP_NAME: &str = "Taxpare";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// How many comparables each similarity group holds.
pub const GROUP_SIZE: usize = 5;

/// How many ranked comparables the ranking service must return.
pub const TOP_COMP_COUNT: usize = 5;

/// How many near-miss exclusions the ranking service must return.
pub const EXCLUDED_COUNT: usize = 2;

/// Minimum surviving top comps for a usable analysis.
pub const MIN_QUALITY_COMPS: usize = 3;

/// Maximum ranking retries after the first attempt.
pub const MAX_RANKING_RETRIES: usize = 2;

/// Default OpenAI-compatible chat completions endpoint.
pub const DEFAULT_CHAT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model for comparable ranking.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

/// Default per-request timeout for the ranking service.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> String {
    format!("info,{}=debug", env!("CARGO_PKG_NAME"))
}
