//! External ranking-service integration: client, retry controller, and
//! reply validation.

pub mod adapter;
pub mod client;
pub mod parser;
pub mod types;
pub mod validator;

pub use adapter::*;
pub use client::*;
pub use parser::*;
pub use types::*;
pub use validator::*;

use thiserror::Error;

use crate::config::MIN_QUALITY_COMPS;

#[derive(Error, Debug)]
pub enum RankingError {
    #[error("ranking service unreachable at {0}")]
    Connection(String),

    #[error("ranking service returned error (status {status}): {body}")]
    ServiceError { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("ranking service returned an empty reply")]
    EmptyResponse,

    #[error("malformed ranking reply: {0}")]
    Format(String),

    #[error("YAML parsing error: {0}")]
    Yaml(String),

    #[error(
        "only {found} usable comparable(s) survived cleaning; at least {MIN_QUALITY_COMPS} are needed for a reliable analysis"
    )]
    Quality { found: usize },
}

impl RankingError {
    /// Whether another attempt against the service is worth making.
    /// Transport hiccups, malformed replies, and thin results can all come
    /// out differently on a fresh call; a 4xx rejection (bad key, malformed
    /// request) will not, except 429 rate limiting.
    pub fn is_retryable(&self) -> bool {
        match self {
            RankingError::ServiceError { status, .. } => *status == 429 || *status >= 500,
            RankingError::Connection(_)
            | RankingError::HttpClient(_)
            | RankingError::EmptyResponse
            | RankingError::Format(_)
            | RankingError::Yaml(_)
            | RankingError::Quality { .. } => true,
        }
    }
}

/// Terminal failure of the retry controller, carrying the last raw reply
/// (when one was received) for manual diagnosis.
#[derive(Error, Debug)]
#[error("{error}")]
pub struct RankingFailure {
    #[source]
    pub error: RankingError,
    pub raw_response: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_message_distinct_from_format() {
        let quality = RankingError::Quality { found: 2 }.to_string();
        let format = RankingError::Format("missing 'top_comps'".into()).to_string();
        assert!(quality.contains("2 usable"));
        assert!(quality.contains("reliable analysis"));
        assert!(!quality.contains("malformed"));
        assert!(format.contains("malformed"));
    }

    #[test]
    fn retryability_covers_transport_format_and_quality() {
        assert!(RankingError::Connection("http://localhost".into()).is_retryable());
        assert!(RankingError::EmptyResponse.is_retryable());
        assert!(RankingError::Yaml("bad indent".into()).is_retryable());
        assert!(RankingError::Quality { found: 1 }.is_retryable());
    }

    #[test]
    fn client_rejections_are_not_retryable() {
        let unauthorized = RankingError::ServiceError {
            status: 401,
            body: "invalid api key".into(),
        };
        assert!(!unauthorized.is_retryable());

        let rate_limited = RankingError::ServiceError {
            status: 429,
            body: "slow down".into(),
        };
        assert!(rate_limited.is_retryable());

        let overloaded = RankingError::ServiceError {
            status: 503,
            body: "try later".into(),
        };
        assert!(overloaded.is_retryable());
    }

    #[test]
    fn failure_carries_raw_response() {
        let failure = RankingFailure {
            error: RankingError::EmptyResponse,
            raw_response: Some("raw text".into()),
        };
        assert_eq!(failure.raw_response.as_deref(), Some("raw text"));
        assert!(failure.to_string().contains("empty reply"));
    }
}
