//! Retry controller for the external ranking service.
//!
//! One logical ranking request is a strictly sequential series of attempts:
//! never parallel, never more than `1 + max_retries` service calls, and the
//! first schema-conforming reply wins. Cancellation is cooperative: dropping
//! the [`RankingAdapter::rank`] future (for example via
//! `tokio::time::timeout`) aborts the in-flight call and all further
//! attempts.

use std::borrow::Cow;

use super::client::MockRankingClient;
use super::parser::{parse_analysis, strip_code_fences};
use super::types::{RankedAnalysis, RankingClient};
use super::validator::validate_quality;
use super::{RankingError, RankingFailure};
use crate::config::MAX_RANKING_RETRIES;
use crate::prompt::RETRY_DIRECTIVE;

/// Invokes the ranking service and enforces format compliance through
/// bounded retries.
pub struct RankingAdapter {
    client: Box<dyn RankingClient>,
    max_retries: usize,
}

impl RankingAdapter {
    pub fn new(client: Box<dyn RankingClient>) -> Self {
        Self {
            client,
            max_retries: MAX_RANKING_RETRIES,
        }
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Run one ranking request to completion.
    ///
    /// On attempts after the first, a stricter formatting directive is
    /// appended to the prompt. A terminal failure carries the last raw
    /// reply received, for manual diagnosis.
    pub async fn rank(
        &self,
        prompt: &str,
        subject_acct: &str,
    ) -> Result<RankedAnalysis, RankingFailure> {
        let mut last_raw: Option<String> = None;
        let mut last_error: Option<RankingError> = None;

        for attempt in 0..=self.max_retries {
            let attempt_prompt: Cow<'_, str> = if attempt == 0 {
                Cow::Borrowed(prompt)
            } else {
                Cow::Owned(format!("{prompt}\n\n{RETRY_DIRECTIVE}"))
            };

            let raw = match self.client.complete(&attempt_prompt).await {
                Ok(raw) => raw,
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        error = %e,
                        "ranking service call failed, retrying"
                    );
                    last_error = Some(e);
                    continue;
                }
                Err(e) => {
                    return Err(RankingFailure {
                        error: e,
                        raw_response: last_raw,
                    })
                }
            };

            if raw.trim().is_empty() {
                tracing::warn!(attempt = attempt + 1, "ranking service returned empty reply");
                last_error = Some(RankingError::EmptyResponse);
                continue;
            }
            last_raw = Some(raw.clone());

            let cleaned = strip_code_fences(&raw);
            match parse_analysis(cleaned, subject_acct)
                .and_then(|data| validate_quality(&data).map(|()| data))
            {
                Ok(data) => {
                    tracing::info!(
                        attempt = attempt + 1,
                        top_comps = data.top_comps.len(),
                        excluded = data.excluded.len(),
                        "ranking reply accepted"
                    );
                    return Ok(RankedAnalysis {
                        data,
                        attempts: attempt + 1,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        error = %e,
                        "ranking reply rejected"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(RankingFailure {
            error: last_error.unwrap_or(RankingError::EmptyResponse),
            raw_response: last_raw,
        })
    }
}

impl From<MockRankingClient> for RankingAdapter {
    fn from(mock: MockRankingClient) -> Self {
        RankingAdapter::new(Box::new(mock))
    }
}
