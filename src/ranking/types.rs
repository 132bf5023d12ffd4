use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::RankingError;

/// One comparable chosen by the ranking service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RankedComparable {
    pub rank: i64,
    pub acct: String,
    pub address: String,
    /// Currency string as the service wrote it, e.g. "$1,234,567".
    pub adjusted_value: String,
    pub adjusted_psf: String,
    pub rationale: String,
}

/// A near-miss the service considered and passed over.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExcludedNote {
    pub acct: String,
    pub note: String,
}

/// The cleaned, validated ranking reply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisData {
    pub top_comps: Vec<RankedComparable>,
    pub excluded: Vec<ExcludedNote>,
}

/// Successful outcome of the retry controller.
#[derive(Debug, Clone)]
pub struct RankedAnalysis {
    pub data: AnalysisData,
    /// Attempts consumed, including the successful one.
    pub attempts: usize,
}

/// The external ranking service, abstracted for mocking.
///
/// One prompt in, one text reply out; no streaming. Implementations must be
/// cancel-safe: dropping the returned future aborts the request.
#[async_trait]
pub trait RankingClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, RankingError>;
}
