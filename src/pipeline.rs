//! One-shot analysis orchestration:
//! overrides, then selection, prompt, ranking, and summary.
//!
//! Each run is request-scoped and recomputes from scratch; concurrent runs
//! for the same subject with different overrides share nothing mutable.

use thiserror::Error;

use crate::property::{ComparableProperty, Overrides, SubjectProperty};
use crate::prompt::build_ranking_prompt;
use crate::ranking::adapter::RankingAdapter;
use crate::ranking::types::AnalysisData;
use crate::ranking::RankingFailure;
use crate::selection::{select_comparables, SelectedComparables, SelectionError};
use crate::summary::{summarize_analysis, ValuationSummary};

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Ranking(#[from] RankingFailure),
}

/// Everything a caller needs to display or export one analysis run.
#[derive(Debug)]
pub struct AnalysisOutcome {
    /// The candidate set sent to the ranking service.
    pub selected: SelectedComparables,
    /// The validated top-5/excluded-2 ranking.
    pub analysis: AnalysisData,
    /// Median/savings statistics; `None` when no usable adjusted values.
    pub summary: Option<ValuationSummary>,
    /// The exact prompt used, kept for audit display.
    pub prompt: String,
    /// Ranking attempts consumed.
    pub attempts: usize,
}

/// Drives the full pipeline for one subject property per invocation.
pub struct PropertyAnalyzer {
    adapter: RankingAdapter,
}

impl PropertyAnalyzer {
    pub fn new(adapter: RankingAdapter) -> Self {
        Self { adapter }
    }

    /// Run one sequential pass over the pipeline.
    ///
    /// Overrides are applied to a fresh copy of the subject; the caller's
    /// original value is untouched and can be re-analyzed side by side.
    /// Cancellation/timeout is the caller's: dropping this future aborts
    /// any in-flight ranking call.
    pub async fn analyze(
        &self,
        subject: &SubjectProperty,
        pool: &[ComparableProperty],
        overrides: Option<&Overrides>,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        tracing::info!(acct = %subject.acct, pool = pool.len(), "starting analysis");

        let effective = match overrides {
            Some(o) if !o.is_empty() => subject.with_overrides(o),
            _ => subject.clone(),
        };

        let selected = select_comparables(Some(&effective), pool)?;
        let prompt = build_ranking_prompt(&effective, &selected, overrides);

        // The only suspension point; everything else is pure CPU work.
        let ranked = self.adapter.rank(&prompt, &effective.acct).await?;

        let summary = summarize_analysis(&ranked.data, &effective);
        if let Some(s) = &summary {
            tracing::info!(
                median = s.median_value,
                savings = s.potential_savings,
                comps = s.comparable_count,
                "analysis complete"
            );
        } else {
            tracing::warn!("analysis produced no usable adjusted values");
        }

        Ok(AnalysisOutcome {
            selected,
            analysis: ranked.data,
            summary,
            prompt,
            attempts: ranked.attempts,
        })
    }
}
