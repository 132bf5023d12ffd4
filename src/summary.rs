//! Valuation statistics over adjusted comparable values.
//!
//! The same median rule serves both the internally-scored candidate set
//! (pre-ranking preview) and the externally-ranked reply (final
//! recommendation), so the two never disagree on how a recommended value is
//! derived. Computed on demand, never cached.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::adjustments::AdjustedComparable;
use crate::property::{safe_parse_int, SubjectProperty};
use crate::ranking::types::AnalysisData;

/// Summary statistics for one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct ValuationSummary {
    pub market_value: i64,
    pub appraised_value: i64,
    /// Recommended assessment value: the median of adjusted comp values.
    pub median_value: f64,
    pub min_value: i64,
    pub max_value: i64,
    pub comparable_count: usize,
    pub potential_savings: f64,
    pub percentage_difference: f64,
}

/// Summarize an externally-ranked reply.
///
/// Adjusted values arrive as display strings ("$215,833", "215833 USD");
/// everything but digits is stripped before parsing. Returns `None` when no
/// positive values survive.
pub fn summarize_analysis(
    data: &AnalysisData,
    subject: &SubjectProperty,
) -> Option<ValuationSummary> {
    let values: Vec<i64> = data
        .top_comps
        .iter()
        .map(|comp| parse_currency_value(&comp.adjusted_value))
        .collect();
    summarize_values(values, subject)
}

/// Summarize the internally-scored candidate set (pre-ranking preview).
pub fn summarize_selected(
    comparables: &[AdjustedComparable],
    subject: &SubjectProperty,
) -> Option<ValuationSummary> {
    let values: Vec<i64> = comparables
        .iter()
        .filter_map(|member| member.adjustments.as_ref())
        .map(|adj| adj.total_adjusted_value.round() as i64)
        .collect();
    summarize_values(values, subject)
}

/// Shared median/savings computation. Non-positive values are dropped;
/// an empty survivor list yields `None`, never a panic.
fn summarize_values(values: Vec<i64>, subject: &SubjectProperty) -> Option<ValuationSummary> {
    let mut values: Vec<i64> = values.into_iter().filter(|v| *v > 0).collect();
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();

    let median_value = median(&values);
    let market_value = safe_parse_int(subject.tot_mkt_val.as_deref());
    let appraised_value = safe_parse_int(subject.tot_appr_val.as_deref());

    let potential_savings = (appraised_value as f64 - median_value).max(0.0);
    let percentage_difference = if median_value > 0.0 {
        (appraised_value as f64 - median_value) / median_value * 100.0
    } else {
        0.0
    };

    Some(ValuationSummary {
        market_value,
        appraised_value,
        median_value,
        min_value: values[0],
        max_value: values[values.len() - 1],
        comparable_count: values.len(),
        potential_savings,
        percentage_difference,
    })
}

/// Median of a sorted, non-empty slice: mean of the middle pair for even
/// counts, the middle element for odd.
fn median(sorted: &[i64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) as f64 / 2.0
    } else {
        sorted[mid] as f64
    }
}

/// Parse a currency display string to a whole-dollar amount, tolerating
/// symbols, thousands separators, and unit suffixes. Unparseable yields 0.
pub fn parse_currency_value(raw: &str) -> i64 {
    static NON_DIGITS: OnceLock<Regex> = OnceLock::new();
    let re = NON_DIGITS.get_or_init(|| Regex::new(r"[^0-9]").expect("static pattern"));
    re.replace_all(raw, "").parse().unwrap_or(0)
}
