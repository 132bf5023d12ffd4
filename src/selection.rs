//! Candidate grouping and final-set selection.
//!
//! Three independent top-5 views of the same pool (closest by age, closest by
//! building area, lowest adjusted value) are unioned and deduplicated by
//! account into the candidate set handed to the ranking service. A comparable
//! can sit in up to three groups at once; the union is therefore capped at 15.

use std::collections::HashSet;

use thiserror::Error;

use crate::adjustments::{calculate_adjustments, AdjustedComparable};
use crate::config::GROUP_SIZE;
use crate::property::{safe_parse_int, ComparableProperty, SubjectProperty};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SelectionError {
    #[error("no comparable candidates available to analyze")]
    EmptyPool,

    #[error("grouping produced no candidates; cannot compare without a subject baseline")]
    EmptySelection,
}

/// Which similarity groups each account belongs to.
#[derive(Debug, Clone, Default)]
pub struct GroupMembership {
    pub closest_by_age: HashSet<String>,
    pub closest_by_size: HashSet<String>,
    pub lowest_value: HashSet<String>,
}

impl GroupMembership {
    /// Display tags for one account, in stable Age/SqFt/Value order.
    pub fn tags_for(&self, acct: &str) -> Vec<&'static str> {
        let mut tags = Vec::new();
        if self.closest_by_age.contains(acct) {
            tags.push("Age");
        }
        if self.closest_by_size.contains(acct) {
            tags.push("SqFt");
        }
        if self.lowest_value.contains(acct) {
            tags.push("Value");
        }
        tags
    }
}

/// Deduplicated union of the three groups, each member carrying its
/// adjustments forward.
#[derive(Debug, Clone)]
pub struct SelectedComparables {
    pub comparables: Vec<AdjustedComparable>,
    pub groups: GroupMembership,
}

/// Select the final candidate set for one subject.
///
/// Pure over its inputs: adjusts every pool member, builds the three sorted
/// top-5 groups, then unions them by account keeping first-seen order.
pub fn select_comparables(
    subject: Option<&SubjectProperty>,
    pool: &[ComparableProperty],
) -> Result<SelectedComparables, SelectionError> {
    if pool.is_empty() {
        return Err(SelectionError::EmptyPool);
    }

    let adjusted: Vec<AdjustedComparable> = pool
        .iter()
        .map(|comp| AdjustedComparable {
            adjustments: calculate_adjustments(subject, comp),
            comparable: comp.clone(),
        })
        .collect();

    // Without a subject there is nothing to sort against and no adjustments;
    // a non-empty pool still selects nothing.
    let Some(subject) = subject else {
        return Err(SelectionError::EmptySelection);
    };

    let subj_yr_impr = safe_parse_int(subject.yr_impr.as_deref());
    let subj_bld_ar = safe_parse_int(subject.bld_ar.as_deref());

    let closest_by_age = top_accounts_by_key(&adjusted, |c| {
        (safe_parse_int(c.comparable.yr_impr.as_deref()) - subj_yr_impr).abs() as f64
    });
    let closest_by_size = top_accounts_by_key(&adjusted, |c| {
        (safe_parse_int(c.comparable.bld_ar.as_deref()) - subj_bld_ar).abs() as f64
    });
    // Missing adjusted values sort last.
    let lowest_value = top_accounts_by_key(&adjusted, |c| {
        c.adjustments
            .as_ref()
            .map(|a| a.total_adjusted_value)
            .unwrap_or(f64::INFINITY)
    });

    let groups = GroupMembership {
        closest_by_age: closest_by_age.iter().cloned().collect(),
        closest_by_size: closest_by_size.iter().cloned().collect(),
        lowest_value: lowest_value.iter().cloned().collect(),
    };

    // Union in group order, first occurrence wins.
    let mut seen: HashSet<&str> = HashSet::new();
    let mut selected = Vec::new();
    for acct in closest_by_age
        .iter()
        .chain(closest_by_size.iter())
        .chain(lowest_value.iter())
    {
        if seen.insert(acct.as_str()) {
            if let Some(member) = adjusted.iter().find(|c| &c.comparable.acct == acct) {
                selected.push(member.clone());
            }
        }
    }

    if selected.is_empty() {
        return Err(SelectionError::EmptySelection);
    }

    tracing::debug!(
        pool = pool.len(),
        selected = selected.len(),
        by_age = groups.closest_by_age.len(),
        by_size = groups.closest_by_size.len(),
        by_value = groups.lowest_value.len(),
        "comparable selection complete"
    );

    Ok(SelectedComparables {
        comparables: selected,
        groups,
    })
}

/// Accounts of the top `GROUP_SIZE` comparables by ascending sort key.
fn top_accounts_by_key<F>(adjusted: &[AdjustedComparable], key: F) -> Vec<String>
where
    F: Fn(&AdjustedComparable) -> f64,
{
    let mut ordered: Vec<&AdjustedComparable> = adjusted.iter().collect();
    ordered.sort_by(|a, b| key(a).total_cmp(&key(b)));
    ordered
        .into_iter()
        .take(GROUP_SIZE)
        .map(|c| c.comparable.acct.clone())
        .collect()
}
