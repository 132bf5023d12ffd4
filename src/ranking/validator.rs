//! Per-entry cleaning of ranking replies and the minimum-quality rule.
//!
//! Individual bad entries are recoverable: they are logged and dropped, never
//! escalated to a hard failure. What is NOT recoverable is ending up with too
//! few usable comps, which is a business-rule failure distinct from "could
//! not parse"; see [`validate_quality`].

use std::collections::HashSet;

use serde_yaml::Value;

use super::types::{ExcludedNote, RankedComparable};
use super::RankingError;
use crate::config::MIN_QUALITY_COMPS;

/// Clean the `top_comps` sequence: require non-empty `acct` and `address`,
/// drop self-referential and duplicate entries, coerce the remaining fields
/// to defaults instead of failing.
pub fn clean_comparables(entries: &[Value], subject_acct: &str) -> Vec<RankedComparable> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut cleaned = Vec::new();

    for entry in entries {
        let Some(acct) = required_str(entry, "acct") else {
            tracing::warn!("dropping ranked comp with missing acct");
            continue;
        };
        let Some(address) = required_str(entry, "address") else {
            tracing::warn!(acct = %acct, "dropping ranked comp with missing address");
            continue;
        };
        if acct == subject_acct {
            tracing::warn!(acct = %acct, "dropping subject property from ranked comps");
            continue;
        }
        if !seen.insert(acct.clone()) {
            tracing::warn!(acct = %acct, "dropping duplicate ranked comp");
            continue;
        }

        cleaned.push(RankedComparable {
            rank: entry.get("rank").and_then(Value::as_i64).unwrap_or(0),
            acct,
            address,
            adjusted_value: optional_str(entry, "adjusted_value"),
            adjusted_psf: optional_str(entry, "adjusted_psf"),
            rationale: optional_str(entry, "rationale"),
        });
    }

    cleaned
}

/// Clean the optional `excluded` sequence with the same drop rules;
/// entries need a non-empty `acct` and `note`. Accounts already accepted
/// into `top_comps` are dropped here so no account sits in both lists.
pub fn clean_excluded(
    entries: &[Value],
    subject_acct: &str,
    ranked_accts: &HashSet<String>,
) -> Vec<ExcludedNote> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut cleaned = Vec::new();

    for entry in entries {
        let Some(acct) = required_str(entry, "acct") else {
            tracing::warn!("dropping excluded entry with missing acct");
            continue;
        };
        let Some(note) = required_str(entry, "note") else {
            tracing::warn!(acct = %acct, "dropping excluded entry with missing note");
            continue;
        };
        if acct == subject_acct {
            tracing::warn!(acct = %acct, "dropping subject property from excluded list");
            continue;
        }
        if ranked_accts.contains(&acct) {
            tracing::warn!(acct = %acct, "dropping excluded entry already ranked in top comps");
            continue;
        }
        if !seen.insert(acct.clone()) {
            tracing::warn!(acct = %acct, "dropping duplicate excluded entry");
            continue;
        }

        cleaned.push(ExcludedNote { acct, note });
    }

    cleaned
}

/// Enforce the minimum-quality rule on a cleaned reply.
///
/// Parsing fine but keeping fewer than [`MIN_QUALITY_COMPS`] comps is a
/// distinct, user-facing failure: the appeal needs enough comps to argue a
/// defensible median.
pub fn validate_quality(data: &super::types::AnalysisData) -> Result<(), RankingError> {
    if data.top_comps.len() < MIN_QUALITY_COMPS {
        return Err(RankingError::Quality {
            found: data.top_comps.len(),
        });
    }
    Ok(())
}

fn required_str(entry: &Value, key: &str) -> Option<String> {
    let value = entry.get(key)?.as_str()?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn optional_str(entry: &Value, key: &str) -> String {
    entry
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::types::AnalysisData;

    fn entry(acct: &str, address: &str) -> Value {
        serde_yaml::from_str(&format!(
            "rank: 1\nacct: \"{acct}\"\naddress: \"{address}\"\nadjusted_value: \"$200,000\"\nadjusted_psf: \"$110/sqft\"\nrationale: \"Similar.\""
        ))
        .unwrap()
    }

    #[test]
    fn subject_account_is_dropped() {
        let entries = vec![entry("ACCT-SUBJ", "1 Subject Way"), entry("ACCT-001", "100 Oak St")];
        let cleaned = clean_comparables(&entries, "ACCT-SUBJ");
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].acct, "ACCT-001");
    }

    #[test]
    fn duplicates_keep_first_occurrence() {
        let entries = vec![
            entry("ACCT-001", "100 Oak St"),
            entry("ACCT-001", "100 Oak St again"),
            entry("ACCT-002", "101 Oak St"),
        ];
        let cleaned = clean_comparables(&entries, "ACCT-SUBJ");
        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned[0].address, "100 Oak St");
    }

    #[test]
    fn malformed_entries_are_dropped_not_fatal() {
        let entries = vec![
            serde_yaml::from_str("just a string").unwrap(),
            serde_yaml::from_str("acct: \"ACCT-001\"").unwrap(), // no address
            serde_yaml::from_str("acct: \"\"\naddress: \"blank acct\"").unwrap(),
            entry("ACCT-002", "101 Oak St"),
        ];
        let cleaned = clean_comparables(&entries, "ACCT-SUBJ");
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].acct, "ACCT-002");
    }

    #[test]
    fn missing_optional_fields_coerce_to_defaults() {
        let entries =
            vec![serde_yaml::from_str("acct: \"ACCT-001\"\naddress: \"100 Oak St\"").unwrap()];
        let cleaned = clean_comparables(&entries, "ACCT-SUBJ");
        assert_eq!(cleaned[0].rank, 0);
        assert_eq!(cleaned[0].adjusted_value, "");
        assert_eq!(cleaned[0].rationale, "");
    }

    #[test]
    fn excluded_requires_note() {
        let entries = vec![
            serde_yaml::from_str("acct: \"ACCT-001\"").unwrap(),
            serde_yaml::from_str("acct: \"ACCT-002\"\nnote: \"Too expensive.\"").unwrap(),
        ];
        let cleaned = clean_excluded(&entries, "ACCT-SUBJ", &HashSet::new());
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].acct, "ACCT-002");
    }

    #[test]
    fn excluded_drops_subject_and_duplicates() {
        let entries = vec![
            serde_yaml::from_str("acct: \"ACCT-SUBJ\"\nnote: \"self\"").unwrap(),
            serde_yaml::from_str("acct: \"ACCT-001\"\nnote: \"first\"").unwrap(),
            serde_yaml::from_str("acct: \"ACCT-001\"\nnote: \"second\"").unwrap(),
        ];
        let cleaned = clean_excluded(&entries, "ACCT-SUBJ", &HashSet::new());
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].note, "first");
    }

    #[test]
    fn excluded_drops_accounts_already_ranked() {
        let ranked: HashSet<String> = ["ACCT-001".to_string()].into_iter().collect();
        let entries = vec![
            serde_yaml::from_str("acct: \"ACCT-001\"\nnote: \"also ranked\"").unwrap(),
            serde_yaml::from_str("acct: \"ACCT-009\"\nnote: \"too far out\"").unwrap(),
        ];
        let cleaned = clean_excluded(&entries, "ACCT-SUBJ", &ranked);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].acct, "ACCT-009");
    }

    #[test]
    fn quality_rule_needs_three_comps() {
        let two = AnalysisData {
            top_comps: clean_comparables(
                &[entry("ACCT-001", "a"), entry("ACCT-002", "b")],
                "ACCT-SUBJ",
            ),
            excluded: vec![],
        };
        let err = validate_quality(&two).unwrap_err();
        assert!(matches!(err, RankingError::Quality { found: 2 }));
        assert!(!err.to_string().is_empty());

        let three = AnalysisData {
            top_comps: clean_comparables(
                &[
                    entry("ACCT-001", "a"),
                    entry("ACCT-002", "b"),
                    entry("ACCT-003", "c"),
                ],
                "ACCT-SUBJ",
            ),
            excluded: vec![],
        };
        assert!(validate_quality(&three).is_ok());
    }
}
