//! Parsing of raw ranking-service replies.
//!
//! Replies are expected to be a YAML document with `top_comps` and
//! `excluded` sequences, but models routinely wrap the document in a
//! Markdown code fence despite instructions. The fence is stripped here;
//! per-entry cleaning lives in [`super::validator`].

use std::collections::HashSet;

use super::validator::{clean_comparables, clean_excluded};
use super::types::AnalysisData;
use super::RankingError;

/// Remove a wrapping Markdown code fence (optionally tagged, e.g.
/// ```` ```yaml ````) from a reply. Text without a leading fence is
/// returned unchanged apart from trimming.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the fence line itself, tag included.
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => return trimmed,
    };

    // Drop a closing fence line if present.
    let body = body.trim_end();
    if let Some(stripped) = body.strip_suffix("```") {
        stripped.trim_end()
    } else {
        body
    }
}

/// Parse a cleaned reply into validated [`AnalysisData`].
///
/// Entries that are malformed, self-referential, or duplicated are dropped
/// with a warning; a missing or mistyped `top_comps` field is a hard
/// format failure subject to retry.
pub fn parse_analysis(text: &str, subject_acct: &str) -> Result<AnalysisData, RankingError> {
    let document: serde_yaml::Value =
        serde_yaml::from_str(text).map_err(|e| RankingError::Yaml(e.to_string()))?;

    if !document.is_mapping() {
        return Err(RankingError::Format(
            "expected a YAML mapping at the top level".into(),
        ));
    }

    let top_seq = document
        .get("top_comps")
        .and_then(|v| v.as_sequence())
        .ok_or_else(|| RankingError::Format("missing or invalid 'top_comps' field".into()))?;

    let top_comps = clean_comparables(top_seq, subject_acct);
    // Accepted accounts seed the excluded pass so no account lands in both lists.
    let ranked_accts: HashSet<String> = top_comps.iter().map(|c| c.acct.clone()).collect();

    let excluded = document
        .get("excluded")
        .and_then(|v| v.as_sequence())
        .map(|seq| clean_excluded(seq, subject_acct, &ranked_accts))
        .unwrap_or_default();

    Ok(AnalysisData {
        top_comps,
        excluded,
    })
}

/// A schema-conforming reply shared across module tests.
#[cfg(test)]
pub(crate) const GOOD_REPLY: &str = r#"top_comps:
  - rank: 1
    acct: "ACCT-001"
    address: "100 Oak St"
    adjusted_value: "$210,000"
    adjusted_psf: "$117/sqft"
    rationale: "Closest in age and size with a strong discount."
  - rank: 2
    acct: "ACCT-002"
    address: "101 Oak St"
    adjusted_value: "$215,000"
    adjusted_psf: "$119/sqft"
    rationale: "Same neighborhood, slightly larger."
  - rank: 3
    acct: "ACCT-003"
    address: "102 Oak St"
    adjusted_value: "$220,000"
    adjusted_psf: "$122/sqft"
    rationale: "Comparable condition and grade."
  - rank: 4
    acct: "ACCT-004"
    address: "103 Oak St"
    adjusted_value: "$225,000"
    adjusted_psf: "$125/sqft"
    rationale: "Moderate discount, very similar year built."
  - rank: 5
    acct: "ACCT-005"
    address: "104 Oak St"
    adjusted_value: "$230,000"
    adjusted_psf: "$127/sqft"
    rationale: "Slightly higher value but closest square footage."
excluded:
  - acct: "ACCT-006"
    note: "Adjusted value too high to help the appeal."
  - acct: "ACCT-007"
    note: "Renovated recently; not representative."
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tagged_fence() {
        let wrapped = format!("```yaml\n{GOOD_REPLY}```");
        let stripped = strip_code_fences(&wrapped);
        assert!(stripped.starts_with("top_comps:"));
        assert!(!stripped.contains("```"));
    }

    #[test]
    fn strips_untagged_fence() {
        let wrapped = format!("```\n{GOOD_REPLY}\n```");
        let stripped = strip_code_fences(&wrapped);
        assert!(stripped.starts_with("top_comps:"));
    }

    #[test]
    fn unfenced_text_passes_through() {
        assert_eq!(strip_code_fences(GOOD_REPLY).trim(), GOOD_REPLY.trim());
        assert_eq!(strip_code_fences("  plain\n"), "plain");
    }

    #[test]
    fn parses_full_reply() {
        let data = parse_analysis(GOOD_REPLY, "ACCT-SUBJ").unwrap();
        assert_eq!(data.top_comps.len(), 5);
        assert_eq!(data.top_comps[0].acct, "ACCT-001");
        assert_eq!(data.top_comps[0].rank, 1);
        assert_eq!(data.top_comps[0].adjusted_value, "$210,000");
        assert_eq!(data.excluded.len(), 2);
        assert_eq!(data.excluded[1].acct, "ACCT-007");
    }

    #[test]
    fn account_named_in_both_lists_stays_ranked_only() {
        // A reply naming the same account as both a pick and a near-miss
        // must keep it in top_comps and drop the excluded entry.
        let reply = GOOD_REPLY.replace("ACCT-006", "ACCT-001");
        let data = parse_analysis(&reply, "ACCT-SUBJ").unwrap();

        assert!(data.top_comps.iter().any(|c| c.acct == "ACCT-001"));
        assert_eq!(data.excluded.len(), 1);
        assert!(data.excluded.iter().all(|e| e.acct != "ACCT-001"));
        let ranked: Vec<&str> = data.top_comps.iter().map(|c| c.acct.as_str()).collect();
        assert!(data.excluded.iter().all(|e| !ranked.contains(&e.acct.as_str())));
    }

    #[test]
    fn invalid_yaml_is_a_yaml_error() {
        let result = parse_analysis("top_comps: [unclosed", "ACCT-SUBJ");
        assert!(matches!(result, Err(RankingError::Yaml(_))));
    }

    #[test]
    fn non_mapping_document_is_a_format_error() {
        let result = parse_analysis("- just\n- a\n- list\n", "ACCT-SUBJ");
        assert!(matches!(result, Err(RankingError::Format(_))));
    }

    #[test]
    fn missing_top_comps_is_a_format_error() {
        let result = parse_analysis("excluded: []\n", "ACCT-SUBJ");
        assert!(matches!(result, Err(RankingError::Format(_))));
    }

    #[test]
    fn wrong_typed_top_comps_is_a_format_error() {
        let result = parse_analysis("top_comps: \"five of them\"\n", "ACCT-SUBJ");
        assert!(matches!(result, Err(RankingError::Format(_))));
    }

    #[test]
    fn missing_excluded_defaults_to_empty() {
        let reply = "top_comps:\n  - acct: \"ACCT-001\"\n    address: \"100 Oak St\"\n";
        let data = parse_analysis(reply, "ACCT-SUBJ").unwrap();
        assert_eq!(data.top_comps.len(), 1);
        assert!(data.excluded.is_empty());
    }
}
