//! Ranking-service prompt construction.
//!
//! Intentionally simple text templating: subject block, one block per
//! candidate with its group tags, and the output schema. No business logic
//! beyond currency display.

use crate::format::format_currency;
use crate::property::{safe_parse_int, ComparableProperty, Overrides, SubjectProperty};
use crate::selection::SelectedComparables;

/// Appended to the prompt on retry attempts: some models wrap the reply in
/// Markdown fences or preface it with commentary, which breaks parsing.
pub const RETRY_DIRECTIVE: &str = "\
IMPORTANT: Your previous reply could not be parsed. Respond with RAW YAML only. \
Do NOT wrap the output in code fences (```). Do NOT add any commentary before \
or after. Start your reply directly with the line `top_comps:`.";

/// Build the full ranking prompt for one subject and its candidate set.
pub fn build_ranking_prompt(
    subject: &SubjectProperty,
    selected: &SelectedComparables,
    overrides: Option<&Overrides>,
) -> String {
    let subject_block = format_subject_block(subject, overrides);
    let comparables_block = format_comparables_block(selected);
    let appraised = format_currency(parsed(subject.tot_appr_val.as_deref()));

    format!(
        r#"You are a property tax protest expert. You are given a subject property and a list of comparable properties.
You are tasked with choosing the best five comparables for a property tax appeal.
You are also tasked with choosing the next two comparables that were nearly chosen.
Choose the comparables that optimize for tax savings while still being relevant to the subject property.

Inputs:
  1. The subject property:
{subject_block}

  2. The following pre-filtered comparable properties. They are close to the subject in age, square footage, or adjusted value; group memberships are tagged on each:

{comparables_block}

Deliverable: choose the best **five** comps for a property-tax appeal, then list the next two that were nearly chosen.
You need the median adjusted value of your five picks to beat {appraised}.

Return only valid YAML (no extra text, commentary, or Markdown).
Schema to follow exactly:

top_comps:            # exactly five items, rank ascending (1 = best)
  - rank: 1
    acct: "ACCOUNT-ID"
    address: "123 Main St"
    adjusted_value: "$1,234,567"
    adjusted_psf: "$456/sqft"
    rationale: "One concise sentence."

excluded:             # exactly two items (the would-be #6 and #7)
  - acct: "ACCOUNT-ID"
    note: "One-line reason it was not selected."
  - acct: "ACCOUNT-ID"
    note: "One-line reason it was not selected."
"#
    )
}

/// Subject property details for the prompt, with override markers.
pub fn format_subject_block(subject: &SubjectProperty, overrides: Option<&Overrides>) -> String {
    let year_overridden = overrides.is_some_and(|o| o.yr_impr.is_some());
    let area_overridden = overrides.is_some_and(|o| o.bld_ar.is_some());

    format!(
        "     Account: {}\n\
         \x20    Address: {}\n\
         \x20    Neighborhood: {}\n\
         \x20    Grade: {}\n\
         \x20    Condition: {}\n\
         \x20    Year Built: {}{}\n\
         \x20    Building SF: {}{}\n\
         \x20    Land SF: {}\n\
         \x20    Market Value: {}",
        subject.acct,
        text_or_na(subject.site_addr_1.as_deref()),
        text_or_na(subject.neighborhood_code.as_deref()),
        text_or_na(subject.grade.as_deref()),
        text_or_na(subject.condition.as_deref()),
        text_or_na(subject.yr_impr.as_deref()),
        if year_overridden { " (Overridden)" } else { "" },
        count_or_na(subject.bld_ar.as_deref()),
        if area_overridden { " (Overridden)" } else { "" },
        count_or_na(subject.land_ar.as_deref()),
        format_currency(parsed(subject.tot_mkt_val.as_deref())),
    )
}

/// One numbered block per candidate with group tags and adjusted values.
pub fn format_comparables_block(selected: &SelectedComparables) -> String {
    selected
        .comparables
        .iter()
        .enumerate()
        .map(|(index, member)| {
            let comp = &member.comparable;
            let tags = selected.groups.tags_for(&comp.acct);
            let groups = if tags.is_empty() {
                "None".to_string()
            } else {
                tags.join(", ")
            };

            let adj_value = member.adjustments.as_ref().map(|a| a.total_adjusted_value);
            let bld_ar = safe_parse_int(comp.bld_ar.as_deref());
            let adj_psf = match adj_value {
                Some(value) if bld_ar > 0 => {
                    format!("{}/sqft", format_currency(Some(value / bld_ar as f64)))
                }
                _ => "N/A".to_string(),
            };

            format!(
                "{}. Account: {}\n\
                 \x20  Address: {}\n\
                 \x20  Groups: {}\n\
                 \x20  Year: {}, SqFt: {}\n\
                 \x20  Adj. Value: {} ({})\n\
                 \x20  Original Mkt Value: {}",
                index + 1,
                comp.acct,
                text_or_na(comp.site_addr_1.as_deref()),
                groups,
                text_or_na(comp.yr_impr.as_deref()),
                count_or_na(comp.bld_ar.as_deref()),
                format_currency(adj_value),
                adj_psf,
                format_currency(parsed(comp.tot_mkt_val.as_deref())),
            )
        })
        .collect::<Vec<_>>()
        .join("\n---\n")
}

fn text_or_na(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => "N/A",
    }
}

/// Display a raw count field with thousands separators, or "N/A".
fn count_or_na(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => {
            crate::format::group_thousands(safe_parse_int(Some(v)).max(0) as u64)
        }
        _ => "N/A".to_string(),
    }
}

fn parsed(value: Option<&str>) -> Option<f64> {
    value.map(|v| safe_parse_int(Some(v)) as f64)
}
