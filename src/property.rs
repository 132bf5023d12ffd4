//! Property records as supplied by the upstream appraisal-district data source.
//!
//! Numeric fields arrive as strings (the district exports them that way) and
//! are kept verbatim; every numeric read goes through [`safe_parse_int`],
//! which defaults to 0 instead of failing. Records are immutable once loaded:
//! year-built / building-area corrections produce a fresh value via
//! [`SubjectProperty::with_overrides`] so the original stays available for
//! before/after display.

use serde::{Deserialize, Serialize};

/// The property whose assessment is being appealed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectProperty {
    /// Appraisal-district account number; the stable identifier.
    pub acct: String,
    pub site_addr_1: Option<String>,
    pub site_addr_2: Option<String>,
    pub neighborhood_code: Option<String>,
    /// Quality grade token (e.g. "B+"), as classified by the district.
    pub grade: Option<String>,
    /// Condition token (e.g. "Good"), as classified by the district.
    pub condition: Option<String>,
    /// Year the primary improvement was built.
    pub yr_impr: Option<String>,
    /// Building area in square feet.
    pub bld_ar: Option<String>,
    /// Land area in square feet.
    pub land_ar: Option<String>,
    pub land_val: Option<String>,
    pub bld_val: Option<String>,
    pub x_features_val: Option<String>,
    pub tot_mkt_val: Option<String>,
    pub tot_appr_val: Option<String>,
}

/// A candidate sale/assessment record compared against the subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparableProperty {
    pub acct: String,
    pub site_addr_1: Option<String>,
    pub neighborhood_code: Option<String>,
    pub grade: Option<String>,
    pub condition: Option<String>,
    pub yr_impr: Option<String>,
    pub bld_ar: Option<String>,
    pub land_ar: Option<String>,
    pub land_val: Option<String>,
    pub bld_val: Option<String>,
    pub x_features_val: Option<String>,
    pub tot_mkt_val: Option<String>,
}

/// User-supplied corrections to the subject record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Overrides {
    pub bld_ar: Option<String>,
    pub yr_impr: Option<String>,
}

impl Overrides {
    pub fn is_empty(&self) -> bool {
        self.bld_ar.is_none() && self.yr_impr.is_none()
    }
}

impl SubjectProperty {
    /// Return a copy with the override corrections applied.
    ///
    /// Empty override strings are ignored, matching the behavior of leaving
    /// the correction field blank in the intake form.
    pub fn with_overrides(&self, overrides: &Overrides) -> SubjectProperty {
        let mut effective = self.clone();
        if let Some(bld_ar) = overrides.bld_ar.as_deref() {
            if !bld_ar.trim().is_empty() {
                effective.bld_ar = Some(bld_ar.to_string());
            }
        }
        if let Some(yr_impr) = overrides.yr_impr.as_deref() {
            if !yr_impr.trim().is_empty() {
                effective.yr_impr = Some(yr_impr.to_string());
            }
        }
        effective
    }
}

/// Parse an integer from district data, defaulting to 0 on any failure.
///
/// Tolerates leading/trailing whitespace and trailing junk ("2000 sqft"),
/// the same leniency the district's own exports require.
pub fn safe_parse_int(value: Option<&str>) -> i64 {
    let Some(raw) = value else { return 0 };
    let trimmed = raw.trim();
    let mut end = 0;
    for (i, c) in trimmed.char_indices() {
        if c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+')) {
            end = i + c.len_utf8();
        } else {
            break;
        }
    }
    trimmed[..end].parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn subject_fixture() -> SubjectProperty {
        SubjectProperty {
            acct: "0660640130020".into(),
            site_addr_1: Some("123 Heights Blvd".into()),
            site_addr_2: Some("Houston TX 77008".into()),
            neighborhood_code: Some("8101".into()),
            grade: Some("B".into()),
            condition: Some("Good".into()),
            yr_impr: Some("2000".into()),
            bld_ar: Some("2000".into()),
            land_ar: Some("6000".into()),
            land_val: Some("50000".into()),
            bld_val: Some("250000".into()),
            x_features_val: Some("5000".into()),
            tot_mkt_val: Some("300000".into()),
            tot_appr_val: Some("290000".into()),
        }
    }

    #[test]
    fn safe_parse_handles_clean_and_dirty_input() {
        assert_eq!(safe_parse_int(Some("150000")), 150000);
        assert_eq!(safe_parse_int(Some("  1800 ")), 1800);
        assert_eq!(safe_parse_int(Some("2000 sqft")), 2000);
        assert_eq!(safe_parse_int(Some("-250")), -250);
    }

    #[test]
    fn safe_parse_defaults_to_zero() {
        assert_eq!(safe_parse_int(None), 0);
        assert_eq!(safe_parse_int(Some("")), 0);
        assert_eq!(safe_parse_int(Some("n/a")), 0);
        assert_eq!(safe_parse_int(Some("-")), 0);
    }

    #[test]
    fn overrides_produce_new_value() {
        let subject = subject_fixture();
        let overrides = Overrides {
            bld_ar: Some("2200".into()),
            yr_impr: None,
        };
        let effective = subject.with_overrides(&overrides);

        assert_eq!(effective.bld_ar.as_deref(), Some("2200"));
        assert_eq!(effective.yr_impr.as_deref(), Some("2000"));
        // Original untouched, available for before/after display.
        assert_eq!(subject.bld_ar.as_deref(), Some("2000"));
    }

    #[test]
    fn blank_override_is_ignored() {
        let subject = subject_fixture();
        let overrides = Overrides {
            bld_ar: Some("   ".into()),
            yr_impr: Some("1995".into()),
        };
        let effective = subject.with_overrides(&overrides);

        assert_eq!(effective.bld_ar.as_deref(), Some("2000"));
        assert_eq!(effective.yr_impr.as_deref(), Some("1995"));
    }
}
