//! Dollar adjustments and similarity scoring for one (subject, comparable) pair.
//!
//! Adjustment model:
//! - size: the comparable's improvement $/sqft times half the area delta.
//!   Splitting the delta in half reflects the diminishing marginal value of
//!   extra area.
//! - age: 0.5% of the comparable's improvement value per year of age
//!   difference, positive when the comparable is older than the subject.
//! - features: straight delta of extra-features value.
//! - land: substituted wholesale from the subject. Land deltas are driven by
//!   zoning and frontage noise that cannot be adjusted per comp reliably, so
//!   `land_adjustment_amount` is carried for tooltips only and never feeds
//!   the total.

use serde::Serialize;

use crate::property::{safe_parse_int, ComparableProperty, SubjectProperty};

/// Weight of the value-discount sub-score.
const VALUE_WEIGHT: f64 = 0.70;
/// Weight of the building-area proximity sub-score.
const SIZE_WEIGHT: f64 = 0.20;
/// Weight of the year-built proximity sub-score.
const AGE_WEIGHT: f64 = 0.05;
/// Weight of the adjustment-reliability sub-score.
const RELIABILITY_WEIGHT: f64 = 0.05;

/// Discount cap: a comp 60% below the subject's market value scores 100.
const MAX_DISCOUNT: f64 = 0.60;

/// Age differences beyond this many years score 0 on the age sub-score.
const AGE_RANGE_YEARS: f64 = 15.0;

/// Reliability penalty scale: an adjustment that moves a comp 30% away from
/// its own original market value scores 0 on the reliability sub-score.
const RELIABILITY_RANGE: f64 = 0.30;

/// Computed adjustments for one comparable against one subject.
///
/// Derived, never persisted on its own; recomputed whenever the subject or
/// an override changes. The raw inputs are carried for audit display.
#[derive(Debug, Clone, Serialize)]
pub struct AdjustmentResult {
    pub comp_impr_psf: f64,
    pub size_adjustment: f64,
    pub age_adjustment: f64,
    pub features_adjustment: f64,
    /// Diagnostic only; excluded from `total_adjusted_value`.
    pub land_adjustment_amount: f64,
    pub adjusted_improvement_value: f64,
    pub total_adjusted_value: f64,
    /// 0-100, two decimals.
    pub comparable_score: f64,
    // Raw inputs used, for tooltips and audit.
    pub subj_bld_ar: i64,
    pub comp_bld_ar: i64,
    pub subj_yr_impr: i64,
    pub comp_yr_impr: i64,
    pub comp_bld_val: i64,
    pub subj_land_val: i64,
    pub comp_land_val: i64,
    pub subj_x_features_val: i64,
    pub comp_x_features_val: i64,
}

/// A comparable carrying its computed adjustments.
#[derive(Debug, Clone, Serialize)]
pub struct AdjustedComparable {
    pub comparable: ComparableProperty,
    pub adjustments: Option<AdjustmentResult>,
}

/// Compute adjustments for one comparable against the subject.
///
/// Returns `None` when no subject is available; there is no baseline to
/// adjust toward without one.
pub fn calculate_adjustments(
    subject: Option<&SubjectProperty>,
    comp: &ComparableProperty,
) -> Option<AdjustmentResult> {
    let subject = subject?;

    let subj_bld_ar = safe_parse_int(subject.bld_ar.as_deref());
    let comp_bld_ar = safe_parse_int(comp.bld_ar.as_deref());
    let subj_yr_impr = safe_parse_int(subject.yr_impr.as_deref());
    let comp_yr_impr = safe_parse_int(comp.yr_impr.as_deref());
    let comp_bld_val = safe_parse_int(comp.bld_val.as_deref());
    let subj_land_val = safe_parse_int(subject.land_val.as_deref());
    let comp_land_val = safe_parse_int(comp.land_val.as_deref());
    let subj_x_features_val = safe_parse_int(subject.x_features_val.as_deref());
    let comp_x_features_val = safe_parse_int(comp.x_features_val.as_deref());

    let comp_impr_psf = if comp_bld_ar > 0 {
        comp_bld_val as f64 / comp_bld_ar as f64
    } else {
        0.0
    };
    let size_adjustment = comp_impr_psf * (subj_bld_ar - comp_bld_ar) as f64 / 2.0;
    let age_adjustment = 0.005 * (subj_yr_impr - comp_yr_impr) as f64 * comp_bld_val as f64;
    let features_adjustment = (subj_x_features_val - comp_x_features_val) as f64;
    let adjusted_improvement_value =
        comp_bld_val as f64 + size_adjustment + age_adjustment + features_adjustment;
    let total_adjusted_value = adjusted_improvement_value + subj_land_val as f64;
    let land_adjustment_amount = (subj_land_val - comp_land_val) as f64;

    let comparable_score = comparable_score(
        safe_parse_int(subject.tot_mkt_val.as_deref()),
        subj_bld_ar,
        subj_yr_impr,
        comp_bld_ar,
        comp_yr_impr,
        safe_parse_int(comp.tot_mkt_val.as_deref()),
        total_adjusted_value,
    );

    Some(AdjustmentResult {
        comp_impr_psf,
        size_adjustment,
        age_adjustment,
        features_adjustment,
        land_adjustment_amount,
        adjusted_improvement_value,
        total_adjusted_value,
        comparable_score,
        subj_bld_ar,
        comp_bld_ar,
        subj_yr_impr,
        comp_yr_impr,
        comp_bld_val,
        subj_land_val,
        comp_land_val,
        subj_x_features_val,
        comp_x_features_val,
    })
}

/// Weighted 0-100 similarity/discount score, rounded to two decimals.
fn comparable_score(
    subj_mkt_val: i64,
    subj_bld_ar: i64,
    subj_yr_impr: i64,
    comp_bld_ar: i64,
    comp_yr_impr: i64,
    comp_mkt_val: i64,
    total_adjusted_value: f64,
) -> f64 {
    // Value: how far below the subject's market value the adjusted comp
    // lands, rescaled so a discount of MAX_DISCOUNT (or more) scores 100.
    let value_score = if subj_mkt_val > 0 {
        let discount = ((subj_mkt_val as f64 - total_adjusted_value) / subj_mkt_val as f64)
            .clamp(0.0, MAX_DISCOUNT);
        discount / MAX_DISCOUNT * 100.0
    } else {
        0.0
    };

    // Size: linear falloff over half the subject's area (floor 500 sqft so
    // small homes don't get a degenerate denominator).
    let size_range = (subj_bld_ar as f64 * 0.5).max(500.0);
    let size_score =
        (100.0 - (subj_bld_ar - comp_bld_ar).abs() as f64 / size_range * 100.0).max(0.0);

    let age_score =
        (100.0 - (subj_yr_impr - comp_yr_impr).abs() as f64 / AGE_RANGE_YEARS * 100.0).max(0.0);

    // Reliability: penalize adjustments that move a comp far from its own
    // original assessed value; a proxy for how trustworthy the adjustment is.
    let reliability_score = if comp_mkt_val > 0 {
        let drift = (total_adjusted_value - comp_mkt_val as f64).abs() / comp_mkt_val as f64;
        (100.0 - drift / RELIABILITY_RANGE * 100.0).max(0.0)
    } else {
        0.0
    };

    let weighted = value_score * VALUE_WEIGHT
        + size_score * SIZE_WEIGHT
        + age_score * AGE_WEIGHT
        + reliability_score * RELIABILITY_WEIGHT;
    (weighted * 100.0).round() / 100.0
}
