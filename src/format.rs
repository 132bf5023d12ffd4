//! Currency and number display helpers for prompts and reports.

/// Format a dollar amount as "$1,234,567" (no cents). `None` and
/// non-finite values render as "N/A".
pub fn format_currency(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => {
            let rounded = v.round() as i64;
            if rounded < 0 {
                format!("-${}", group_thousands(rounded.unsigned_abs()))
            } else {
                format!("${}", group_thousands(rounded as u64))
            }
        }
        _ => "N/A".to_string(),
    }
}

/// Insert thousands separators: 1234567 -> "1,234,567".
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
