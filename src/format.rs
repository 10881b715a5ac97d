//! Number formatting shared by the KPI cards, panels, report and chart labels.

/// Placeholder for an undefined value (e.g. mean over no scores).
pub const UNDEFINED: &str = "n/a";

/// Group the digits of a non-negative integer string with commas.
fn group_digits(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Round to a whole number and add thousands separators: `1234567.8` -> `1,234,568`.
pub fn format_thousands(v: f64) -> String {
    if !v.is_finite() {
        return UNDEFINED.to_string();
    }
    let rounded = v.round();
    let digits = format!("{:.0}", rounded.abs());
    if rounded < 0.0 {
        format!("-{}", group_digits(&digits))
    } else {
        group_digits(&digits)
    }
}

pub fn format_count(n: u64) -> String {
    group_digits(&n.to_string())
}

/// Two decimals, or `n/a`.
pub fn format_score(v: Option<f64>) -> String {
    match v {
        Some(v) if v.is_finite() => format!("{:.2}", v),
        _ => UNDEFINED.to_string(),
    }
}

/// Signed two decimals, or `n/a`.
pub fn format_delta(v: Option<f64>) -> String {
    match v {
        Some(v) if v.is_finite() => format!("{:+.2}", v),
        _ => UNDEFINED.to_string(),
    }
}

pub fn format_percent(v: f64) -> String {
    format!("{:.1}%", v)
}

/// Compact axis label: `1.2M`, `35.0K`, `120`.
pub fn format_axis_label(v: f64) -> String {
    let abs = v.abs();
    if abs >= 1_000_000.0 {
        format!("{:.1}M", v / 1_000_000.0)
    } else if abs >= 10_000.0 {
        format!("{:.1}K", v / 1_000.0)
    } else if abs >= 100.0 || v.fract() == 0.0 {
        format!("{:.0}", v)
    } else {
        format!("{:.1}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands() {
        assert_eq!(format_thousands(0.0), "0");
        assert_eq!(format_thousands(999.4), "999");
        assert_eq!(format_thousands(1234567.8), "1,234,568");
        assert_eq!(format_thousands(-1000.0), "-1,000");
        assert_eq!(format_thousands(f64::NAN), "n/a");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(12), "12");
    }

    #[test]
    fn scores_and_deltas() {
        assert_eq!(format_score(Some(4.2567)), "4.26");
        assert_eq!(format_score(None), "n/a");
        assert_eq!(format_score(Some(f64::NAN)), "n/a");
        assert_eq!(format_delta(Some(-1.5)), "-1.50");
        assert_eq!(format_delta(Some(0.25)), "+0.25");
        assert_eq!(format_delta(None), "n/a");
    }

    #[test]
    fn axis_labels() {
        assert_eq!(format_axis_label(1_240_000.0), "1.2M");
        assert_eq!(format_axis_label(35_000.0), "35.0K");
        assert_eq!(format_axis_label(120.0), "120");
        assert_eq!(format_axis_label(2.5), "2.5");
        assert_eq!(format_percent(12.345), "12.3%");
    }
}
