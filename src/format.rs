//! Display formatting for quote metrics.
//!
//! Values are rendered with Rust's fixed-precision formatting, which rounds
//! the exact binary value and sends true ties to the even digit. Literals such
//! as `12.345` sit slightly above the midpoint once stored as `f64`, so they
//! round up.

/// Placeholder shown for metrics the API did not return.
pub const MISSING: &str = "N/A";

/// Render an optional metric for display.
///
/// Plain values get thousands separators and two decimals, percentages get
/// two decimals and a trailing `%`.
pub fn format_value(value: Option<f64>, as_percent: bool) -> String {
    match value {
        Some(v) if v.is_finite() => {
            if as_percent {
                format!("{v:.2}%")
            } else {
                format_with_commas(v, 2)
            }
        }
        _ => MISSING.to_string(),
    }
}

/// Format `value` with `decimals` places and `,` between groups of three
/// integer digits.
pub fn format_with_commas(value: f64, decimals: usize) -> String {
    let formatted = format!("{value:.decimals$}");
    let (sign, unsigned) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted.as_str()),
    };
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match fraction {
        Some(fraction) => format!("{sign}{grouped}.{fraction}"),
        None => format!("{sign}{grouped}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_value_renders_placeholder() {
        assert_eq!(format_value(None, false), "N/A");
        assert_eq!(format_value(None, true), "N/A");
    }

    #[test]
    fn plain_value_is_grouped_with_two_decimals() {
        assert_eq!(format_value(Some(1234.5), false), "1,234.50");
        assert_eq!(format_value(Some(1e12), false), "1,000,000,000,000.00");
        assert_eq!(format_value(Some(999.999), false), "1,000.00");
        assert_eq!(format_value(Some(0.0), false), "0.00");
        assert_eq!(format_value(Some(12.0), false), "12.00");
    }

    #[test]
    fn percent_value_has_suffix_and_no_grouping() {
        assert_eq!(format_value(Some(12.345), true), "12.35%");
        assert_eq!(format_value(Some(12.355), true), "12.36%");
        assert_eq!(format_value(Some(-3.2), true), "-3.20%");
        assert_eq!(format_value(Some(1234.5), true), "1234.50%");
    }

    #[test]
    fn negative_values_keep_sign_outside_groups() {
        assert_eq!(format_value(Some(-1234567.891), false), "-1,234,567.89");
        assert_eq!(format_value(Some(-123.0), false), "-123.00");
    }

    #[test]
    fn non_finite_values_render_placeholder() {
        assert_eq!(format_value(Some(f64::NAN), false), "N/A");
        assert_eq!(format_value(Some(f64::INFINITY), true), "N/A");
    }

    #[test]
    fn format_with_commas_without_decimals() {
        assert_eq!(format_with_commas(1234567.0, 0), "1,234,567");
        assert_eq!(format_with_commas(100.0, 0), "100");
    }
}
