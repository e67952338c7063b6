//! Display formatting shared by views and reports.

use num_format::{Locale, ToFormattedString};

pub const NOT_AVAILABLE: &str = "N/A";

/// `$1.25M` at or above a million, otherwise `$845,000`.
pub fn fmt_price(value: Option<f64>) -> String {
    match finite(value) {
        Some(value) if value.abs() >= 1_000_000.0 => {
            format!("{}${:.2}M", sign(value), value.abs() / 1_000_000.0)
        }
        Some(value) => fmt_dollar(Some(value)),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Whole-dollar amount with separators, `$1,250`.
pub fn fmt_dollar(value: Option<f64>) -> String {
    match finite(value) {
        Some(value) => {
            let body = group_thousands(value.abs(), 0);
            format!("{}${body}", rounded_sign(value, &body))
        }
        None => NOT_AVAILABLE.to_string(),
    }
}

pub fn fmt_pct(value: Option<f64>, decimals: usize) -> String {
    match finite(value) {
        Some(value) => {
            let body = format!("{:.decimals$}", value.abs());
            format!("{}{body}%", rounded_sign(value, &body))
        }
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Percent with an explicit sign, for deltas.
pub fn fmt_signed_pct(value: Option<f64>, decimals: usize) -> String {
    match finite(value) {
        Some(value) => {
            let body = format!("{:.decimals$}", value.abs());
            match rounded_sign(value, &body) {
                "" => format!("+{body}%"),
                minus => format!("{minus}{body}%"),
            }
        }
        None => NOT_AVAILABLE.to_string(),
    }
}

pub fn fmt_num(value: Option<f64>, decimals: usize) -> String {
    match finite(value) {
        Some(value) => {
            let body = group_thousands(value.abs(), decimals);
            format!("{}{body}", rounded_sign(value, &body))
        }
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Integer count with separators, `12,400`.
pub fn fmt_count(value: u64) -> String {
    value.to_formatted_string(&Locale::en)
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|value| value.is_finite())
}

fn sign(value: f64) -> &'static str {
    if value < 0.0 {
        "-"
    } else {
        ""
    }
}

/// Negative values that round to zero print without a minus sign.
fn rounded_sign(value: f64, rendered: &str) -> &'static str {
    if rendered.bytes().any(|byte| matches!(byte, b'1'..=b'9')) {
        sign(value)
    } else {
        ""
    }
}

/// Rounds a non-negative value, then separates the whole part with
/// `num-format` and reattaches the fraction.
fn group_thousands(value: f64, decimals: usize) -> String {
    let formatted = format!("{value:.decimals$}");
    let (whole, fraction) = match formatted.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (formatted.as_str(), None),
    };

    let grouped = match whole.parse::<u128>() {
        Ok(whole) => whole.to_formatted_string(&Locale::en),
        Err(_) => whole.to_string(),
    };

    match fraction {
        Some(fraction) => format!("{grouped}.{fraction}"),
        None => grouped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prices_switch_to_millions() {
        assert_eq!(fmt_price(Some(845_000.0)), "$845,000");
        assert_eq!(fmt_price(Some(1_250_000.0)), "$1.25M");
        assert_eq!(fmt_price(Some(-12_500.0)), "-$12,500");
        assert_eq!(fmt_price(None), "N/A");
        assert_eq!(fmt_price(Some(f64::NAN)), "N/A");
    }

    #[test]
    fn numbers_group_and_round() {
        assert_eq!(fmt_num(Some(1234567.891), 1), "1,234,567.9");
        assert_eq!(fmt_num(Some(999.0), 0), "999");
        assert_eq!(fmt_dollar(Some(620.4)), "$620");
        assert_eq!(fmt_pct(Some(5.956), 1), "6.0%");
        assert_eq!(fmt_signed_pct(Some(2.0), 1), "+2.0%");
        assert_eq!(fmt_signed_pct(Some(-2.0), 1), "-2.0%");
        assert_eq!(fmt_count(12_400), "12,400");
    }

    #[test]
    fn values_rounding_to_zero_drop_the_minus_sign() {
        assert_eq!(fmt_num(Some(-0.4), 0), "0");
        assert_eq!(fmt_num(Some(-0.6), 0), "-1");
        assert_eq!(fmt_num(Some(-1234.5), 1), "-1,234.5");
        assert_eq!(fmt_dollar(Some(-0.2)), "$0");
        assert_eq!(fmt_pct(Some(-0.04), 1), "0.0%");
        assert_eq!(fmt_signed_pct(Some(-0.04), 1), "+0.0%");
        assert_eq!(fmt_signed_pct(Some(-0.06), 1), "-0.1%");
    }
}
