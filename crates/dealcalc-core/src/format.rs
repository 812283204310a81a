//! Display helpers for report tables. Values are rounded half away from zero.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::types::{Money, Multiple, Percent};

pub const NOT_AVAILABLE: &str = "N/A";

/// `$1,234.56`; negatives keep the sign after the symbol (`$-1,234.56`).
pub fn format_currency(value: Money) -> String {
    format!("${}", format_number(value, 2))
}

/// `7.00%` from a value already in percent.
pub fn format_percentage(value: Percent, decimals: u32) -> String {
    format!("{}%", fixed(value, decimals))
}

/// Fixed decimals with thousands separators.
pub fn format_number(value: Decimal, decimals: u32) -> String {
    let text = fixed(value, decimals);
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

/// `2.50x`
pub fn format_multiple(value: Multiple) -> String {
    format!("{}x", fixed(value, 2))
}

/// Format a value or fall back to `N/A`.
pub fn or_na<T>(value: Option<T>, f: impl FnOnce(T) -> String) -> String {
    value.map(f).unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn fixed(value: Decimal, decimals: u32) -> String {
    let rounded = value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    // -0.00 prints without a sign
    let rounded = if rounded.is_zero() { Decimal::ZERO } else { rounded };
    format!("{:.*}", decimals as usize, rounded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_currency() {
        assert_eq!(format_currency(dec!(1234.565)), "$1,234.57");
        assert_eq!(format_currency(dec!(550000)), "$550,000.00");
        assert_eq!(format_currency(dec!(0)), "$0.00");
        assert_eq!(format_currency(dec!(999.999)), "$1,000.00");
    }

    #[test]
    fn test_negative_currency() {
        assert_eq!(format_currency(dec!(-1234.5)), "$-1,234.50");
        assert_eq!(format_currency(dec!(-0.001)), "$0.00");
    }

    #[test]
    fn test_percentage() {
        assert_eq!(format_percentage(dec!(7), 2), "7.00%");
        assert_eq!(format_percentage(dec!(21.98699), 2), "21.99%");
    }

    #[test]
    fn test_number_grouping() {
        assert_eq!(format_number(dec!(1500), 0), "1,500");
        assert_eq!(format_number(dec!(123), 0), "123");
        assert_eq!(format_number(dec!(1234567.891), 1), "1,234,567.9");
    }

    #[test]
    fn test_multiple_and_na() {
        assert_eq!(format_multiple(dec!(2.5)), "2.50x");
        assert_eq!(or_na(Some(dec!(1.4286)), |v| format_number(v, 3)), "1.429");
        assert_eq!(or_na(None::<Decimal>, format_multiple), "N/A");
    }
}
