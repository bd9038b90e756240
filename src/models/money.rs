//! Money amounts
//!
//! Amounts are stored as integer cents. Users type them the Croatian way
//! ("1.234,56") or the plain way ("1234.56"); both parse to the same value.

/// Parse an amount into cents.
///
/// When both separators appear, the last one is the decimal separator and
/// the other groups thousands. A lone `,` or a single `.` is the decimal
/// separator; several dots are thousands groups. At most two decimals.
pub fn parse_amount(input: &str) -> Option<i64> {
    let cleaned: String = input
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '€')
        .collect();
    let (negative, digits) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.as_str()),
    };
    if digits.is_empty() {
        return None;
    }

    let last_comma = digits.rfind(',');
    let last_dot = digits.rfind('.');
    let decimal_at = match (last_comma, last_dot) {
        (Some(c), Some(d)) => Some(c.max(d)),
        (Some(c), None) => {
            if digits.matches(',').count() > 1 {
                return None;
            }
            Some(c)
        }
        (None, Some(d)) => {
            if digits.matches('.').count() > 1 {
                None
            } else {
                Some(d)
            }
        }
        (None, None) => None,
    };

    let (whole, fraction) = match decimal_at {
        Some(at) => (&digits[..at], &digits[at + 1..]),
        None => (digits, ""),
    };

    let whole: String = whole.chars().filter(|c| *c != '.' && *c != ',').collect();
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.chars().all(|c| c.is_ascii_digit())
        || !fraction.chars().all(|c| c.is_ascii_digit())
        || fraction.len() > 2
    {
        return None;
    }

    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let fraction: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().ok()? * 10,
        _ => fraction.parse().ok()?,
    };

    let cents = whole.checked_mul(100)?.checked_add(fraction)?;
    Some(if negative { -cents } else { cents })
}

/// Format cents as "1.234,56"
pub fn format_amount(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let whole = (abs / 100).to_string();
    let fraction = abs % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    format!("{}{},{:02}", sign, grouped, fraction)
}

/// Cents as a floating-point number of units, for spreadsheet cells
pub fn cents_to_units(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Spreadsheet numbers back to cents, rounding to the nearest cent
pub fn units_to_cents(units: f64) -> Option<i64> {
    let cents = (units * 100.0).round();
    if cents.is_finite() && cents.abs() < i64::MAX as f64 {
        Some(cents as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_croatian_format() {
        assert_eq!(parse_amount("1.234,56"), Some(123_456));
        assert_eq!(parse_amount("1234,56"), Some(123_456));
        assert_eq!(parse_amount("1.234.567,5"), Some(123_456_750));
        assert_eq!(parse_amount("0,05"), Some(5));
    }

    #[test]
    fn test_parse_plain_format() {
        assert_eq!(parse_amount("1234.5"), Some(123_450));
        assert_eq!(parse_amount("1,234.56"), Some(123_456));
        assert_eq!(parse_amount("100"), Some(10_000));
        assert_eq!(parse_amount(" 12 € "), Some(1_200));
        assert_eq!(parse_amount("-3,10"), Some(-310));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("-"), None);
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount("1,234,5"), None);
        assert_eq!(parse_amount("1,234"), None);
        assert_eq!(parse_amount("12,345"), None);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0), "0,00");
        assert_eq!(format_amount(5), "0,05");
        assert_eq!(format_amount(123_456), "1.234,56");
        assert_eq!(format_amount(100_000_000), "1.000.000,00");
        assert_eq!(format_amount(-123_456), "-1.234,56");
    }

    #[test]
    fn test_units_conversion() {
        assert_eq!(units_to_cents(12.34), Some(1_234));
        assert_eq!(units_to_cents(0.1 + 0.2), Some(30));
        assert_eq!(units_to_cents(f64::NAN), None);
        assert!((cents_to_units(1_234) - 12.34).abs() < f64::EPSILON);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(100))]

            #[test]
            fn formatted_amount_parses_back(cents in -1_000_000_000_000i64..1_000_000_000_000i64) {
                prop_assert_eq!(parse_amount(&format_amount(cents)), Some(cents));
            }
        }
    }
}
