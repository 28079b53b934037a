//! Text formatting for summary-table cells.

/// Placeholder printed for a cell with no value.
pub const NO_VALUE: &str = "n/a";

/// Format a number with thousands separators and fixed decimals.
///
/// # Examples
///
/// ```
/// use ecology_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5, 1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let fixed = format!("{:.prec$}", value.abs(), prec = decimals as usize);
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut out = String::new();
    // Rounding can turn a tiny negative into "0.0"; no sign in that case.
    if value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Format a percentage cell, e.g. `"42.5%"`.
///
/// # Examples
///
/// ```
/// use ecology_core::formatting::format_percent;
///
/// assert_eq!(format_percent(Some(42.46)), "42.5%");
/// assert_eq!(format_percent(None), "n/a");
/// ```
pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{}%", format_number(v, 1)),
        None => NO_VALUE.to_string(),
    }
}

/// Format an optional measurement with `decimals` places.
pub fn format_optional(value: Option<f64>, decimals: u32) -> String {
    match value {
        Some(v) => format_number(v, decimals),
        None => NO_VALUE.to_string(),
    }
}

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    let len = s.len();
    let mut result = String::with_capacity(len + len / 3);
    for (i, c) in s.chars().enumerate() {
        if i != 0 && (len - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number_grouping() {
        assert_eq!(format_number(999.0, 0), "999");
        assert_eq!(format_number(1000.0, 0), "1,000");
        assert_eq!(format_number(123456.789, 2), "123,456.79");
    }

    #[test]
    fn test_format_number_negative_rounds_to_zero() {
        assert_eq!(format_number(-0.01, 1), "0.0");
    }

    #[test]
    fn test_format_percent_and_optional() {
        assert_eq!(format_percent(Some(100.0)), "100.0%");
        assert_eq!(format_optional(Some(0.25), 2), "0.25");
        assert_eq!(format_optional(None, 2), NO_VALUE);
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands("1"), "1");
        assert_eq!(group_thousands("1234"), "1,234");
        assert_eq!(group_thousands("1234567"), "1,234,567");
    }
}
