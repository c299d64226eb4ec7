//! Display formatting for summary metrics.

use super::types::PriceChange;

/// Insert thousands separators into the integer part of a formatted number.
pub fn group_thousands(formatted: &str) -> String {
    let (sign, unsigned) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, ch) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match fraction {
        Some(fraction) => format!("{}{}.{}", sign, grouped, fraction),
        None => format!("{}{}", sign, grouped),
    }
}

/// `$1,234.56`
pub fn format_price(value: f64) -> String {
    format!("${}", group_thousands(&format!("{:.2}", value)))
}

/// `10.00%`, or `n/a` when the change is undefined
pub fn format_change(change: PriceChange) -> String {
    match change {
        PriceChange::Percent(p) => format!("{:.2}%", p),
        PriceChange::Undefined => "n/a".to_string(),
    }
}

/// Whole-number volume with separators, optionally as a dollar amount
pub fn format_volume(value: f64, as_currency: bool) -> String {
    let grouped = group_thousands(&format!("{:.0}", value));
    if as_currency {
        format!("${}", grouped)
    } else {
        grouped
    }
}

/// Compact axis label (`1.2K`, `3.4M`, `5.6B`)
pub fn format_compact(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e9 {
        format!("{:.1}B", value / 1e9)
    } else if abs >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if abs >= 1e3 {
        format!("{:.1}K", value / 1e3)
    } else if abs >= 1.0 {
        format!("{:.2}", value)
    } else {
        format!("{:.6}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands("0"), "0");
        assert_eq!(group_thousands("123"), "123");
        assert_eq!(group_thousands("1000"), "1,000");
        assert_eq!(group_thousands("1234567.89"), "1,234,567.89");
        assert_eq!(group_thousands("-1234.5"), "-1,234.5");
        assert_eq!(group_thousands("-100"), "-100");
    }

    #[test]
    fn test_metric_formats() {
        assert_eq!(format_price(110.0), "$110.00");
        assert_eq!(format_price(43_500.753), "$43,500.75");
        assert_eq!(format_change(PriceChange::Percent(10.0)), "10.00%");
        assert_eq!(format_change(PriceChange::Percent(-2.456)), "-2.46%");
        assert_eq!(format_change(PriceChange::Undefined), "n/a");
        assert_eq!(format_volume(1200.0, true), "$1,200");
        assert_eq!(format_volume(500.0, false), "500");
        assert_eq!(format_volume(28_000_000_000.4, true), "$28,000,000,000");
    }

    #[test]
    fn test_format_compact() {
        assert_eq!(format_compact(1_500.0), "1.5K");
        assert_eq!(format_compact(2_500_000.0), "2.5M");
        assert_eq!(format_compact(28_000_000_000.0), "28.0B");
        assert_eq!(format_compact(42.0), "42.00");
        assert_eq!(format_compact(0.5), "0.500000");
    }
}
