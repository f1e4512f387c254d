//! Render-time formatting helpers: currency, percentages, colours, slugs.

use num_format::{Locale, ToFormattedString};
use ratatui::style::Color;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Visual width of the percentage tag in list rows.
const PERCENT_TAG_WIDTH: usize = 10;

/// Compact currency suffixes, smallest first.
const COMPACT_UNITS: [(i64, &str); 5] = [
    (1, ""),
    (1_000, "K"),
    (1_000_000, "M"),
    (1_000_000_000, "B"),
    (1_000_000_000_000, "T"),
];

/// Palette used for symbol colouring.
const SYMBOL_PALETTE: [Color; 6] = [
    Color::Red,
    Color::Green,
    Color::Yellow,
    Color::Blue,
    Color::Magenta,
    Color::Cyan,
];

/// Format a decimal-string market cap as compact currency ("$1.23B").
///
/// Returns "-" when the input is not a number.
pub fn format_market_cap(value: &str) -> String {
    match Decimal::from_str(value.trim()) {
        Ok(cap) => compact_currency(cap),
        Err(_) => "-".to_string(),
    }
}

/// Market cap label for a quote, "-" when the source has none.
pub fn market_cap_label(value: Option<Decimal>) -> String {
    match value {
        Some(cap) => format_market_cap(&cap.to_string()),
        None => "-".to_string(),
    }
}

/// Compact currency with at most 2 fraction digits.
fn compact_currency(value: Decimal) -> String {
    let magnitude = value.abs();

    let mut unit = COMPACT_UNITS
        .iter()
        .rposition(|(threshold, _)| magnitude >= Decimal::from(*threshold))
        .unwrap_or(0);

    let mut scaled = round_half_up(magnitude / Decimal::from(COMPACT_UNITS[unit].0), 2);

    // 999.999K rounds to 1000K; show it as 1M instead
    if scaled >= Decimal::from(1000) && unit + 1 < COMPACT_UNITS.len() {
        unit += 1;
        scaled = round_half_up(magnitude / Decimal::from(COMPACT_UNITS[unit].0), 2);
    }

    let sign = if value.is_sign_negative() && !scaled.is_zero() {
        "-"
    } else {
        ""
    };

    format!(
        "{}${}{}",
        sign,
        group_fraction(scaled.normalize(), 0),
        COMPACT_UNITS[unit].1
    )
}

/// Format a price as currency.
/// Sub-dollar prices keep up to 6 decimals so small caps don't read as $0.00.
pub fn format_price(price: Decimal) -> String {
    let sign = if price.is_sign_negative() && !price.is_zero() {
        "-"
    } else {
        ""
    };
    let magnitude = price.abs();

    let body = if magnitude >= Decimal::ONE {
        group_fraction(round_half_up(magnitude, 2), 2)
    } else {
        group_fraction(round_half_up(magnitude, 6).normalize(), 2)
    };

    format!("{}${}", sign, body)
}

/// Format a percent change with sign and 2 fraction digits.
///
/// With `pad`, the text is centred in a 10-character field: half the padding
/// (rounded down) goes left, the rest right.
pub fn format_percentage_change(value: Decimal, pad: bool) -> String {
    let rounded = round_half_up(value, 2);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        "+"
    };
    let text = format!("{}{}%", sign, group_fraction(rounded.abs(), 2));

    if !pad {
        return text;
    }

    let padding = PERCENT_TAG_WIDTH.saturating_sub(text.chars().count());
    let left = padding / 2;
    let right = padding - left;
    format!("{}{}{}", " ".repeat(left), text, " ".repeat(right))
}

/// Format an optional percent change, "-" when unavailable.
pub fn format_optional_change(value: Option<Decimal>, pad: bool) -> String {
    match value {
        Some(change) => format_percentage_change(change, pad),
        None if pad => format!("{:^width$}", "-", width = PERCENT_TAG_WIDTH),
        None => "-".to_string(),
    }
}

/// Deterministic palette colour for a symbol.
pub fn symbol_color(symbol: &str) -> Color {
    let sum: u64 = symbol.chars().map(|c| c as u64).sum();
    SYMBOL_PALETTE[(sum % SYMBOL_PALETTE.len() as u64) as usize]
}

/// Lowercase, collapse non-alphanumeric runs into '-', and trim dashes.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Render a non-negative decimal with `,` grouping on the integer part and at
/// least `min_fraction` fraction digits.
fn group_fraction(value: Decimal, min_fraction: u32) -> String {
    let integer = value
        .trunc()
        .to_u128()
        .unwrap_or_default()
        .to_formatted_string(&Locale::en);

    let fraction_digits = value.scale().max(min_fraction) as usize;
    if fraction_digits == 0 {
        return integer;
    }

    // "0.5" -> "5", then right-pad to the wanted width
    let fraction = value.fract().abs().to_string();
    let digits = fraction.split_once('.').map(|(_, d)| d).unwrap_or("");
    format!("{}.{:0<width$}", integer, digits, width = fraction_digits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_market_cap_billions() {
        assert_eq!(format_market_cap("1230000000"), "$1.23B");
    }

    #[test]
    fn test_format_market_cap_suffixes() {
        assert_eq!(format_market_cap("950"), "$950");
        assert_eq!(format_market_cap("1500"), "$1.5K");
        assert_eq!(format_market_cap("2000000"), "$2M");
        assert_eq!(format_market_cap("1340000000000"), "$1.34T");
        assert_eq!(format_market_cap("1234.5678"), "$1.23K");
    }

    #[test]
    fn test_format_market_cap_rounds_up_into_next_unit() {
        assert_eq!(format_market_cap("999999"), "$1M");
    }

    #[test]
    fn test_format_market_cap_groups_huge_values() {
        assert_eq!(format_market_cap("1234000000000000"), "$1,234T");
    }

    #[test]
    fn test_format_market_cap_invalid() {
        assert_eq!(format_market_cap("n/a"), "-");
    }

    #[test]
    fn test_market_cap_label() {
        assert_eq!(market_cap_label(Some(dec!(2500000))), "$2.5M");
        assert_eq!(market_cap_label(None), "-");
    }

    #[test]
    fn test_format_percentage_change_padded() {
        let tag = format_percentage_change(dec!(5), true);
        assert_eq!(tag, "  +5.00%  ");
        assert_eq!(tag.len(), 10);
    }

    #[test]
    fn test_format_percentage_change_odd_padding() {
        // 7 chars: 3 padding, 1 left, 2 right
        assert_eq!(format_percentage_change(dec!(-12.345), true), " -12.35%  ");
    }

    #[test]
    fn test_format_percentage_change_unpadded() {
        assert_eq!(format_percentage_change(dec!(0), false), "+0.00%");
        assert_eq!(format_percentage_change(dec!(-0.001), false), "+0.00%");
        assert_eq!(format_percentage_change(dec!(-3.1), false), "-3.10%");
    }

    #[test]
    fn test_format_percentage_change_wide_value_not_padded() {
        assert_eq!(format_percentage_change(dec!(12345.6), true), "+12,345.60%");
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(dec!(67012.345)), "$67,012.35");
        assert_eq!(format_price(dec!(2)), "$2.00");
        assert_eq!(format_price(dec!(0.5)), "$0.50");
        assert_eq!(format_price(dec!(0.00001234)), "$0.000012");
    }

    #[test]
    fn test_symbol_color_is_stable() {
        assert_eq!(symbol_color("BTC"), symbol_color("BTC"));
        // 'B' + 'T' + 'C' = 66 + 84 + 67 = 217, 217 % 6 = 1
        assert_eq!(symbol_color("BTC"), Color::Green);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Bitcoin"), "bitcoin");
        assert_eq!(slugify("Shiba Inu"), "shiba-inu");
        assert_eq!(slugify("  USD Coin (Bridged) "), "usd-coin-bridged");
    }
}
