//! pt-BR parsing and formatting of currency amounts and percents.
//!
//! Parsers never fail: malformed input reads as zero so downstream totals
//! degrade to "nothing paid / no discount" instead of erroring.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

pub const CURRENCY_PREFIX: &str = "R$";
pub const PERCENT_SCALE: u32 = 6;

/// Parses an amount typed or displayed in pt-BR notation.
///
/// Accepts an optional `R$` prefix, a leading sign, `.` thousands separators
/// and a `,` decimal separator. Without a comma, a dot is read as a thousands
/// separator only when every group after it has exactly three digits
/// (`25.000` is twenty-five thousand, `25.5` is twenty-five and a half).
pub fn parse_pt_number(text: &str) -> Decimal {
    let compact: String = text
        .replace(CURRENCY_PREFIX, "")
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .collect();

    let (negative, unsigned) = match compact.strip_prefix('-') {
        Some(rest) => (true, rest.to_string()),
        None => (false, compact.trim_start_matches('+').to_string()),
    };

    let normalized = if unsigned.contains(',') {
        unsigned.replace('.', "").replace(',', ".")
    } else if dots_are_thousands(&unsigned) {
        unsigned.replace('.', "")
    } else {
        unsigned
    };

    if normalized.is_empty() || !normalized.chars().all(|ch| ch.is_ascii_digit() || ch == '.') {
        return Decimal::ZERO;
    }

    let value = Decimal::from_str(&normalized).unwrap_or(Decimal::ZERO);
    if negative {
        -value
    } else {
        value
    }
}

fn dots_are_thousands(text: &str) -> bool {
    let mut groups = text.split('.');
    let Some(head) = groups.next() else {
        return false;
    };
    let tail: Vec<&str> = groups.collect();
    if tail.is_empty() || head.is_empty() || head == "0" || head.len() > 3 {
        return false;
    }
    tail.iter().all(|group| group.len() == 3 && group.chars().all(|ch| ch.is_ascii_digit()))
}

/// Parses a percent such as `"7,5%"` or `" 6 "`; unparsable text is zero.
pub fn parse_percent(text: &str) -> Decimal {
    let cleaned = text.replace('%', "");
    let normalized = cleaned.trim().replace(',', ".");
    Decimal::from_str(&normalized).unwrap_or(Decimal::ZERO)
}

/// `1234.5 -> "R$ 1.234,50"`, `-2 -> "-R$ 2,00"`.
pub fn format_currency(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    let fixed = format!("{:.2}", rounded.abs());
    let (integer, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    format!("{sign}{CURRENCY_PREFIX} {},{fraction}", group_thousands(integer))
}

/// `7.5 -> "7,5%"`, `6 -> "6%"`; at most six fraction digits.
pub fn format_percent(value: Decimal) -> String {
    let rounded =
        value.round_dp_with_strategy(PERCENT_SCALE, RoundingStrategy::MidpointAwayFromZero);
    let normalized = if rounded.is_zero() { Decimal::ZERO } else { rounded.normalize() };
    format!("{}%", normalized.to_string().replace('.', ","))
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    grouped
}
