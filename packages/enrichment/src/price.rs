//! Price parsing and display.
//!
//! Retailer pages show prices in several shapes: `"R$ 1.190,43"`,
//! `"1190.43"`, `"1.190"`. Reports need a number; adapters need a display
//! string. Both directions live here.

use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::LazyLock;

static DOT_THOUSANDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,3}(\.\d{3})+$").expect("static regex"));

/// Parse a displayed price into a number. Unparsable input yields zero.
///
/// A comma marks Brazilian formatting (`.` thousands, `,` decimals).
/// Without a comma, dots in `1.190` / `12.345.678` are thousands
/// separators; any other dot is a decimal point.
pub fn parse_price(raw: &str) -> Decimal {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',' || *c == '-')
        .collect();

    if cleaned.is_empty() {
        return Decimal::ZERO;
    }

    let normalized = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else if DOT_THOUSANDS.is_match(&cleaned) {
        cleaned.replace('.', "")
    } else {
        cleaned
    };

    Decimal::from_str(&normalized).unwrap_or(Decimal::ZERO)
}

/// Format an amount for display. BRL uses `R$ 1.190,43`; other currencies
/// are shown as `USD 1190.43`.
pub fn format_price(amount: Decimal, currency: &str) -> String {
    let amount = amount.round_dp(2);
    match currency {
        "BRL" | "" => format!("R$ {}", brazilian_number(amount)),
        other => format!("{} {:.2}", other, amount),
    }
}

fn brazilian_number(amount: Decimal) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((&fixed, "00"));

    let mut grouped = String::new();
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if amount.is_sign_negative() && !amount.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{}{},{}", sign, grouped, frac_part)
}
