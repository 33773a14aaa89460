//! Display formatting used by the dashboard tables and modal.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::rollup::round2;

/// Inserts `,` between groups of three digits.
pub fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `$1,234.56`, `-$12.00`.
pub fn currency(value: Decimal) -> String {
    let rounded = round2(value);
    let text = rounded.abs().to_string();
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{}${}.{}", sign, group_thousands(whole), fraction)
}

/// `33.33%`.
pub fn percent(value: Decimal) -> String {
    format!("{}%", round2(value))
}

/// `1,234`.
pub fn count(value: i64) -> String {
    let grouped = group_thousands(&value.unsigned_abs().to_string());
    if value < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

pub fn date(value: Option<NaiveDateTime>) -> String {
    value
        .map(|v| v.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}
