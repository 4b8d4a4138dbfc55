//! Numeric helpers shared by the derivation engine and the views.
//!
//! Form inputs arrive as free text. Parsing is lenient the way browser form
//! scripts are: the longest leading numeric prefix wins and anything else is
//! zero. Amounts are kept as `f64` and rounded to two decimals at every
//! derivation step.

use serde::{Deserialize, Serialize};

/// Display preferences used when rendering amounts for people.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocaleConfig {
    pub decimal_separator: char,
    pub grouping_separator: char,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            decimal_separator: '.',
            grouping_separator: ',',
        }
    }
}

/// Parses user input into a number, treating anything unparseable as `0`.
///
/// `"12.5kg"` parses as `12.5`, `""`, `"abc"` and `"-"` all parse as `0`.
pub fn parse_amount(raw: &str) -> f64 {
    let text = raw.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    let mut seen_exp = false;
    let mut idx = 0;

    if idx < bytes.len() && matches!(bytes[idx], b'+' | b'-') {
        idx += 1;
    }
    while idx < bytes.len() {
        let byte = bytes[idx];
        match byte {
            b'0'..=b'9' => {
                seen_digit = true;
                end = idx + 1;
            }
            b'.' if !seen_dot && !seen_exp => seen_dot = true,
            b'e' | b'E' if seen_digit && !seen_exp => {
                let mut probe = idx + 1;
                if probe < bytes.len() && matches!(bytes[probe], b'+' | b'-') {
                    probe += 1;
                }
                if probe < bytes.len() && bytes[probe].is_ascii_digit() {
                    seen_exp = true;
                    idx = probe;
                    end = probe + 1;
                } else {
                    break;
                }
            }
            _ => break,
        }
        idx += 1;
    }

    if !seen_digit {
        return 0.0;
    }
    match text[..end].parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

/// Rounds half away from zero to two decimal places.
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let rounded = (value * 100.0).round() / 100.0;
    // Avoid rendering "-0.00".
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Formats an amount with exactly two decimals, as form fields store them.
pub fn format_amount(value: f64) -> String {
    format!("{:.2}", round2(value))
}

/// Returns true when the input is blank or parses to zero.
pub fn is_empty_or_zero(raw: &str) -> bool {
    raw.trim().is_empty() || parse_amount(raw) == 0.0
}

/// Formats an amount with grouping separators for on-screen summaries.
pub fn format_grouped(locale: &LocaleConfig, value: f64) -> String {
    let body = format_amount(value);
    let (sign, digits) = match body.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", body.as_str()),
    };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, "00"));
    format!(
        "{}{}{}{}",
        sign,
        group_digits(int_part, locale.grouping_separator),
        locale.decimal_separator,
        frac_part
    )
}

fn group_digits(digits: &str, separator: char) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (count, ch) in digits.chars().enumerate() {
        if count != 0 && (digits.len() - count) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(ch);
    }
    grouped
}
