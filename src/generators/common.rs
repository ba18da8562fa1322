//! Common utilities for document generation.
//!
//! Shared helpers for month labels, amount formatting, Typst escaping and
//! output file naming.

use chrono::Local;
use rust_decimal::{Decimal, RoundingStrategy};
use std::path::Path;

/// Prefix some payroll exports put in front of the month label.
const MONTH_PREFIX: &str = "Salary Slip for the Month of ";

/// Rendered for any optional field that has no value.
pub const PLACEHOLDER: &str = "N/A";

/// Current month as a label (e.g., "October-2026").
pub fn current_month_label() -> String {
    Local::now().format("%B-%Y").to_string()
}

/// Strip the export prefix from a month label.
pub fn clean_month_label(month: &str) -> String {
    month.trim().trim_start_matches(MONTH_PREFIX).trim().to_string()
}

/// Lowercase, dash-separated month label for object keys.
pub fn month_slug(month: &str) -> String {
    sanitize_filename(&clean_month_label(month), "undated")
}

/// Two-decimal rendering used in every numeric cell.
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.2}", rounded)
}

/// Two-decimal rendering with thousands separators (e.g., "45,000.00").
pub fn format_grouped_amount(amount: Decimal) -> String {
    let plain = format_amount(amount);
    let (sign, digits) = match plain.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", plain.as_str()),
    };
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (idx, ch) in whole.chars().enumerate() {
        if idx > 0 && (whole.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{sign}{grouped}.{fraction}")
}

/// Escape special characters for Typst strings.
pub fn escape_typst_string(value: &str) -> String {
    value
        .replace('\\', r"\\")
        .replace('"', r#"\""#)
        .replace('\n', r"\n")
}

/// Sanitize a string for use in filenames.
pub fn sanitize_filename(name: &str, fallback: &str) -> String {
    let mut result = String::new();
    let mut last_dash = false;

    for ch in name.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            result.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if (ch.is_whitespace() || ch == '-' || ch == '_') && !last_dash && !result.is_empty()
        {
            result.push('-');
            last_dash = true;
        }
    }

    if result.is_empty() {
        return fallback.to_string();
    }

    result.trim_matches('-').to_string()
}

/// Deterministic wage-slip filename: `<EMP_ID>_<Month_Label>_Payslip.pdf`.
pub fn payslip_filename(employee_id: &str, month: &str) -> String {
    let month = clean_month_label(month).replace(' ', "_");
    ::sanitize_filename::sanitize(format!("{}_{}_Payslip.pdf", employee_id.trim(), month))
}

/// Get the static assets directory path.
pub fn get_static_dir() -> &'static Path {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/static"))
}
