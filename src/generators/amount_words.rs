//! Amount-to-words conversion using the lakh/crore grouping.
//!
//! `45000` becomes `"Forty Five Thousand Rupees Only"` and `12_34_56_789`
//! becomes `"Twelve Crore Thirty Four Lakh Fifty Six Thousand Seven Hundred
//! Eighty Nine Rupees Only"`.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use thiserror::Error;

const ONES: [&str; 10] = [
    "", "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine",
];

const TEENS: [&str; 10] = [
    "Ten",
    "Eleven",
    "Twelve",
    "Thirteen",
    "Fourteen",
    "Fifteen",
    "Sixteen",
    "Seventeen",
    "Eighteen",
    "Nineteen",
];

const TENS: [&str; 10] = [
    "", "", "Twenty", "Thirty", "Forty", "Fifty", "Sixty", "Seventy", "Eighty", "Ninety",
];

const CRORE: u64 = 10_000_000;
const LAKH: u64 = 100_000;
const THOUSAND: u64 = 1_000;

/// Suffix appended to every spelled amount.
pub const CURRENCY_PHRASE: &str = "Rupees Only";

/// Fixed output for a zero amount.
pub const ZERO_PHRASE: &str = "Zero Rupees Only";

#[derive(Debug, Clone, Error, PartialEq)]
pub enum InvalidAmountError {
    #[error("amount must not be negative: {0}")]
    Negative(String),
    #[error("amount is not numeric: {0}")]
    NotNumeric(String),
    #[error("amount is too large to spell: {0}")]
    OutOfRange(String),
}

/// Spell a non-negative whole amount.
pub fn spell(amount: i64) -> Result<String, InvalidAmountError> {
    if amount < 0 {
        return Err(InvalidAmountError::Negative(amount.to_string()));
    }
    if amount == 0 {
        return Ok(ZERO_PHRASE.to_string());
    }
    Ok(format!("{} {}", spell_groups(amount as u64), CURRENCY_PHRASE))
}

/// Spell a decimal amount, dropping the fractional part.
pub fn spell_decimal(amount: Decimal) -> Result<String, InvalidAmountError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(InvalidAmountError::Negative(amount.to_string()));
    }
    let whole = amount
        .trunc()
        .to_i64()
        .ok_or_else(|| InvalidAmountError::OutOfRange(amount.to_string()))?;
    spell(whole)
}

fn spell_groups(n: u64) -> String {
    let mut parts: Vec<String> = Vec::new();

    let crores = n / CRORE;
    let mut rest = n % CRORE;
    if crores > 0 {
        parts.push(format!("{} Crore", spell_groups(crores)));
    }

    let lakhs = rest / LAKH;
    rest %= LAKH;
    if lakhs > 0 {
        parts.push(format!("{} Lakh", below_thousand(lakhs)));
    }

    let thousands = rest / THOUSAND;
    rest %= THOUSAND;
    if thousands > 0 {
        parts.push(format!("{} Thousand", below_thousand(thousands)));
    }

    if rest > 0 {
        parts.push(below_thousand(rest));
    }

    parts.join(" ")
}

fn below_thousand(n: u64) -> String {
    let n = n as usize;
    match n {
        0 => String::new(),
        1..=9 => ONES[n].to_string(),
        10..=19 => TEENS[n - 10].to_string(),
        20..=99 => {
            if n % 10 == 0 {
                TENS[n / 10].to_string()
            } else {
                format!("{} {}", TENS[n / 10], ONES[n % 10])
            }
        }
        _ => {
            let hundreds = format!("{} Hundred", ONES[n / 100]);
            if n % 100 == 0 {
                hundreds
            } else {
                format!("{} {}", hundreds, below_thousand((n % 100) as u64))
            }
        }
    }
}
