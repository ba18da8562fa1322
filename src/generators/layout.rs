//! Wage-slip layout: the single description of what goes where.
//!
//! [`WageSlipLayout`] holds the resolved text of every block, and
//! [`GEOMETRY`] holds the fixed positions and sizes. Both are serialised
//! into a Typst prelude that the wage-slip template consumes, so every
//! channel and every record share one layout.

use rust_decimal::Decimal;
use std::fmt::Write;

use super::amount_words::{spell_decimal, InvalidAmountError};
use super::common::{escape_typst_string, format_amount, PLACEHOLDER};
use crate::config::{CompanyConfig, InvalidAmountPolicy};
use crate::records::{fields, EmployeeRecord, FieldError};

pub const TITLE: &str = "Contract Labour (Regulation & Abolition)";
pub const FORM_HEADER: &str = "FORM XIX (See Rules 78(1)(b) Wage Slip)";
pub const CONTRACTOR_CAPTION: &str = "Name & Address of Contractor";
pub const FOOTER: &str =
    "**This is a system generated salary slip; hence signature is not required.";
pub const CURRENCY_SYMBOL: &str = "Rs.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

impl Align {
    fn typst(self) -> &'static str {
        match self {
            Align::Left => "left",
            Align::Right => "right",
        }
    }
}

/// Fixed page geometry, in points.
#[derive(Debug, Clone, Copy)]
pub struct Geometry {
    pub top_margin: u32,
    /// Left edge of the earnings/deductions grid.
    pub grid_x: u32,
    /// Left edge of the identity block's first label column.
    pub identity_x: u32,
    /// Left edge of the identity block's second label column.
    pub identity_right_x: u32,
    pub identity_label_width: u32,
    pub identity_right_label_width: u32,
    pub identity_row_gap: u32,
    pub column_widths: [u32; 5],
    pub column_align: [Align; 5],
    pub row_height: u32,
}

pub const GEOMETRY: Geometry = Geometry {
    top_margin: 40,
    grid_x: 50,
    identity_x: 70,
    identity_right_x: 320,
    identity_label_width: 100,
    identity_right_label_width: 80,
    identity_row_gap: 8,
    column_widths: [100, 70, 70, 120, 80],
    column_align: [Align::Left, Align::Right, Align::Right, Align::Left, Align::Right],
    row_height: 20,
};

#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error(transparent)]
    InvalidField(#[from] FieldError),
    #[error("net pay cannot be written in words: {0}")]
    InvalidAmount(#[from] InvalidAmountError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IdentityField {
    pub label: &'static str,
    pub value: String,
}

/// One line of the earnings/deductions grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridRow {
    pub label: String,
    pub fixed: String,
    pub earned: String,
    pub deduction_label: String,
    pub deduction: String,
    pub emphasis: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WageSlipLayout {
    pub company_name: String,
    pub company_address: Vec<String>,
    /// Left/right pairs, top to bottom.
    pub identity: Vec<(IdentityField, IdentityField)>,
    pub grid: Vec<GridRow>,
    pub net_pay: String,
    pub net_pay_words: String,
    /// Numeric net pay, when one could be resolved.
    pub net_pay_amount: Option<Decimal>,
}

struct EarningLine {
    label: &'static str,
    fixed: &'static str,
    earned: &'static str,
}

const EARNINGS: [EarningLine; 6] = [
    EarningLine {
        label: "Basic",
        fixed: fields::FIXED_BASIC,
        earned: fields::EARNED_BASIC,
    },
    EarningLine {
        label: "DA",
        fixed: fields::FIXED_DA,
        earned: fields::EARNED_DA,
    },
    EarningLine {
        label: "HRA",
        fixed: fields::FIXED_HRA,
        earned: fields::EARNED_HRA,
    },
    EarningLine {
        label: "Conveyance",
        fixed: fields::FIXED_CONVEYANCE,
        earned: fields::EARNED_CONVEYANCE,
    },
    EarningLine {
        label: "Others",
        fixed: fields::OTHER_ALLOWANCE,
        earned: fields::OTHER_ALLOWANCE,
    },
    EarningLine {
        label: "Bonus",
        fixed: fields::FIXED_BONUS,
        earned: fields::EARNED_BONUS,
    },
];

const DEDUCTIONS: [(&str, &str); 4] = [
    ("Provident Fund", fields::PF),
    ("ESI", fields::ESI),
    ("Professional Tax", fields::PT),
    ("ADV", fields::ADV),
];

fn amount_cell(amount: Option<Decimal>) -> String {
    amount.map(format_amount).unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Sum of the present values; `None` when every value is absent.
fn sum_present(values: &[Option<Decimal>]) -> Option<Decimal> {
    values
        .iter()
        .flatten()
        .copied()
        .reduce(|acc, value| acc + value)
}

fn text_or_placeholder(record: &EmployeeRecord, field: &str) -> String {
    record.text(field).unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Net pay as supplied, or earned gross minus gross deductions.
pub fn resolve_net_pay(record: &EmployeeRecord) -> Result<Option<Decimal>, FieldError> {
    if let Some(net) = record.amount(fields::NET_PAY)? {
        return Ok(Some(net));
    }
    let earned = match record.amount(fields::EARNED_TOTAL)? {
        Some(total) => Some(total),
        None => {
            let mut values = Vec::with_capacity(EARNINGS.len());
            for line in &EARNINGS {
                values.push(record.amount(line.earned)?);
            }
            sum_present(&values)
        }
    };
    let deductions = match record.amount(fields::TOTAL_DEDUCTION)? {
        Some(total) => Some(total),
        None => {
            let mut values = Vec::with_capacity(DEDUCTIONS.len());
            for (_, field) in &DEDUCTIONS {
                values.push(record.amount(field)?);
            }
            sum_present(&values)
        }
    };
    Ok(earned.map(|gross| gross - deductions.unwrap_or(Decimal::ZERO)))
}

impl WageSlipLayout {
    pub fn build(
        employee_id: &str,
        record: &EmployeeRecord,
        company: &CompanyConfig,
        words_policy: InvalidAmountPolicy,
    ) -> Result<Self, LayoutError> {
        let identity = vec![
            (
                IdentityField {
                    label: "EMP Code:",
                    value: employee_id.to_string(),
                },
                IdentityField {
                    label: "Designation:",
                    value: text_or_placeholder(record, fields::DESIGNATION),
                },
            ),
            (
                IdentityField {
                    label: "EMP Name:",
                    value: text_or_placeholder(record, fields::NAME),
                },
                IdentityField {
                    label: "Unit Name:",
                    value: text_or_placeholder(record, fields::UNIT_NAME),
                },
            ),
            (
                IdentityField {
                    label: "UAN No:",
                    value: text_or_placeholder(record, fields::UAN_NO),
                },
                IdentityField {
                    label: "Bank A/c No:",
                    value: text_or_placeholder(record, fields::BANK_AC),
                },
            ),
            (
                IdentityField {
                    label: "ESI No:",
                    value: text_or_placeholder(record, fields::ESI_NO),
                },
                IdentityField {
                    label: "DOJ:",
                    value: text_or_placeholder(record, fields::DOJ),
                },
            ),
            (
                IdentityField {
                    label: "No of working days:",
                    value: text_or_placeholder(record, fields::BASIC_DAYS),
                },
                IdentityField {
                    label: "No of days worked:",
                    value: text_or_placeholder(record, fields::ACTUAL_DAYS),
                },
            ),
        ];

        let mut grid = Vec::with_capacity(EARNINGS.len() + 1);
        let mut fixed_values = Vec::with_capacity(EARNINGS.len());
        let mut earned_values = Vec::with_capacity(EARNINGS.len());
        let mut deduction_values = Vec::with_capacity(DEDUCTIONS.len());

        for (idx, line) in EARNINGS.iter().enumerate() {
            let fixed = record.amount(line.fixed)?;
            let earned = record.amount(line.earned)?;
            fixed_values.push(fixed);
            earned_values.push(earned);

            let (deduction_label, deduction) = match DEDUCTIONS.get(idx) {
                Some((label, field)) => {
                    let amount = record.amount(field)?;
                    deduction_values.push(amount);
                    (label.to_string(), amount_cell(amount))
                }
                None => (String::new(), String::new()),
            };

            grid.push(GridRow {
                label: line.label.to_string(),
                fixed: amount_cell(fixed),
                earned: amount_cell(earned),
                deduction_label,
                deduction,
                emphasis: false,
            });
        }

        let fixed_total = record
            .amount(fields::FIXED_TOTAL)?
            .or_else(|| sum_present(&fixed_values));
        let earned_total = record
            .amount(fields::EARNED_TOTAL)?
            .or_else(|| sum_present(&earned_values));
        let deduction_total = record
            .amount(fields::TOTAL_DEDUCTION)?
            .or_else(|| sum_present(&deduction_values));

        grid.push(GridRow {
            label: "Gross Earning".to_string(),
            fixed: amount_cell(fixed_total),
            earned: amount_cell(earned_total),
            deduction_label: "Gross Deductions".to_string(),
            deduction: amount_cell(deduction_total),
            emphasis: true,
        });

        let net_pay_amount = match record.amount(fields::NET_PAY) {
            Ok(_) => resolve_net_pay(record)?,
            Err(FieldError::NotNumeric { value, .. }) => {
                words_fallback(employee_id, InvalidAmountError::NotNumeric(value), words_policy)?;
                None
            }
        };
        let net_pay = match net_pay_amount {
            Some(amount) => format!("{} {}", CURRENCY_SYMBOL, format_amount(amount)),
            None => PLACEHOLDER.to_string(),
        };
        let net_pay_words = match net_pay_amount.map(spell_decimal) {
            None => PLACEHOLDER.to_string(),
            Some(Ok(words)) => words,
            Some(Err(err)) => {
                words_fallback(employee_id, err, words_policy)?;
                PLACEHOLDER.to_string()
            }
        };

        Ok(Self {
            company_name: company.name.clone(),
            company_address: company.address_lines.clone(),
            identity,
            grid,
            net_pay,
            net_pay_words,
            net_pay_amount,
        })
    }

    /// Typst definitions (`geometry` and `slip`) consumed by the template.
    pub fn typst_prelude(&self) -> String {
        let g = &GEOMETRY;
        let mut out = String::new();

        let widths: Vec<String> = g.column_widths.iter().map(|w| format!("{w}pt")).collect();
        let aligns: Vec<&str> = g.column_align.iter().map(|a| a.typst()).collect();
        let identity_value_width = g.identity_right_x - g.identity_x - g.identity_label_width;

        // Writing into a String cannot fail.
        let _ = writeln!(out, "#let geometry = (");
        let _ = writeln!(out, "  top_margin: {}pt,", g.top_margin);
        let _ = writeln!(out, "  grid_x: {}pt,", g.grid_x);
        let _ = writeln!(out, "  identity_indent: {}pt,", g.identity_x - g.grid_x);
        let _ = writeln!(
            out,
            "  identity_columns: ({}pt, {}pt, {}pt, 1fr),",
            g.identity_label_width, identity_value_width, g.identity_right_label_width
        );
        let _ = writeln!(out, "  identity_row_gap: {}pt,", g.identity_row_gap);
        let _ = writeln!(out, "  column_widths: ({},),", widths.join(", "));
        let _ = writeln!(out, "  column_align: ({},),", aligns.join(", "));
        let _ = writeln!(out, "  row_height: {}pt,", g.row_height);
        let _ = writeln!(out, ")");

        let _ = writeln!(out, "#let slip = (");
        let _ = writeln!(out, "  title: {},", lit(TITLE));
        let _ = writeln!(out, "  form_header: {},", lit(FORM_HEADER));
        let _ = writeln!(out, "  contractor_caption: {},", lit(CONTRACTOR_CAPTION));
        let _ = writeln!(out, "  company_name: {},", lit(&self.company_name));
        let _ = writeln!(out, "  company_address: ({}),", list(&self.company_address));

        let _ = writeln!(out, "  identity: (");
        for (left, right) in &self.identity {
            let _ = writeln!(
                out,
                "    ((label: {}, value: {}), (label: {}, value: {})),",
                lit(left.label),
                lit(&left.value),
                lit(right.label),
                lit(&right.value)
            );
        }
        let _ = writeln!(out, "  ),");

        let _ = writeln!(out, "  grid: (");
        for row in &self.grid {
            let _ = writeln!(
                out,
                "    (label: {}, fixed: {}, earned: {}, deduction_label: {}, deduction: {}, emphasis: {}),",
                lit(&row.label),
                lit(&row.fixed),
                lit(&row.earned),
                lit(&row.deduction_label),
                lit(&row.deduction),
                row.emphasis
            );
        }
        let _ = writeln!(out, "  ),");

        let _ = writeln!(out, "  net_pay: {},", lit(&self.net_pay));
        let _ = writeln!(out, "  net_pay_words: {},", lit(&self.net_pay_words));
        let _ = writeln!(out, "  footer: {},", lit(FOOTER));
        let _ = writeln!(out, ")");

        out
    }
}

/// Apply the amount-words policy: placeholder words, or a layout failure.
fn words_fallback(
    employee_id: &str,
    err: InvalidAmountError,
    policy: InvalidAmountPolicy,
) -> Result<(), LayoutError> {
    match policy {
        InvalidAmountPolicy::Placeholder => {
            log::warn!(
                "Net pay for {} cannot be written in words ({}); using placeholder",
                employee_id,
                err
            );
            Ok(())
        }
        InvalidAmountPolicy::Fail => Err(err.into()),
    }
}

fn lit(value: &str) -> String {
    format!("\"{}\"", escape_typst_string(value))
}

/// Typst array literal body; the trailing comma keeps one-element arrays arrays.
fn list(values: &[String]) -> String {
    values.iter().map(|v| format!("{}, ", lit(v))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::FieldValue;
    use std::str::FromStr;

    fn record(pairs: &[(&str, &str)]) -> EmployeeRecord {
        pairs.iter().map(|(k, v)| (*k, FieldValue::from(*v))).collect()
    }

    fn build(rec: &EmployeeRecord) -> WageSlipLayout {
        WageSlipLayout::build(
            "E1",
            rec,
            &CompanyConfig::default(),
            InvalidAmountPolicy::Placeholder,
        )
        .unwrap()
    }

    #[test]
    fn test_missing_optional_fields_use_placeholder() {
        let layout = build(&record(&[("EMP_ID", "E1"), ("Name", "A. Kumar")]));

        assert_eq!(layout.identity[0].0.value, "E1");
        assert_eq!(layout.identity[0].1.value, PLACEHOLDER);
        assert_eq!(layout.identity[1].0.value, "A. Kumar");
        assert_eq!(layout.grid[0].fixed, PLACEHOLDER);
        assert_eq!(layout.grid[0].deduction, PLACEHOLDER);
        assert_eq!(layout.net_pay, PLACEHOLDER);
        assert_eq!(layout.net_pay_words, PLACEHOLDER);
    }

    #[test]
    fn test_grid_formats_two_decimals() {
        let layout = build(&record(&[
            ("Fixed_Basic", "15000"),
            ("Earned_Basic", "14500.5"),
            ("PF", "1800"),
            ("Net_Pay", "45000"),
        ]));

        assert_eq!(layout.grid[0].label, "Basic");
        assert_eq!(layout.grid[0].fixed, "15000.00");
        assert_eq!(layout.grid[0].earned, "14500.50");
        assert_eq!(layout.grid[0].deduction_label, "Provident Fund");
        assert_eq!(layout.grid[0].deduction, "1800.00");
        assert_eq!(layout.net_pay, "Rs. 45000.00");
        assert_eq!(layout.net_pay_words, "Forty Five Thousand Rupees Only");
    }

    #[test]
    fn test_rows_without_deduction_are_blank_not_placeholder() {
        let layout = build(&record(&[]));
        let others = &layout.grid[4];
        assert_eq!(others.label, "Others");
        assert_eq!(others.deduction_label, "");
        assert_eq!(others.deduction, "");
    }

    #[test]
    fn test_gross_is_computed_when_total_absent() {
        let layout = build(&record(&[
            ("Earned_Basic", "10000"),
            ("Earned_HRA", "4000"),
            ("PF", "1200"),
            ("PT", "200"),
        ]));
        let gross = layout.grid.last().unwrap();
        assert!(gross.emphasis);
        assert_eq!(gross.earned, "14000.00");
        assert_eq!(gross.fixed, PLACEHOLDER);
        assert_eq!(gross.deduction, "1400.00");
        assert_eq!(layout.net_pay_amount, Some(Decimal::from(12600)));
    }

    #[test]
    fn test_supplied_totals_win() {
        let layout = build(&record(&[
            ("Earned_Basic", "10000"),
            ("Earned_Total", "11000"),
            ("Total_Deduction", "1000"),
        ]));
        assert_eq!(layout.grid.last().unwrap().earned, "11000.00");
        assert_eq!(layout.net_pay_amount, Some(Decimal::from(10000)));
    }

    #[test]
    fn test_non_numeric_amount_is_a_layout_error() {
        let result = WageSlipLayout::build(
            "E9",
            &record(&[("Earned_Basic", "ten thousand")]),
            &CompanyConfig::default(),
            InvalidAmountPolicy::Placeholder,
        );
        assert!(matches!(result, Err(LayoutError::InvalidField(_))));
    }

    #[test]
    fn test_negative_net_pay_follows_policy() {
        let rec = record(&[("Net_Pay", "-250.00")]);
        let layout = build(&rec);
        assert_eq!(layout.net_pay_words, PLACEHOLDER);
        assert_eq!(layout.net_pay_amount, Some(Decimal::from_str("-250.00").unwrap()));

        let strict = WageSlipLayout::build(
            "E1",
            &rec,
            &CompanyConfig::default(),
            InvalidAmountPolicy::Fail,
        );
        assert!(matches!(strict, Err(LayoutError::InvalidAmount(_))));
    }

    #[test]
    fn test_non_numeric_net_pay_follows_policy() {
        let rec = record(&[("Net_Pay", "forty five thousand"), ("Earned_Basic", "100")]);
        let layout = build(&rec);
        assert_eq!(layout.net_pay, PLACEHOLDER);
        assert_eq!(layout.net_pay_words, PLACEHOLDER);
        assert_eq!(layout.net_pay_amount, None);
        assert_eq!(layout.grid[0].earned, "100.00");

        let strict = WageSlipLayout::build(
            "E1",
            &rec,
            &CompanyConfig::default(),
            InvalidAmountPolicy::Fail,
        );
        assert!(matches!(
            strict,
            Err(LayoutError::InvalidAmount(InvalidAmountError::NotNumeric(_)))
        ));
    }

    #[test]
    fn test_prelude_binds_geometry_and_values() {
        let layout = build(&record(&[("Name", "A. \"Ace\" Kumar"), ("Net_Pay", "45000")]));
        let prelude = layout.typst_prelude();

        assert!(prelude.contains("column_widths: (100pt, 70pt, 70pt, 120pt, 80pt,),"));
        assert!(prelude.contains("column_align: (left, right, right, left, right,),"));
        assert!(prelude.contains("identity_columns: (100pt, 150pt, 80pt, 1fr),"));
        assert!(prelude.contains(r#"value: "A. \"Ace\" Kumar""#));
        assert!(prelude.contains(r#"net_pay_words: "Forty Five Thousand Rupees Only","#));
        assert!(prelude.contains(
            r##"company_address: ("# 14, 3rd Cross, Parappana Agrahara", "Bangalore-100", ),"##
        ));
    }
}
