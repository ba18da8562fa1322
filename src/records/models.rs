//! Employee record models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;

/// Column names understood by the pipeline.
pub mod fields {
    pub const EMP_ID: &str = "EMP_ID";
    pub const NAME: &str = "Name";
    pub const EMAIL: &str = "Email";
    pub const MOBILE: &str = "Mobile";
    pub const MONTH: &str = "Month";

    pub const DESIGNATION: &str = "Designation";
    pub const UNIT_NAME: &str = "Unit_Name";
    pub const UAN_NO: &str = "UAN_No";
    pub const BANK_AC: &str = "Bank_AC";
    pub const ESI_NO: &str = "ESI_No";
    pub const DOJ: &str = "DOJ";
    pub const BASIC_DAYS: &str = "Basic_Days";
    pub const ACTUAL_DAYS: &str = "Actual_Days";

    pub const FIXED_BASIC: &str = "Fixed_Basic";
    pub const EARNED_BASIC: &str = "Earned_Basic";
    pub const FIXED_DA: &str = "Fixed_DA";
    pub const EARNED_DA: &str = "Earned_DA";
    pub const FIXED_HRA: &str = "Fixed_HRA";
    pub const EARNED_HRA: &str = "Earned_HRA";
    pub const FIXED_CONVEYANCE: &str = "Fixed_Conveyance";
    pub const EARNED_CONVEYANCE: &str = "Earned_Conveyance";
    pub const OTHER_ALLOWANCE: &str = "Other_Allowance";
    pub const FIXED_BONUS: &str = "Fixed_Bonus";
    pub const EARNED_BONUS: &str = "Earned_Bonus";
    pub const FIXED_TOTAL: &str = "Fixed_Total";
    pub const EARNED_TOTAL: &str = "Earned_Total";

    pub const PF: &str = "PF";
    pub const ESI: &str = "ESI";
    pub const PT: &str = "PT";
    pub const ADV: &str = "ADV";
    pub const TOTAL_DEDUCTION: &str = "Total_Deduction";

    pub const NET_PAY: &str = "Net_Pay";
}

/// Columns every record set must carry.
pub const MANDATORY_FIELDS: [&str; 3] = [fields::EMP_ID, fields::NAME, fields::EMAIL];

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Text(String),
    Number(Decimal),
}

impl FieldValue {
    /// Null, or text that is empty after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(value) => value.trim().is_empty(),
            FieldValue::Number(_) => false,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(Decimal::from(value))
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum FieldError {
    #[error("field '{field}' is not numeric: '{value}'")]
    NotNumeric { field: String, value: String },
}

/// One employee row. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeRecord {
    values: BTreeMap<String, FieldValue>,
}

impl EmployeeRecord {
    pub fn new(values: BTreeMap<String, FieldValue>) -> Self {
        Self { values }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Trimmed text for a field; `None` when absent or blank.
    pub fn text(&self, field: &str) -> Option<String> {
        match self.values.get(field)? {
            FieldValue::Null => None,
            FieldValue::Text(value) => {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            FieldValue::Number(value) => Some(value.normalize().to_string()),
        }
    }

    /// Numeric value for a field; `Ok(None)` when absent or blank.
    pub fn amount(&self, field: &str) -> Result<Option<Decimal>, FieldError> {
        match self.values.get(field) {
            None | Some(FieldValue::Null) => Ok(None),
            Some(FieldValue::Number(value)) => Ok(Some(*value)),
            Some(FieldValue::Text(value)) => {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                Decimal::from_str(&trimmed.replace(',', ""))
                    .map(Some)
                    .map_err(|_| FieldError::NotNumeric {
                        field: field.to_string(),
                        value: trimmed.to_string(),
                    })
            }
        }
    }

    pub fn identifier(&self) -> Option<String> {
        self.text(fields::EMP_ID)
    }

    pub fn name(&self) -> Option<String> {
        self.text(fields::NAME)
    }

    pub fn email(&self) -> Option<String> {
        self.text(fields::EMAIL)
    }

    pub fn mobile(&self) -> Option<String> {
        self.text(fields::MOBILE)
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for EmployeeRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

/// Ordered collection of employee rows with named columns.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    columns: Vec<String>,
    rows: Vec<EmployeeRecord>,
}

impl RecordSet {
    pub fn new(columns: Vec<String>, rows: Vec<EmployeeRecord>) -> Self {
        Self { columns, rows }
    }

    /// Build a record set whose columns are the union of every row's fields,
    /// in first-seen order.
    pub fn from_rows(rows: Vec<EmployeeRecord>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for name in row.field_names() {
                if !columns.iter().any(|c| c == name) {
                    columns.push(name.to_string());
                }
            }
        }
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn rows(&self) -> &[EmployeeRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_trims_and_hides_blank() {
        let record: EmployeeRecord = [
            (fields::NAME, FieldValue::from("  A. Kumar ")),
            (fields::EMAIL, FieldValue::from("   ")),
            (fields::MOBILE, FieldValue::Null),
        ]
        .into_iter()
        .collect();

        assert_eq!(record.name().as_deref(), Some("A. Kumar"));
        assert_eq!(record.email(), None);
        assert_eq!(record.mobile(), None);
        assert_eq!(record.text("Missing"), None);
    }

    #[test]
    fn test_amount_parses_text_and_numbers() {
        let record: EmployeeRecord = [
            (fields::NET_PAY, FieldValue::from("45,000.50")),
            (fields::PF, FieldValue::from(1800)),
            (fields::ESI, FieldValue::from("")),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            record.amount(fields::NET_PAY).unwrap(),
            Some(Decimal::from_str("45000.50").unwrap())
        );
        assert_eq!(record.amount(fields::PF).unwrap(), Some(Decimal::from(1800)));
        assert_eq!(record.amount(fields::ESI).unwrap(), None);
        assert_eq!(record.amount(fields::PT).unwrap(), None);
    }

    #[test]
    fn test_amount_rejects_non_numeric_text() {
        let record: EmployeeRecord = [(fields::PF, "twelve")].into_iter().collect();
        let err = record.amount(fields::PF).unwrap_err();
        assert_eq!(
            err,
            FieldError::NotNumeric {
                field: "PF".to_string(),
                value: "twelve".to_string()
            }
        );
    }

    #[test]
    fn test_number_renders_as_plain_text() {
        let record: EmployeeRecord = [(fields::MOBILE, FieldValue::from(9876543210))]
            .into_iter()
            .collect();
        assert_eq!(record.mobile().as_deref(), Some("9876543210"));
    }

    #[test]
    fn test_record_deserializes_from_json_object() {
        let json = r#"{"EMP_ID": "E1", "Name": "A. Kumar", "Email": null, "Net_Pay": 45000}"#;
        let record: EmployeeRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.identifier().as_deref(), Some("E1"));
        assert_eq!(record.get(fields::EMAIL), Some(&FieldValue::Null));
        assert_eq!(
            record.amount(fields::NET_PAY).unwrap(),
            Some(Decimal::from(45000))
        );
    }

    #[test]
    fn test_from_rows_collects_columns_in_order() {
        let rows = vec![
            [(fields::EMP_ID, "E1"), (fields::NAME, "A")]
                .into_iter()
                .collect::<EmployeeRecord>(),
            [(fields::EMP_ID, "E2"), (fields::EMAIL, "b@x.com")]
                .into_iter()
                .collect::<EmployeeRecord>(),
        ];
        let set = RecordSet::from_rows(rows);
        assert_eq!(set.len(), 2);
        assert!(set.has_column(fields::EMAIL));
        assert!(set.has_column(fields::NAME));
        assert!(!set.has_column(fields::MOBILE));
    }
}
