//! Record set validation.
//!
//! Only the shape of the record set is checked here. Blank values in
//! mandatory columns are left to the per-record stages, which skip the
//! affected channel instead of aborting the batch.

use log::{info, warn};
use thiserror::Error;

use super::models::{fields, RecordSet};

/// Batch-fatal validation failure.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("missing required columns: {}", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },
}

impl ValidationError {
    pub fn missing_columns(&self) -> &[String] {
        match self {
            ValidationError::MissingColumns { missing } => missing,
        }
    }
}

/// Check that every mandatory column is present, reporting all absent ones.
pub fn validate_record_set<'a>(
    records: &'a RecordSet,
    mandatory: &[&str],
) -> Result<&'a RecordSet, ValidationError> {
    let missing: Vec<String> = mandatory
        .iter()
        .filter(|column| !records.has_column(column))
        .map(|column| column.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(ValidationError::MissingColumns { missing });
    }

    let blank_emails = count_blank(records, fields::EMAIL);
    if blank_emails > 0 {
        warn!("{} employees have missing email addresses", blank_emails);
    }

    info!("Validated {} employee records", records.len());
    Ok(records)
}

/// Number of rows whose value for `field` is absent, null or blank.
pub fn count_blank(records: &RecordSet, field: &str) -> usize {
    records
        .rows()
        .iter()
        .filter(|row| row.get(field).map_or(true, |value| value.is_blank()))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::models::{EmployeeRecord, FieldValue, MANDATORY_FIELDS};

    fn row(pairs: &[(&str, FieldValue)]) -> EmployeeRecord {
        pairs.iter().cloned().collect()
    }

    #[test]
    fn test_reports_every_missing_column() {
        let set = RecordSet::new(
            vec!["Name".to_string(), "Net_Pay".to_string()],
            vec![row(&[("Name", "A".into())])],
        );

        let err = validate_record_set(&set, &MANDATORY_FIELDS).unwrap_err();
        assert_eq!(err.missing_columns(), &["EMP_ID".to_string(), "Email".to_string()]);
        assert_eq!(err.to_string(), "missing required columns: EMP_ID, Email");
    }

    #[test]
    fn test_blank_mandatory_values_are_not_rejected() {
        let set = RecordSet::new(
            vec!["EMP_ID".into(), "Name".into(), "Email".into()],
            vec![
                row(&[("EMP_ID", "E1".into()), ("Name", "A".into()), ("Email", FieldValue::Null)]),
                row(&[("EMP_ID", "E2".into()), ("Name", "B".into()), ("Email", "  ".into())]),
            ],
        );

        assert!(validate_record_set(&set, &MANDATORY_FIELDS).is_ok());
        assert_eq!(count_blank(&set, fields::EMAIL), 2);
    }

    #[test]
    fn test_empty_record_set_is_valid() {
        let set = RecordSet::new(
            vec!["EMP_ID".into(), "Name".into(), "Email".into()],
            Vec::new(),
        );
        let validated = validate_record_set(&set, &MANDATORY_FIELDS).unwrap();
        assert!(validated.is_empty());
    }
}
