//! CSV ingestion into a [`RecordSet`].

use std::io::Read;
use std::path::Path;

use log::info;
use thiserror::Error;

use super::models::{EmployeeRecord, FieldValue, RecordSet};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open record file: {0}")]
    Io(#[source] std::io::Error),
    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Load a CSV file with a header row. Blank cells become [`FieldValue::Null`].
pub fn load_csv(path: &Path) -> Result<RecordSet, LoadError> {
    let file = std::fs::File::open(path).map_err(LoadError::Io)?;
    let records = read_csv(file)?;
    info!(
        "Loaded {} employee records from {}",
        records.len(),
        path.display()
    );
    Ok(records)
}

/// Parse CSV from any reader.
pub fn read_csv<R: Read>(reader: R) -> Result<RecordSet, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(reader);

    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let row = result?;
        let record: EmployeeRecord = columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                let value = match row.get(idx) {
                    Some(cell) if !cell.trim().is_empty() => FieldValue::Text(cell.to_string()),
                    _ => FieldValue::Null,
                };
                (column.clone(), value)
            })
            .collect();
        rows.push(record);
    }

    Ok(RecordSet::new(columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::models::fields;

    #[test]
    fn test_read_csv_keeps_order_and_nulls() {
        let data = "EMP_ID, Name ,Email,Net_Pay\nE1,A. Kumar,a@x.com,45000\nE2,B. Rao,,\n";
        let set = read_csv(data.as_bytes()).unwrap();

        assert_eq!(set.columns(), &["EMP_ID", "Name", "Email", "Net_Pay"]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.rows()[0].identifier().as_deref(), Some("E1"));
        assert_eq!(set.rows()[1].get(fields::EMAIL), Some(&FieldValue::Null));
        assert_eq!(set.rows()[1].get(fields::NET_PAY), Some(&FieldValue::Null));
    }

    #[test]
    fn test_short_rows_fill_with_null() {
        let data = "EMP_ID,Name,Email,Mobile\nE1,A,a@x.com\n";
        let set = read_csv(data.as_bytes()).unwrap();
        assert_eq!(set.rows()[0].get(fields::MOBILE), Some(&FieldValue::Null));
    }

    #[test]
    fn test_load_csv_missing_file() {
        let result = load_csv(Path::new("/nonexistent/employees.csv"));
        assert!(matches!(result, Err(LoadError::Io(_))));
    }
}
