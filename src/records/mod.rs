//! Employee records: models, CSV ingestion and record set validation.

pub mod loader;
pub mod models;
pub mod validation;

pub use loader::{load_csv, read_csv, LoadError};
pub use models::{fields, EmployeeRecord, FieldError, FieldValue, RecordSet, MANDATORY_FIELDS};
pub use validation::{count_blank, validate_record_set, ValidationError};
