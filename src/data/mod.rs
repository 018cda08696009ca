//! Shelter outcome records: query model, rescue filter presets, store access and CSV loading.

pub mod filter;
pub mod loader;
pub mod query;
pub mod shelter;
pub mod store;

use serde_json::{Map, Value};

/// One shelter-outcome document. No schema is enforced; unknown fields pass through.
pub type Record = Map<String, Value>;

pub const FIELD_ID: &str = "_id";
pub const FIELD_BREED: &str = "breed";
pub const FIELD_SEX: &str = "sex_upon_outcome";
pub const FIELD_AGE_WEEKS: &str = "age_upon_outcome_in_weeks";
pub const FIELD_LAT: &str = "location_lat";
pub const FIELD_LONG: &str = "location_long";
pub const FIELD_NAME: &str = "name";

/// Drop the store-assigned identifier from every record. Safe to call repeatedly.
pub fn strip_identifier(records: &mut [Record]) {
    for record in records {
        record.shift_remove(FIELD_ID);
    }
}

/// Column names in first-seen order across all records.
pub fn column_names(records: &[Record]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        for key in record.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}
