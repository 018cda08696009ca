//! Bulk CSV load: read the whole file, then drop the collection and insert every row.
//!
//! Cell typing is decided per column: integer when every non-empty cell parses as one
//! (float if the column also has gaps), float when every non-empty cell parses as a
//! float, text otherwise. Empty cells are stored as `null`.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Number, Value};
use thiserror::Error;
use tracing::{error, info};

use super::store::{DocumentStore, StoreError};
use super::Record;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read CSV '{path}': {source}")]
    Read { path: String, source: csv::Error },
    #[error("malformed CSV '{path}': {source}")]
    Parse { path: String, source: csv::Error },
    #[error("store rejected load: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadReport {
    pub source_path: String,
    pub rows: usize,
    pub columns: Vec<String>,
    pub documents_after_load: u64,
    pub loaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Integer,
    Float,
    Text,
}

/// Parse a CSV file into records with inferred column types.
pub fn read_csv(path: &Path) -> Result<(Vec<String>, Vec<Record>), LoadError> {
    let display = path.display().to_string();
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_path(path)
        .map_err(|source| LoadError::Read {
            path: display.clone(),
            source,
        })?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|source| LoadError::Parse {
            path: display.clone(),
            source,
        })?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows: Vec<Vec<String>> = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|source| LoadError::Parse {
            path: display.clone(),
            source,
        })?;
        rows.push(row.iter().map(str::to_string).collect());
    }

    let kinds: Vec<ColumnKind> = (0..headers.len())
        .map(|column| column_kind(rows.iter().map(|row| row[column].as_str())))
        .collect();

    let records = rows
        .into_iter()
        .map(|row| {
            headers
                .iter()
                .zip(kinds.iter())
                .zip(row)
                .map(|((header, kind), cell)| (header.clone(), typed_cell(*kind, &cell)))
                .collect::<Record>()
        })
        .collect();

    Ok((headers, records))
}

fn column_kind<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnKind {
    let mut has_gaps = false;
    let mut all_integer = true;
    let mut all_float = true;
    let mut any_value = false;
    for cell in cells {
        let cell = cell.trim();
        if cell.is_empty() {
            has_gaps = true;
            continue;
        }
        any_value = true;
        all_integer &= cell.parse::<i64>().is_ok();
        all_float &= parse_finite(cell).is_some();
        if !all_float {
            return ColumnKind::Text;
        }
    }
    match (any_value, all_integer, has_gaps) {
        (false, _, _) => ColumnKind::Text,
        (true, true, false) => ColumnKind::Integer,
        _ => ColumnKind::Float,
    }
}

/// `str::parse` also accepts `nan` and `inf` spellings, which are names here, not numbers.
fn parse_finite(cell: &str) -> Option<f64> {
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn typed_cell(kind: ColumnKind, cell: &str) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    match kind {
        ColumnKind::Integer => trimmed
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(cell.to_string())),
        ColumnKind::Float => parse_finite(trimmed)
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ColumnKind::Text => Value::String(cell.to_string()),
    }
}

/// Replace the store's contents with the rows of `path`. Any failure aborts the load;
/// a failure after the drop leaves the collection empty or partially filled.
pub async fn load_csv(store: &dyn DocumentStore, path: &Path) -> Result<LoadReport, LoadError> {
    info!(path = %path.display(), "loading data");
    let (columns, records) = read_csv(path).inspect_err(|err| error!("{err}"))?;
    let rows = records.len();
    info!(rows, columns = columns.len(), ?columns, "dataset read");

    info!(store = %store.describe(), "dropping existing collection");
    store.drop_all().await.inspect_err(|err| error!("{err}"))?;

    info!(rows, "inserting new data");
    store
        .insert_many(records)
        .await
        .inspect_err(|err| error!("{err}"))?;

    let documents_after_load = store.count().await?;
    info!(documents_after_load, "load complete");

    Ok(LoadReport {
        source_path: path.display().to_string(),
        rows,
        columns,
        documents_after_load,
        loaded_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_columns_with_gaps_become_float() {
        assert_eq!(column_kind(["1", "2", "3"].into_iter()), ColumnKind::Integer);
        assert_eq!(column_kind(["1", "", "3"].into_iter()), ColumnKind::Float);
        assert_eq!(column_kind(["1.5", "2"].into_iter()), ColumnKind::Float);
        assert_eq!(column_kind(["1", "Rex"].into_iter()), ColumnKind::Text);
        assert_eq!(column_kind(["", ""].into_iter()), ColumnKind::Text);
    }

    #[test]
    fn nan_and_inf_spellings_stay_text() {
        assert_eq!(column_kind(["Nan", "Inf"].into_iter()), ColumnKind::Text);
        assert_eq!(column_kind(["1.5", "infinity"].into_iter()), ColumnKind::Text);
    }

    #[test]
    fn typed_cells_follow_column_kind() {
        assert_eq!(typed_cell(ColumnKind::Integer, "42"), Value::from(42));
        assert_eq!(typed_cell(ColumnKind::Float, "30.2"), Value::from(30.2));
        assert_eq!(typed_cell(ColumnKind::Float, ""), Value::Null);
        assert_eq!(
            typed_cell(ColumnKind::Text, "Intact Male"),
            Value::String("Intact Male".to_string())
        );
    }
}
