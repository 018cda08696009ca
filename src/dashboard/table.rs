//! Client-side table state: rows, per-column filters, single-column sort, fixed-size paging,
//! single-row and multi-column selection.
//!
//! "Virtual" rows are the data rows after filtering and sorting, across every page;
//! the viewport is the current page of them.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::cell_filter::{display_value, CellFilter};
use crate::data::{column_names, Record};

pub const PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("row {row} out of range (table has {len} rows)")]
    RowOutOfRange { row: usize, len: usize },
    #[error("unknown column '{0}'")]
    UnknownColumn(String),
    #[error("page {page} out of range (table has {count} pages)")]
    PageOutOfRange { page: usize, count: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortBy {
    pub column: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Default)]
pub struct TableState {
    rows: Vec<Record>,
    columns: Vec<String>,
    sort: Option<SortBy>,
    filters: BTreeMap<String, CellFilter>,
    page_current: usize,
    selected_row: Option<usize>,
    selected_columns: Vec<String>,
}

impl TableState {
    /// New data: columns follow the rows, paging and row selection reset. Column
    /// filters, sort and column selection survive when their column still exists.
    pub fn replace_rows(&mut self, rows: Vec<Record>) {
        self.columns = column_names(&rows);
        self.rows = rows;
        self.page_current = 0;
        self.selected_row = None;
        let columns = &self.columns;
        self.filters.retain(|column, _| columns.contains(column));
        self.selected_columns.retain(|column| columns.contains(column));
        if self
            .sort
            .as_ref()
            .is_some_and(|sort| !columns.contains(&sort.column))
        {
            self.sort = None;
        }
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn sort(&self) -> Option<&SortBy> {
        self.sort.as_ref()
    }

    pub fn filters(&self) -> &BTreeMap<String, CellFilter> {
        &self.filters
    }

    pub fn page_current(&self) -> usize {
        self.page_current
    }

    pub fn selected_row(&self) -> Option<usize> {
        self.selected_row
    }

    pub fn selected_columns(&self) -> &[String] {
        &self.selected_columns
    }

    /// Data-row indices after filtering and sorting.
    pub fn virtual_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.rows.len())
            .filter(|&i| {
                self.filters
                    .iter()
                    .all(|(column, filter)| filter.matches(self.rows[i].get(column)))
            })
            .collect();
        if let Some(sort) = &self.sort {
            indices.sort_by(|&a, &b| {
                let ordering = compare_cells(
                    self.rows[a].get(&sort.column),
                    self.rows[b].get(&sort.column),
                );
                match (sort.direction, ordering) {
                    // Empty cells stay last in both directions.
                    (_, SortOrder::EmptyFirst) => Ordering::Greater,
                    (_, SortOrder::EmptySecond) => Ordering::Less,
                    (SortDirection::Asc, SortOrder::Values(o)) => o,
                    (SortDirection::Desc, SortOrder::Values(o)) => o.reverse(),
                }
            });
        }
        indices
    }

    pub fn virtual_data(&self) -> Vec<&Record> {
        self.virtual_indices()
            .into_iter()
            .map(|i| &self.rows[i])
            .collect()
    }

    /// Position of the selected row among the virtual rows; `None` when nothing is
    /// selected or the selected row is filtered out.
    pub fn virtual_selected_row(&self) -> Option<usize> {
        let selected = self.selected_row?;
        self.virtual_indices().iter().position(|&i| i == selected)
    }

    pub fn page_count(&self) -> usize {
        self.virtual_indices().len().div_ceil(PAGE_SIZE)
    }

    /// Data-row indices on the current page.
    pub fn viewport_indices(&self) -> Vec<usize> {
        self.virtual_indices()
            .into_iter()
            .skip(self.page_current * PAGE_SIZE)
            .take(PAGE_SIZE)
            .collect()
    }

    pub fn set_sort(&mut self, sort: Option<SortBy>) -> Result<(), TableError> {
        if let Some(sort) = &sort {
            self.require_column(&sort.column)?;
        }
        self.sort = sort;
        Ok(())
    }

    /// Blank expressions clear the column's filter. Changing filters returns to the
    /// first page.
    pub fn set_filter(&mut self, column: &str, expression: &str) -> Result<(), TableError> {
        self.require_column(column)?;
        match CellFilter::parse(expression) {
            Some(filter) => {
                self.filters.insert(column.to_string(), filter);
            }
            None => {
                self.filters.remove(column);
            }
        }
        self.page_current = 0;
        Ok(())
    }

    pub fn set_page(&mut self, page: usize) -> Result<(), TableError> {
        let count = self.page_count();
        if page > 0 && page >= count {
            return Err(TableError::PageOutOfRange { page, count });
        }
        self.page_current = page;
        Ok(())
    }

    /// Single selection: a new row replaces the previous one.
    pub fn select_row(&mut self, row: Option<usize>) -> Result<(), TableError> {
        if let Some(row) = row {
            self.require_row(row)?;
        }
        self.selected_row = row;
        Ok(())
    }

    pub fn select_columns(&mut self, columns: Vec<String>) -> Result<(), TableError> {
        for column in &columns {
            self.require_column(column)?;
        }
        let mut unique: Vec<String> = Vec::with_capacity(columns.len());
        for column in columns {
            if !unique.contains(&column) {
                unique.push(column);
            }
        }
        self.selected_columns = unique;
        Ok(())
    }

    /// Edits only the session's copy of the row; the store is never written. An edit can
    /// filter its row out, so the page is pulled back onto the last one that still exists.
    pub fn edit_cell(&mut self, row: usize, column: &str, value: Value) -> Result<(), TableError> {
        self.require_row(row)?;
        self.require_column(column)?;
        self.rows[row].insert(column.to_string(), value);
        self.page_current = self.page_current.min(self.page_count().saturating_sub(1));
        Ok(())
    }

    fn require_row(&self, row: usize) -> Result<(), TableError> {
        if row >= self.rows.len() {
            return Err(TableError::RowOutOfRange {
                row,
                len: self.rows.len(),
            });
        }
        Ok(())
    }

    fn require_column(&self, column: &str) -> Result<(), TableError> {
        if !self.columns.iter().any(|c| c == column) {
            return Err(TableError::UnknownColumn(column.to_string()));
        }
        Ok(())
    }
}

enum SortOrder {
    Values(Ordering),
    EmptyFirst,
    EmptySecond,
}

fn is_empty_cell(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

fn compare_cells(a: Option<&Value>, b: Option<&Value>) -> SortOrder {
    match (is_empty_cell(a), is_empty_cell(b)) {
        (true, true) => return SortOrder::Values(Ordering::Equal),
        (true, false) => return SortOrder::EmptyFirst,
        (false, true) => return SortOrder::EmptySecond,
        (false, false) => {}
    }
    let (Some(a), Some(b)) = (a, b) else {
        return SortOrder::Values(Ordering::Equal);
    };
    let ordering = match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        // Numbers sort ahead of text.
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => display_value(a).cmp(&display_value(b)),
    };
    SortOrder::Values(ordering)
}
