//! Reactive dashboard session.
//!
//! Each [`DashboardEvent`] is applied to completion, then only the panels whose
//! inputs changed are recomputed:
//!
//! | input                       | table rows | styles | chart | map |
//! |-----------------------------|:----------:|:------:|:-----:|:---:|
//! | filter selected             | x          |        | x     | x   |
//! | columns selected            |            | x      |       |     |
//! | sort / text filter / edit   |            |        | x     | x   |
//! | row selected                |            |        |       | x   |
//! | page changed                |            |        |       |     |

pub mod cell_filter;
pub mod chart;
pub mod map;
pub mod table;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::data::filter::{resolve, FilterId};
use crate::data::shelter::AnimalShelter;
use crate::data::{strip_identifier, Record};
use chart::{breed_pie, PieChart};
use map::{map_view, MapView};
use table::{SortBy, TableError, TableState, PAGE_SIZE};

pub const SELECTED_COLUMN_COLOR: &str = "#D2F3FF";
pub const DEFAULT_READ_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    FilterSelected { filter: FilterId },
    ColumnsSelected { columns: Vec<String> },
    SortChanged { sort: Option<SortBy> },
    TextFilterChanged { column: String, expression: String },
    PageChanged { page: usize },
    RowSelected { row: Option<usize> },
    CellEdited { row: usize, column: String, value: Value },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyleCondition {
    pub column_id: String,
}

/// Conditional cell style, serialized as `{"if": {"column_id": ..}, "background_color": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyleRule {
    #[serde(rename = "if")]
    pub condition: StyleCondition,
    pub background_color: &'static str,
}

pub fn column_styles(selected_columns: &[String]) -> Vec<StyleRule> {
    selected_columns
        .iter()
        .map(|column| StyleRule {
            condition: StyleCondition {
                column_id: column.clone(),
            },
            background_color: SELECTED_COLUMN_COLOR,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default)]
struct Changed {
    virtual_rows: bool,
    selection: bool,
    columns: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ViewRow {
    /// Index into the table's data rows; events refer to rows by this index.
    pub index: usize,
    pub record: Record,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageInfo {
    pub current: usize,
    pub size: usize,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub filter: FilterId,
    pub columns: Vec<String>,
    pub total_rows: usize,
    pub virtual_rows: usize,
    pub page: PageInfo,
    pub rows: Vec<ViewRow>,
    pub sort: Option<SortBy>,
    pub filters: Vec<ColumnFilterView>,
    pub selected_row: Option<usize>,
    pub selected_columns: Vec<String>,
    pub style_data_conditional: Vec<StyleRule>,
    pub chart: Option<PieChart>,
    pub map: MapView,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnFilterView {
    pub column: String,
    pub expression: String,
}

/// One user session over an injected shelter repository.
pub struct Dashboard {
    shelter: AnimalShelter,
    read_limit: usize,
    filter: FilterId,
    table: TableState,
    styles: Vec<StyleRule>,
    chart: Option<PieChart>,
    map: MapView,
}

impl Dashboard {
    /// Loads the initial `All` selection.
    pub async fn open(shelter: AnimalShelter, read_limit: usize) -> Self {
        let mut dashboard = Self {
            shelter,
            read_limit,
            filter: FilterId::All,
            table: TableState::default(),
            styles: Vec::new(),
            chart: None,
            map: MapView::default(),
        };
        dashboard.select_filter(FilterId::All).await;
        dashboard.recompute(Changed {
            virtual_rows: true,
            selection: true,
            columns: true,
        });
        dashboard
    }

    pub async fn apply(&mut self, event: DashboardEvent) -> Result<(), TableError> {
        debug!(?event, "dashboard event");
        let changed = match event {
            DashboardEvent::FilterSelected { filter } => {
                self.select_filter(filter).await;
                Changed {
                    virtual_rows: true,
                    selection: true,
                    columns: true,
                }
            }
            DashboardEvent::ColumnsSelected { columns } => {
                self.table.select_columns(columns)?;
                Changed {
                    columns: true,
                    ..Changed::default()
                }
            }
            DashboardEvent::SortChanged { sort } => {
                self.table.set_sort(sort)?;
                Changed {
                    virtual_rows: true,
                    ..Changed::default()
                }
            }
            DashboardEvent::TextFilterChanged { column, expression } => {
                self.table.set_filter(&column, &expression)?;
                Changed {
                    virtual_rows: true,
                    ..Changed::default()
                }
            }
            DashboardEvent::PageChanged { page } => {
                self.table.set_page(page)?;
                Changed::default()
            }
            DashboardEvent::RowSelected { row } => {
                self.table.select_row(row)?;
                Changed {
                    selection: true,
                    ..Changed::default()
                }
            }
            DashboardEvent::CellEdited { row, column, value } => {
                self.table.edit_cell(row, &column, value)?;
                Changed {
                    virtual_rows: true,
                    ..Changed::default()
                }
            }
        };
        self.recompute(changed);
        Ok(())
    }

    async fn select_filter(&mut self, filter: FilterId) {
        let query = resolve(filter);
        let mut records = self.shelter.read(&query, self.read_limit).await;
        strip_identifier(&mut records);
        info!(%filter, rows = records.len(), "table data refreshed");
        self.filter = filter;
        self.table.replace_rows(records);
    }

    fn recompute(&mut self, changed: Changed) {
        if changed.columns {
            self.styles = column_styles(self.table.selected_columns());
        }
        if changed.virtual_rows || changed.selection {
            let visible = self.table.virtual_data();
            if changed.virtual_rows {
                self.chart = breed_pie(&visible);
            }
            self.map = map_view(&visible, self.table.virtual_selected_row());
        }
    }

    pub fn filter(&self) -> FilterId {
        self.filter
    }

    pub fn table(&self) -> &TableState {
        &self.table
    }

    pub fn styles(&self) -> &[StyleRule] {
        &self.styles
    }

    pub fn chart(&self) -> Option<&PieChart> {
        self.chart.as_ref()
    }

    pub fn map(&self) -> &MapView {
        &self.map
    }

    pub fn shelter(&self) -> &AnimalShelter {
        &self.shelter
    }

    pub fn view(&self) -> DashboardView {
        let rows = self
            .table
            .viewport_indices()
            .into_iter()
            .map(|index| ViewRow {
                index,
                record: self.table.rows()[index].clone(),
            })
            .collect();
        DashboardView {
            filter: self.filter,
            columns: self.table.columns().to_vec(),
            total_rows: self.table.rows().len(),
            virtual_rows: self.table.virtual_indices().len(),
            page: PageInfo {
                current: self.table.page_current(),
                size: PAGE_SIZE,
                count: self.table.page_count(),
            },
            rows,
            sort: self.table.sort().cloned(),
            filters: self
                .table
                .filters()
                .iter()
                .map(|(column, filter)| ColumnFilterView {
                    column: column.clone(),
                    expression: filter.expression.clone(),
                })
                .collect(),
            selected_row: self.table.selected_row(),
            selected_columns: self.table.selected_columns().to_vec(),
            style_data_conditional: self.styles.clone(),
            chart: self.chart.clone(),
            map: self.map.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_selected_columns_means_no_styles() {
        assert!(column_styles(&[]).is_empty());
    }

    #[test]
    fn style_rules_serialize_with_if_key() {
        let rules = column_styles(&["breed".to_string()]);
        let value = serde_json::to_value(&rules).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{ "if": { "column_id": "breed" }, "background_color": "#D2F3FF" }])
        );
    }
}
