use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::warn;

use super::AppState;
use crate::dashboard::table::{SortBy, SortDirection, TableError};
use crate::dashboard::{DashboardEvent, DashboardView};
use crate::data::filter::FilterId;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request body: {0}")]
    Body(String),
    #[error(transparent)]
    Table(#[from] TableError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Body(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Body(_) => StatusCode::BAD_REQUEST,
            ApiError::Table(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };
        warn!(%status, "rejected request: {self}");
        error_response(status, &self.to_string())
    }
}

pub fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({
            "status": "error",
            "message": message,
        })),
    )
        .into_response()
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterOption {
    pub id: FilterId,
    pub label: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct FilterRequest {
    pub filter: FilterId,
}

#[derive(Debug, Deserialize)]
pub struct SortRequest {
    /// Omit (or send `null`) to clear sorting.
    pub column: Option<String>,
    #[serde(default = "default_direction")]
    pub direction: SortDirection,
}

fn default_direction() -> SortDirection {
    SortDirection::Asc
}

#[derive(Debug, Deserialize)]
pub struct TextFilterRequest {
    pub column: String,
    #[serde(default)]
    pub expression: String,
}

#[derive(Debug, Deserialize)]
pub struct PageRequest {
    pub page: usize,
}

#[derive(Debug, Deserialize)]
pub struct SelectRowRequest {
    pub row: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SelectColumnsRequest {
    #[serde(default)]
    pub columns: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct EditCellRequest {
    pub row: usize,
    pub column: String,
    pub value: Value,
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "shelterdash",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn filters() -> Json<Vec<FilterOption>> {
    Json(
        FilterId::ALL
            .iter()
            .map(|&id| FilterOption {
                id,
                label: id.label(),
            })
            .collect(),
    )
}

pub async fn view(State(state): State<AppState>) -> Json<DashboardView> {
    Json(state.dashboard.lock().await.view())
}

async fn apply_event(state: &AppState, event: DashboardEvent) -> Result<Json<DashboardView>, ApiError> {
    let mut dashboard = state.dashboard.lock().await;
    dashboard.apply(event).await?;
    Ok(Json(dashboard.view()))
}

pub async fn select_filter(
    State(state): State<AppState>,
    payload: Result<Json<FilterRequest>, JsonRejection>,
) -> Result<Json<DashboardView>, ApiError> {
    let Json(request) = payload?;
    apply_event(&state, DashboardEvent::FilterSelected { filter: request.filter }).await
}

pub async fn sort(
    State(state): State<AppState>,
    payload: Result<Json<SortRequest>, JsonRejection>,
) -> Result<Json<DashboardView>, ApiError> {
    let Json(request) = payload?;
    let sort = request.column.map(|column| SortBy {
        column,
        direction: request.direction,
    });
    apply_event(&state, DashboardEvent::SortChanged { sort }).await
}

pub async fn text_filter(
    State(state): State<AppState>,
    payload: Result<Json<TextFilterRequest>, JsonRejection>,
) -> Result<Json<DashboardView>, ApiError> {
    let Json(request) = payload?;
    apply_event(
        &state,
        DashboardEvent::TextFilterChanged {
            column: request.column,
            expression: request.expression,
        },
    )
    .await
}

pub async fn page(
    State(state): State<AppState>,
    payload: Result<Json<PageRequest>, JsonRejection>,
) -> Result<Json<DashboardView>, ApiError> {
    let Json(request) = payload?;
    apply_event(&state, DashboardEvent::PageChanged { page: request.page }).await
}

pub async fn select_row(
    State(state): State<AppState>,
    payload: Result<Json<SelectRowRequest>, JsonRejection>,
) -> Result<Json<DashboardView>, ApiError> {
    let Json(request) = payload?;
    apply_event(&state, DashboardEvent::RowSelected { row: request.row }).await
}

pub async fn select_columns(
    State(state): State<AppState>,
    payload: Result<Json<SelectColumnsRequest>, JsonRejection>,
) -> Result<Json<DashboardView>, ApiError> {
    let Json(request) = payload?;
    apply_event(
        &state,
        DashboardEvent::ColumnsSelected {
            columns: request.columns,
        },
    )
    .await
}

pub async fn edit_cell(
    State(state): State<AppState>,
    payload: Result<Json<EditCellRequest>, JsonRejection>,
) -> Result<Json<DashboardView>, ApiError> {
    let Json(request) = payload?;
    apply_event(
        &state,
        DashboardEvent::CellEdited {
            row: request.row,
            column: request.column,
            value: request.value,
        },
    )
    .await
}

pub async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Route not found")
}
