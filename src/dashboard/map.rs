//! Geolocation panel: a fixed-center map with at most one marker for the selected animal.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use super::cell_filter::display_value;
use crate::data::{Record, FIELD_BREED, FIELD_LAT, FIELD_LONG, FIELD_NAME};

/// Austin, TX.
pub const DEFAULT_CENTER: [f64; 2] = [30.75, -97.48];
pub const DEFAULT_ZOOM: u8 = 10;
pub const POPUP_TITLE: &str = "Animal Name";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapError {
    #[error("selected row {0} is not among the visible rows")]
    RowNotVisible(usize),
    #[error("field '{0}' is missing")]
    MissingField(&'static str),
    #[error("field '{field}' is not a valid coordinate: {value}")]
    InvalidCoordinate { field: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub position: [f64; 2],
    pub tooltip: String,
    pub popup_title: &'static str,
    pub popup: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub center: [f64; 2],
    pub zoom: u8,
    pub width: &'static str,
    pub height: &'static str,
    pub marker: Option<MapMarker>,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            width: "1000px",
            height: "500px",
            marker: None,
        }
    }
}

/// Map for the visible rows and the selected position among them. Bad row data never
/// fails the view: it is logged and the unmarked default map is returned.
pub fn map_view(rows: &[&Record], selected: Option<usize>) -> MapView {
    let Some(index) = selected.filter(|_| !rows.is_empty()) else {
        return MapView::default();
    };
    let marker = rows
        .get(index)
        .ok_or(MapError::RowNotVisible(index))
        .and_then(|row| marker_for(row));
    match marker {
        Ok(marker) => MapView {
            marker: Some(marker),
            ..MapView::default()
        },
        Err(err) => {
            warn!(row = index, "error updating map: {err}");
            MapView::default()
        }
    }
}

pub fn marker_for(row: &Record) -> Result<MapMarker, MapError> {
    let lat = coordinate(row, FIELD_LAT)?;
    let lon = coordinate(row, FIELD_LONG)?;
    let breed = row.get(FIELD_BREED).ok_or(MapError::MissingField(FIELD_BREED))?;
    let name = row.get(FIELD_NAME).ok_or(MapError::MissingField(FIELD_NAME))?;
    Ok(MapMarker {
        position: [lat, lon],
        tooltip: display_value(breed),
        popup_title: POPUP_TITLE,
        popup: display_value(name),
    })
}

fn coordinate(row: &Record, field: &'static str) -> Result<f64, MapError> {
    let value = row.get(field).ok_or(MapError::MissingField(field))?;
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|v| v.is_finite())
        .ok_or_else(|| MapError::InvalidCoordinate {
            field,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn numeric_strings_are_accepted_as_coordinates() {
        let row = record(json!({
            "location_lat": "30.5", "location_long": -97.1, "breed": "Husky", "name": "Max"
        }));
        let marker = marker_for(&row).unwrap();
        assert_eq!(marker.position, [30.5, -97.1]);
    }

    #[test]
    fn null_or_text_coordinates_are_rejected() {
        let row = record(json!({
            "location_lat": null, "location_long": -97.1, "breed": "Husky", "name": "Max"
        }));
        assert!(matches!(
            marker_for(&row),
            Err(MapError::InvalidCoordinate { field: "location_lat", .. })
        ));
        let row = record(json!({
            "location_lat": 30.1, "location_long": "west", "breed": "Husky", "name": "Max"
        }));
        assert!(marker_for(&row).is_err());
    }

    #[test]
    fn selection_past_the_visible_rows_falls_back() {
        let row = record(json!({
            "location_lat": 30.1, "location_long": -97.0, "breed": "Husky", "name": "Max"
        }));
        assert_eq!(map_view(&[&row], Some(3)), MapView::default());
        assert!(map_view(&[&row], Some(0)).marker.is_some());
    }
}
