use serde::Serialize;

use super::cell_filter::display_value;
use crate::data::{Record, FIELD_BREED};

pub const CHART_TITLE: &str = "Preferred Animals";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub label: String,
    pub count: usize,
    pub fraction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieChart {
    pub title: &'static str,
    pub total: usize,
    pub slices: Vec<PieSlice>,
}

/// Breed share of the visible rows, largest slice first (ties keep first-seen order).
/// `None` when there is nothing to chart.
pub fn breed_pie(rows: &[&Record]) -> Option<PieChart> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for row in rows {
        let Some(breed) = row.get(FIELD_BREED).filter(|v| !v.is_null()) else {
            continue;
        };
        let label = display_value(breed);
        match counts.iter_mut().find(|(existing, _)| *existing == label) {
            Some((_, count)) => *count += 1,
            None => counts.push((label, 1)),
        }
    }
    if counts.is_empty() {
        return None;
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    let total: usize = counts.iter().map(|(_, count)| count).sum();
    let slices = counts
        .into_iter()
        .map(|(label, count)| PieSlice {
            label,
            count,
            fraction: count as f64 / total as f64,
        })
        .collect();
    Some(PieChart {
        title: CHART_TITLE,
        total,
        slices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_rows_render_nothing() {
        assert_eq!(breed_pie(&[]), None);
    }

    #[test]
    fn slices_are_counted_and_ordered() {
        let rows: Vec<Record> = [
            json!({"breed": "Beagle"}),
            json!({"breed": "Husky"}),
            json!({"breed": "Husky"}),
            json!({"name": "no breed"}),
            json!({"breed": "Rottweiler"}),
        ]
        .into_iter()
        .filter_map(|v| v.as_object().cloned())
        .collect();
        let refs: Vec<&Record> = rows.iter().collect();

        let chart = breed_pie(&refs).unwrap();
        assert_eq!(chart.title, "Preferred Animals");
        assert_eq!(chart.total, 4);
        let labels: Vec<&str> = chart.slices.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, ["Husky", "Beagle", "Rottweiler"]);
        assert_eq!(chart.slices[0].count, 2);
        assert!((chart.slices[0].fraction - 0.5).abs() < 1e-9);
    }
}
