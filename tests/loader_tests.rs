use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::json;
use shelterdash::data::filter::{resolve, FilterId};
use shelterdash::data::loader::{load_csv, read_csv, LoadError};
use shelterdash::data::query::Query;
use shelterdash::data::store::{DocumentStore, MemoryStore};

fn unique_temp_path(name: &str) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("shelterdash-{name}-{stamp}.csv"))
}

const THREE_ROWS: &str = "\
animal_id,name,breed,sex_upon_outcome,age_upon_outcome_in_weeks,location_lat,location_long
A1,Rex,Labrador Retriever Mix,Intact Female,30.5,30.2,-97.5
A2,Max,Siberian Husky,Intact Male,60,30.4,-97.6
A3,,German Shepherd,Intact Male,,30.6,-97.7
";

#[tokio::test]
async fn three_row_csv_replaces_the_whole_collection() {
    let path = unique_temp_path("three-rows");
    fs::write(&path, THREE_ROWS).expect("fixture should be written");

    let old = (0..7)
        .map(|i| json!({ "legacy": i }).as_object().cloned().unwrap())
        .collect();
    let store = MemoryStore::with_records(old);
    assert_eq!(store.count().await.unwrap(), 7);

    let report = load_csv(&store, &path).await.expect("load should succeed");
    assert_eq!(report.rows, 3);
    assert_eq!(report.documents_after_load, 3);
    assert_eq!(report.columns.len(), 7);
    assert_eq!(store.count().await.unwrap(), 3);

    let documents = store.find(&Query::all(), 0).await.unwrap();
    assert!(documents.iter().all(|d| !d.contains_key("legacy")));
    assert!(documents.iter().all(|d| d.contains_key("_id")));

    let _ = fs::remove_file(path);
}

#[tokio::test]
async fn loaded_columns_are_typed_for_range_queries() {
    let path = unique_temp_path("typed");
    fs::write(&path, THREE_ROWS).expect("fixture should be written");

    let (_, records) = read_csv(&path).expect("csv should parse");
    assert_eq!(records[0]["age_upon_outcome_in_weeks"], json!(30.5));
    assert_eq!(records[1]["age_upon_outcome_in_weeks"], json!(60.0));
    assert!(records[2]["age_upon_outcome_in_weeks"].is_null());
    assert!(records[2]["name"].is_null());
    assert_eq!(records[0]["animal_id"], json!("A1"));

    let store = MemoryStore::new();
    load_csv(&store, &path).await.unwrap();
    let water = store.find(&resolve(FilterId::Water), 0).await.unwrap();
    assert_eq!(water.len(), 1);
    assert_eq!(water[0]["name"], "Rex");

    let _ = fs::remove_file(path);
}

#[tokio::test]
async fn missing_file_aborts_before_touching_the_store() {
    let store = MemoryStore::with_records(vec![json!({"keep": true})
        .as_object()
        .cloned()
        .unwrap()]);
    let err = load_csv(&store, &unique_temp_path("missing"))
        .await
        .unwrap_err();
    assert!(matches!(err, LoadError::Read { .. }));
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn ragged_csv_is_rejected() {
    let path = unique_temp_path("ragged");
    fs::write(&path, "a,b\n1,2\n3\n").expect("fixture should be written");

    let store = MemoryStore::new();
    let err = load_csv(&store, &path).await.unwrap_err();
    assert!(matches!(err, LoadError::Parse { .. }));
    assert!(err.to_string().contains("malformed CSV"));

    let _ = fs::remove_file(path);
}

#[tokio::test]
async fn header_only_csv_empties_the_collection() {
    let path = unique_temp_path("header-only");
    fs::write(&path, "breed,name\n").expect("fixture should be written");

    let store = MemoryStore::with_records(vec![json!({"old": 1}).as_object().cloned().unwrap()]);
    let report = load_csv(&store, &path).await.unwrap();
    assert_eq!(report.rows, 0);
    assert_eq!(report.documents_after_load, 0);

    let _ = fs::remove_file(path);
}

#[test]
fn names_that_look_like_float_keywords_are_kept() {
    let path = unique_temp_path("nan-names");
    fs::write(&path, "name,breed\nNan,Beagle\nInf,Husky\n").expect("fixture should be written");

    let (_, records) = read_csv(&path).expect("csv should parse");
    assert_eq!(records[0]["name"], json!("Nan"));
    assert_eq!(records[1]["name"], json!("Inf"));
    assert_eq!(records[1]["breed"], json!("Husky"));

    let _ = fs::remove_file(path);
}
