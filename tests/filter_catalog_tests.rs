use serde_json::{json, Value};
use shelterdash::data::filter::{resolve, FilterId};
use shelterdash::data::query::Clause;
use shelterdash::data::store::{DocumentStore, MemoryStore};
use shelterdash::data::Record;

fn record(value: Value) -> Record {
    value.as_object().cloned().expect("fixture should be an object")
}

/// (fragments, sex, lo, hi) pulled back out of a resolved query.
fn triple(filter: FilterId) -> (Vec<String>, String, f64, f64) {
    let query = resolve(filter);
    let mut fragments = Vec::new();
    let mut sex = String::new();
    let mut bounds = (f64::NAN, f64::NAN);
    for clause in query.clauses() {
        match clause {
            Clause::Substring(set) => {
                assert_eq!(set.field(), "breed");
                fragments = set.fragments().to_vec();
            }
            Clause::Exact(exact) => {
                assert_eq!(exact.field(), "sex_upon_outcome");
                sex = exact.value().to_string();
            }
            Clause::Range(range) => {
                assert_eq!(range.field(), "age_upon_outcome_in_weeks");
                bounds = range.bounds();
            }
        }
    }
    (fragments, sex, bounds.0, bounds.1)
}

#[test]
fn all_resolves_to_the_empty_query() {
    assert!(resolve(FilterId::All).is_empty());
    assert!(resolve(FilterId::parse("Search and Rescue")).is_empty());
}

#[test]
fn water_rescue_preset() {
    assert_eq!(
        triple(FilterId::Water),
        (
            vec!["lab".to_string(), "chesa".to_string(), "newf".to_string()],
            "Intact Female".to_string(),
            26.0,
            156.0
        )
    );
}

#[test]
fn mountain_rescue_preset() {
    let (fragments, sex, lo, hi) = triple(FilterId::Mountain);
    assert_eq!(fragments, ["german", "mala", "old english", "husk", "rott"]);
    assert_eq!(sex, "Intact Male");
    assert_eq!((lo, hi), (26.0, 156.0));
}

#[test]
fn disaster_rescue_preset() {
    let (fragments, sex, lo, hi) = triple(FilterId::Disaster);
    assert_eq!(fragments, ["german", "golden", "blood", "dober", "rott"]);
    assert_eq!(sex, "Intact Male");
    assert_eq!((lo, hi), (20.0, 300.0));
}

#[test]
fn resolve_is_deterministic() {
    for filter in FilterId::ALL {
        assert_eq!(resolve(filter), resolve(filter));
    }
}

#[tokio::test]
async fn water_filter_only_returns_matching_records() {
    let store = MemoryStore::with_records(vec![
        record(json!({"breed": "Labrador Retriever Mix", "sex_upon_outcome": "Intact Female", "age_upon_outcome_in_weeks": 52.0})),
        record(json!({"breed": "chesapeake bay retriever", "sex_upon_outcome": "Intact Female", "age_upon_outcome_in_weeks": 26})),
        record(json!({"breed": "Newfoundland", "sex_upon_outcome": "Intact Female", "age_upon_outcome_in_weeks": 156.0})),
        // wrong sex
        record(json!({"breed": "Labrador Retriever", "sex_upon_outcome": "Intact Male", "age_upon_outcome_in_weeks": 52.0})),
        // too young, too old
        record(json!({"breed": "Labrador Retriever", "sex_upon_outcome": "Intact Female", "age_upon_outcome_in_weeks": 25.9})),
        record(json!({"breed": "Labrador Retriever", "sex_upon_outcome": "Intact Female", "age_upon_outcome_in_weeks": 156.1})),
        // breed mismatch
        record(json!({"breed": "Beagle", "sex_upon_outcome": "Intact Female", "age_upon_outcome_in_weeks": 52.0})),
        // no age
        record(json!({"breed": "Labrador Retriever", "sex_upon_outcome": "Intact Female"})),
    ]);

    let results = store
        .find(&resolve(FilterId::Water), 0)
        .await
        .expect("memory store should not fail");

    assert_eq!(results.len(), 3);
    for result in &results {
        let breed = result["breed"].as_str().unwrap().to_lowercase();
        assert!(["lab", "chesa", "newf"].iter().any(|f| breed.contains(f)));
        assert_eq!(result["sex_upon_outcome"], "Intact Female");
        let age = result["age_upon_outcome_in_weeks"].as_f64().unwrap();
        assert!((26.0..=156.0).contains(&age));
    }
}

#[test]
fn preset_queries_render_as_mongo_filters() {
    let document = resolve(FilterId::Water).to_document();
    let alternatives = document
        .get_array("$or")
        .expect("breed alternatives should be an $or array");
    assert_eq!(alternatives.len(), 3);
    assert_eq!(
        document.get_str("sex_upon_outcome").ok(),
        Some("Intact Female")
    );
    let age = document
        .get_document("age_upon_outcome_in_weeks")
        .expect("age range should be a sub-document");
    assert_eq!(age.get_f64("$gte").ok(), Some(26.0));
    assert_eq!(age.get_f64("$lte").ok(), Some(156.0));
}
