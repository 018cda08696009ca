//! Structured record predicates. A [`Query`] is a conjunction of [`Clause`]s; it can be
//! evaluated against a record in memory or rendered as a MongoDB filter document.

use std::collections::HashSet;

use mongodb::bson::{doc, Bson, Document};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::Record;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("substring clause on '{0}' needs at least one non-blank fragment")]
    NoFragments(String),
    #[error("range clause on '{field}' has invalid bounds [{lo}, {hi}]")]
    InvalidRange { field: String, lo: String, hi: String },
}

/// Field contains any of the fragments, ignoring case.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubstringSet {
    field: String,
    fragments: Vec<String>,
}

impl SubstringSet {
    pub fn new<I, S>(field: &str, fragments: I) -> Result<Self, QueryError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fragments: Vec<String> = fragments
            .into_iter()
            .map(Into::into)
            .filter(|f| !f.trim().is_empty())
            .collect();
        if fragments.is_empty() {
            return Err(QueryError::NoFragments(field.to_string()));
        }
        Ok(Self {
            field: field.to_string(),
            fragments,
        })
    }

    /// Built-in fragment lists, checked by the catalog tests rather than at runtime.
    pub(crate) fn preset(field: &str, fragments: &[&str]) -> Self {
        Self {
            field: field.to_string(),
            fragments: fragments.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }
}

/// Field equals the value exactly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExactMatch {
    field: String,
    value: String,
}

impl ExactMatch {
    pub fn new(field: &str, value: &str) -> Self {
        Self {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Numeric field within `[lo, hi]`, both ends inclusive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericRange {
    field: String,
    lo: f64,
    hi: f64,
}

impl NumericRange {
    pub fn new(field: &str, lo: f64, hi: f64) -> Result<Self, QueryError> {
        if !lo.is_finite() || !hi.is_finite() || lo > hi {
            return Err(QueryError::InvalidRange {
                field: field.to_string(),
                lo: lo.to_string(),
                hi: hi.to_string(),
            });
        }
        Ok(Self {
            field: field.to_string(),
            lo,
            hi,
        })
    }

    pub(crate) fn preset(field: &str, lo: f64, hi: f64) -> Self {
        Self {
            field: field.to_string(),
            lo,
            hi,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.lo, self.hi)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Clause {
    Substring(SubstringSet),
    Exact(ExactMatch),
    Range(NumericRange),
}

impl Clause {
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::Substring(set) => match record.get(&set.field) {
                Some(Value::String(text)) => {
                    let text = text.to_lowercase();
                    set.fragments
                        .iter()
                        .any(|fragment| text.contains(&fragment.to_lowercase()))
                }
                _ => false,
            },
            Self::Exact(exact) => {
                matches!(record.get(&exact.field), Some(Value::String(v)) if *v == exact.value)
            }
            Self::Range(range) => record
                .get(&range.field)
                .and_then(Value::as_f64)
                .is_some_and(|v| v >= range.lo && v <= range.hi),
        }
    }

    /// This clause alone as a MongoDB filter.
    fn to_document(&self) -> Document {
        match self {
            Self::Substring(set) => {
                let alternatives: Vec<Bson> = set
                    .fragments
                    .iter()
                    .map(|fragment| {
                        let pattern = format!(".*{}.*", regex::escape(fragment));
                        Bson::Document(doc! {
                            (set.field.clone()): { "$regex": pattern, "$options": "i" }
                        })
                    })
                    .collect();
                doc! { "$or": alternatives }
            }
            Self::Exact(exact) => doc! { (exact.field.clone()): exact.value.as_str() },
            Self::Range(range) => doc! {
                (range.field.clone()): { "$gte": range.lo, "$lte": range.hi }
            },
        }
    }
}

/// Conjunction of clauses. The empty query matches every record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Query {
    clauses: Vec<Clause>,
}

impl Query {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.clauses.iter().all(|clause| clause.matches(record))
    }

    /// MongoDB filter document. Clauses are merged into one flat document while their
    /// keys are distinct; if any key repeats (two `$or`s, two clauses on one field)
    /// the clauses are joined under `$and` instead.
    pub fn to_document(&self) -> Document {
        let parts: Vec<Document> = self.clauses.iter().map(Clause::to_document).collect();
        let distinct = {
            let mut keys = HashSet::new();
            parts.iter().flat_map(Document::keys).all(|key| keys.insert(key))
        };
        if distinct {
            parts.into_iter().flatten().collect()
        } else {
            let all: Vec<Bson> = parts.into_iter().map(Bson::Document).collect();
            doc! { "$and": all }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn substring_set_rejects_blank_fragments() {
        let err = SubstringSet::new("breed", ["", "  "]).unwrap_err();
        assert_eq!(err, QueryError::NoFragments("breed".to_string()));
    }

    #[test]
    fn numeric_range_rejects_inverted_or_non_finite_bounds() {
        assert!(NumericRange::new("age", 10.0, 5.0).is_err());
        assert!(NumericRange::new("age", f64::NAN, 5.0).is_err());
        assert!(NumericRange::new("age", 5.0, 5.0).is_ok());
    }

    #[test]
    fn range_is_inclusive_and_requires_numbers() {
        let clause = Clause::Range(NumericRange::new("age", 26.0, 156.0).unwrap());
        assert!(clause.matches(&record(json!({"age": 26}))));
        assert!(clause.matches(&record(json!({"age": 156.0}))));
        assert!(!clause.matches(&record(json!({"age": 156.5}))));
        assert!(!clause.matches(&record(json!({"age": "30"}))));
        assert!(!clause.matches(&record(json!({}))));
    }

    #[test]
    fn substring_matching_ignores_case() {
        let clause = Clause::Substring(SubstringSet::new("breed", ["lab", "newf"]).unwrap());
        assert!(clause.matches(&record(json!({"breed": "Labrador Retriever Mix"}))));
        assert!(clause.matches(&record(json!({"breed": "NEWFOUNDLAND"}))));
        assert!(!clause.matches(&record(json!({"breed": "Beagle"}))));
        assert!(!clause.matches(&record(json!({"breed": 7}))));
    }

    #[test]
    fn empty_query_matches_everything_and_renders_empty_document() {
        let query = Query::all();
        assert!(query.matches(&record(json!({"anything": true}))));
        assert!(query.to_document().is_empty());
    }

    #[test]
    fn document_uses_regex_alternatives_and_range_operators() {
        let query = Query::all()
            .with(Clause::Substring(
                SubstringSet::new("breed", ["old english", "a.b"]).unwrap(),
            ))
            .with(Clause::Exact(ExactMatch::new("sex_upon_outcome", "Intact Male")))
            .with(Clause::Range(
                NumericRange::new("age_upon_outcome_in_weeks", 20.0, 300.0).unwrap(),
            ));

        let expected = doc! {
            "$or": [
                { "breed": { "$regex": ".*old english.*", "$options": "i" } },
                { "breed": { "$regex": ".*a\\.b.*", "$options": "i" } },
            ],
            "sex_upon_outcome": "Intact Male",
            "age_upon_outcome_in_weeks": { "$gte": 20.0, "$lte": 300.0 },
        };
        assert_eq!(query.to_document(), expected);
    }

    #[test]
    fn repeated_keys_are_joined_under_and() {
        let query = Query::all()
            .with(Clause::Substring(SubstringSet::new("breed", ["lab"]).unwrap()))
            .with(Clause::Substring(SubstringSet::new("name", ["rex"]).unwrap()));
        let beagle_rex = record(json!({"breed": "Beagle", "name": "Rex"}));
        assert!(!query.matches(&beagle_rex));

        let document = query.to_document();
        let parts = document.get_array("$and").expect("clauses should be joined");
        assert_eq!(parts.len(), 2);
        assert_eq!(
            parts[0],
            Bson::Document(doc! { "$or": [{ "breed": { "$regex": ".*lab.*", "$options": "i" } }] })
        );
        assert_eq!(
            parts[1],
            Bson::Document(doc! { "$or": [{ "name": { "$regex": ".*rex.*", "$options": "i" } }] })
        );
    }

    #[test]
    fn conflicting_exact_clauses_keep_both_conditions() {
        let query = Query::all()
            .with(Clause::Exact(ExactMatch::new("sex_upon_outcome", "Intact Male")))
            .with(Clause::Exact(ExactMatch::new("sex_upon_outcome", "Intact Female")));
        assert!(!query.matches(&record(json!({"sex_upon_outcome": "Intact Female"}))));
        assert_eq!(
            query.to_document(),
            doc! { "$and": [
                { "sex_upon_outcome": "Intact Male" },
                { "sex_upon_outcome": "Intact Female" },
            ] }
        );
    }
}
