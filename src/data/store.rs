//! Document store seam. `MongoStore` talks to the shelter database; `MemoryStore` keeps
//! documents in process and evaluates [`Query`] itself.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{self, doc, Bson, Document};
use mongodb::options::FindOptions;
use mongodb::{Client, Collection};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use super::query::Query;
use super::{Record, FIELD_ID};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store connection failed: {0}")]
    Connection(String),
    #[error("store query failed: {0}")]
    Query(String),
    #[error("store write failed: {0}")]
    Write(String),
    #[error("document conversion failed: {0}")]
    Conversion(String),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        StoreError::Query(err.to_string())
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Human-readable location, used in logs.
    fn describe(&self) -> String;

    async fn ping(&self) -> Result<(), StoreError>;

    /// Documents matching `query`; `limit == 0` means unbounded.
    async fn find(&self, query: &Query, limit: usize) -> Result<Vec<Record>, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;

    /// Remove the whole collection.
    async fn drop_all(&self) -> Result<(), StoreError>;

    async fn insert_many(&self, records: Vec<Record>) -> Result<usize, StoreError>;

    /// Release the underlying handle. Further calls may fail.
    async fn close(&self) {}
}

pub struct MongoStore {
    client: Client,
    collection: Collection<Document>,
    location: String,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str, collection: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|err| StoreError::Connection(err.to_string()))?;
        let collection = client.database(database).collection::<Document>(collection);
        Ok(Self {
            location: format!("{uri} [{database}.{}]", collection.name()),
            client,
            collection,
        })
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    fn describe(&self) -> String {
        self.location.clone()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|err| StoreError::Connection(err.to_string()))?;
        Ok(())
    }

    async fn find(&self, query: &Query, limit: usize) -> Result<Vec<Record>, StoreError> {
        let mut options = FindOptions::default();
        if limit > 0 {
            options.limit = Some(i64::try_from(limit).unwrap_or(i64::MAX));
        }
        let filter = query.to_document();
        debug!(%filter, limit, "mongo find");
        let cursor = self.collection.find(filter, options).await?;
        let documents: Vec<Document> = cursor.try_collect().await?;
        documents.into_iter().map(document_to_record).collect()
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.collection.count_documents(doc! {}, None).await?)
    }

    async fn drop_all(&self) -> Result<(), StoreError> {
        self.collection
            .drop(None)
            .await
            .map_err(|err| StoreError::Write(err.to_string()))
    }

    async fn insert_many(&self, records: Vec<Record>) -> Result<usize, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }
        let documents = records
            .iter()
            .map(|record| {
                bson::to_document(record).map_err(|err| StoreError::Conversion(err.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let result = self
            .collection
            .insert_many(documents, None)
            .await
            .map_err(|err| StoreError::Write(err.to_string()))?;
        Ok(result.inserted_ids.len())
    }

    async fn close(&self) {
        info!(store = %self.location, "closing mongo client");
        self.client.clone().shutdown().await;
    }
}

fn document_to_record(document: Document) -> Result<Record, StoreError> {
    match Bson::Document(document).into_relaxed_extjson() {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Conversion(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

/// In-process store. Assigns an `_id` on insert the way a document database would.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<Record>>,
    next_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<Record>) -> Self {
        let store = Self::new();
        store.push_all(records);
        store
    }

    fn push_all(&self, records: Vec<Record>) -> usize {
        let mut guard = self.records.write().unwrap_or_else(|e| e.into_inner());
        let inserted = records.len();
        for mut record in records {
            if !record.contains_key(FIELD_ID) {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                record.insert(FIELD_ID.to_string(), Value::String(format!("mem-{id}")));
            }
            guard.push(record);
        }
        inserted
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn find(&self, query: &Query, limit: usize) -> Result<Vec<Record>, StoreError> {
        let guard = self.records.read().unwrap_or_else(|e| e.into_inner());
        let matching = guard.iter().filter(|record| query.matches(record)).cloned();
        Ok(if limit == 0 {
            matching.collect()
        } else {
            matching.take(limit).collect()
        })
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let guard = self.records.read().unwrap_or_else(|e| e.into_inner());
        Ok(guard.len() as u64)
    }

    async fn drop_all(&self) -> Result<(), StoreError> {
        self.records
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        Ok(())
    }

    async fn insert_many(&self, records: Vec<Record>) -> Result<usize, StoreError> {
        Ok(self.push_all(records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extjson_conversion_keeps_plain_fields() {
        let document = doc! { "_id": bson::oid::ObjectId::new(), "name": "Rex", "age": 30.5 };
        let record = document_to_record(document).unwrap();
        assert_eq!(record["name"], json!("Rex"));
        assert_eq!(record["age"], json!(30.5));
        assert!(record[FIELD_ID].get("$oid").is_some());
    }

    #[tokio::test]
    async fn memory_store_assigns_ids_and_honours_limit() {
        let store = MemoryStore::new();
        let records = (0..5)
            .map(|i| json!({ "n": i }).as_object().cloned().unwrap())
            .collect();
        assert_eq!(store.insert_many(records).await.unwrap(), 5);

        let all = store.find(&Query::all(), 0).await.unwrap();
        assert_eq!(all.len(), 5);
        assert!(all.iter().all(|r| r.contains_key(FIELD_ID)));
        assert_eq!(store.find(&Query::all(), 2).await.unwrap().len(), 2);

        store.drop_all().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
