use std::sync::Arc;

use tracing::{error, info};

use super::query::Query;
use super::store::{DocumentStore, StoreError};
use super::Record;

/// Read-only repository over the shelter outcomes collection.
///
/// Construction pings the store and fails hard; reads never fail and degrade to an
/// empty result, logging the store error instead.
#[derive(Clone)]
pub struct AnimalShelter {
    store: Arc<dyn DocumentStore>,
}

impl AnimalShelter {
    pub async fn connect(store: Arc<dyn DocumentStore>) -> Result<Self, StoreError> {
        if let Err(err) = store.ping().await {
            error!(store = %store.describe(), "error connecting to store: {err}");
            return Err(err);
        }
        info!(store = %store.describe(), "connected to shelter store");
        Ok(Self { store })
    }

    /// Records matching `query`, at most `limit` of them (`0` = no cap).
    pub async fn read(&self, query: &Query, limit: usize) -> Vec<Record> {
        match self.store.find(query, limit).await {
            Ok(records) => records,
            Err(err) => {
                error!(store = %self.store.describe(), "error reading from store: {err}");
                Vec::new()
            }
        }
    }

    pub async fn count(&self) -> Result<u64, StoreError> {
        self.store.count().await
    }

    pub async fn sample(&self) -> Option<Record> {
        self.read(&Query::all(), 1).await.into_iter().next()
    }

    pub async fn close(self) {
        self.store.close().await;
    }
}
