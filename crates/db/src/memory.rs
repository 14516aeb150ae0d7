//! In-process document store backed by a lock-guarded map of collections.

use std::{collections::HashMap, path::Path};

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::{
    document::RecordId,
    query::{project, Filter, Sort},
    store::{DocumentStore, StoreError},
};

/// Documents are kept per collection in insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate the store from a JSON file mapping collection names to arrays
    /// of documents. Returns the number of documents loaded.
    pub async fn load_seed(&self, path: &Path) -> anyhow::Result<usize> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read seed file {}", path.display()))?;
        let seed: HashMap<String, Vec<Value>> = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse seed file {}", path.display()))?;

        let mut loaded = 0;
        for (collection, documents) in seed {
            for document in documents {
                let id = document
                    .get("id")
                    .and_then(Value::as_str)
                    .map(RecordId::from)
                    .ok_or_else(|| anyhow!("seed document in '{collection}' has no string id"))?;
                self.save(&collection, &id, document).await?;
                loaded += 1;
            }
            tracing::debug!(target: "library-db", %collection, "seed collection loaded");
        }

        tracing::info!(target: "library-db", documents = loaded, "seed data loaded");
        Ok(loaded)
    }
}

fn has_id(document: &Value, id: &RecordId) -> bool {
    document.get("id").and_then(Value::as_str) == Some(id.as_str())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_all(
        &self,
        collection: &str,
        filter: &Filter,
        sort: Option<&Sort>,
        projection: Option<&[&str]>,
    ) -> Result<Vec<Value>, StoreError> {
        let collections = self.collections.read().await;
        let mut found: Vec<Value> = collections
            .get(collection)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|document| filter.matches(document))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        drop(collections);

        if let Some(sort) = sort {
            found.sort_by(|left, right| sort.compare(left, right));
        }
        if let Some(fields) = projection {
            found = found
                .into_iter()
                .map(|document| project(document, fields))
                .collect();
        }
        Ok(found)
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: &RecordId,
    ) -> Result<Option<Value>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|documents| documents.iter().find(|document| has_id(document, id)))
            .cloned())
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<Value>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|documents| documents.iter().find(|document| filter.matches(document)))
            .cloned())
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        let collections = self.collections.read().await;
        let count = collections
            .get(collection)
            .map(|documents| documents.iter().filter(|d| filter.matches(d)).count())
            .unwrap_or(0);
        Ok(count as u64)
    }

    async fn save(
        &self,
        collection: &str,
        id: &RecordId,
        document: Value,
    ) -> Result<(), StoreError> {
        if !document.is_object() {
            return Err(StoreError::backend(collection, "documents must be JSON objects"));
        }

        let mut collections = self.collections.write().await;
        let documents = collections.entry(collection.to_string()).or_default();
        match documents.iter_mut().find(|existing| has_id(existing, id)) {
            Some(existing) => *existing = document,
            None => documents.push(document),
        }
        Ok(())
    }

    async fn remove_by_id(&self, collection: &str, id: &RecordId) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(documents) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let before = documents.len();
        documents.retain(|document| !has_id(document, id));
        Ok(documents.len() != before)
    }
}
