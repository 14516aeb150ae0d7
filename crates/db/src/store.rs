use std::{marker::PhantomData, sync::Arc};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::{
    document::{Document, RecordId},
    query::{Filter, Sort},
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend failed on '{collection}': {message}")]
    Backend { collection: String, message: String },

    #[error("document serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn backend(collection: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            collection: collection.into(),
            message: message.into(),
        }
    }
}

/// Contract of the persistence collaborator.
///
/// Documents are JSON objects with an `id` key. Errors are opaque to callers.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_all(
        &self,
        collection: &str,
        filter: &Filter,
        sort: Option<&Sort>,
        projection: Option<&[&str]>,
    ) -> Result<Vec<Value>, StoreError>;

    async fn find_by_id(&self, collection: &str, id: &RecordId)
        -> Result<Option<Value>, StoreError>;

    async fn find_one(&self, collection: &str, filter: &Filter)
        -> Result<Option<Value>, StoreError>;

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError>;

    /// Insert or replace the document stored under `id`.
    async fn save(&self, collection: &str, id: &RecordId, document: Value)
        -> Result<(), StoreError>;

    /// Returns whether a document was removed.
    async fn remove_by_id(&self, collection: &str, id: &RecordId) -> Result<bool, StoreError>;
}

/// Typed view over one collection of a [`DocumentStore`].
pub struct Collection<T> {
    store: Arc<dyn DocumentStore>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _marker: PhantomData,
        }
    }
}

impl<T: Document> Collection<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    pub async fn find_all(&self, filter: &Filter, sort: Option<&Sort>) -> Result<Vec<T>, StoreError> {
        let documents = self
            .store
            .find_all(T::COLLECTION, filter, sort, None)
            .await?;
        decode_all(documents)
    }

    /// Fetch a subset of fields, decoded into a narrower type `P`.
    pub async fn find_projected<P: DeserializeOwned>(
        &self,
        filter: &Filter,
        sort: Option<&Sort>,
        fields: &[&str],
    ) -> Result<Vec<P>, StoreError> {
        let documents = self
            .store
            .find_all(T::COLLECTION, filter, sort, Some(fields))
            .await?;
        decode_all(documents)
    }

    pub async fn find_by_id(&self, id: &RecordId) -> Result<Option<T>, StoreError> {
        self.store
            .find_by_id(T::COLLECTION, id)
            .await?
            .map(serde_json::from_value)
            .transpose()
            .map_err(StoreError::from)
    }

    pub async fn find_one(&self, filter: &Filter) -> Result<Option<T>, StoreError> {
        self.store
            .find_one(T::COLLECTION, filter)
            .await?
            .map(serde_json::from_value)
            .transpose()
            .map_err(StoreError::from)
    }

    pub async fn count(&self, filter: &Filter) -> Result<u64, StoreError> {
        self.store.count(T::COLLECTION, filter).await
    }

    pub async fn save(&self, record: &T) -> Result<(), StoreError> {
        let document = serde_json::to_value(record)?;
        self.store.save(T::COLLECTION, record.id(), document).await
    }

    pub async fn remove_by_id(&self, id: &RecordId) -> Result<bool, StoreError> {
        self.store.remove_by_id(T::COLLECTION, id).await
    }
}

fn decode_all<P: DeserializeOwned>(documents: Vec<Value>) -> Result<Vec<P>, StoreError> {
    documents
        .into_iter()
        .map(|document| serde_json::from_value(document).map_err(StoreError::from))
        .collect()
}
