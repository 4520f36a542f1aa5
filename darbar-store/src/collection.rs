use darbar_core::store::{DocumentStore, Stored};
use darbar_core::CoreResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

/// Typed view over one collection path of a `DocumentStore`.
pub struct Collection<T> {
    store: Arc<dyn DocumentStore>,
    path: String,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            path: self.path.clone(),
            _record: PhantomData,
        }
    }
}

impl<T: Serialize + DeserializeOwned> Collection<T> {
    pub fn new(store: Arc<dyn DocumentStore>, path: impl Into<String>) -> Self {
        Self {
            store,
            path: path.into(),
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub async fn get(&self, id: &str) -> CoreResult<Option<T>> {
        match self.store.get(&self.path, id).await? {
            Some(doc) => Ok(Some(doc.decode::<T>()?.value)),
            None => Ok(None),
        }
    }

    pub async fn exists(&self, id: &str) -> CoreResult<bool> {
        Ok(self.store.get(&self.path, id).await?.is_some())
    }

    pub async fn put(&self, id: &str, record: &T) -> CoreResult<()> {
        self.store.set(&self.path, id, serde_json::to_value(record)?).await
    }

    pub async fn insert(&self, record: &T) -> CoreResult<String> {
        self.store.add(&self.path, serde_json::to_value(record)?).await
    }

    /// Shallow-merge raw fields into an existing record.
    pub async fn patch(&self, id: &str, fields: Value) -> CoreResult<()> {
        self.store.merge(&self.path, id, fields).await
    }

    pub async fn delete(&self, id: &str) -> CoreResult<bool> {
        self.store.delete(&self.path, id).await
    }

    pub async fn list(&self) -> CoreResult<Vec<Stored<T>>> {
        self.store
            .list(&self.path)
            .await?
            .iter()
            .map(|doc| doc.decode())
            .collect()
    }

    pub async fn list_where(&self, field: &str, value: Value) -> CoreResult<Vec<Stored<T>>> {
        self.store
            .list_where(&self.path, field, value)
            .await?
            .iter()
            .map(|doc| doc.decode())
            .collect()
    }

    /// Delete every record, returning the removed records.
    pub async fn clear(&self) -> CoreResult<Vec<Stored<T>>> {
        let records = self.list().await?;
        for record in &records {
            self.store.delete(&self.path, &record.id).await?;
        }
        Ok(records)
    }
}
