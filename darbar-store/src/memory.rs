use async_trait::async_trait;
use chrono::Utc;
use darbar_core::storage::{object_name_from_url, object_path, public_url, FileUpload, ObjectStore, StoredObject};
use darbar_core::store::{ensure_document_id, merge_fields, Document, DocumentStore};
use darbar_core::{CoreError, CoreResult};
use dashmap::DashMap;
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// In-process document store for tests and local development.
///
/// One ordered map per collection path; DashMap shards the collections.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: DashMap<String, BTreeMap<String, Value>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot(&self, collection: &str) -> Vec<Document> {
        self.collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| Document::new(id.clone(), data.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> CoreResult<Option<Document>> {
        Ok(self
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id).map(|data| Document::new(id, data.clone()))))
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> CoreResult<()> {
        ensure_document_id(id)?;
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), data);
        Ok(())
    }

    async fn merge(&self, collection: &str, id: &str, patch: Value) -> CoreResult<()> {
        let mut docs = self
            .collections
            .get_mut(collection)
            .ok_or_else(|| CoreError::NotFound(format!("Document {}/{}", collection, id)))?;
        let doc = docs
            .get_mut(id)
            .ok_or_else(|| CoreError::NotFound(format!("Document {}/{}", collection, id)))?;
        merge_fields(doc, patch)
    }

    async fn add(&self, collection: &str, data: Value) -> CoreResult<String> {
        let id = Uuid::new_v4().simple().to_string();
        self.set(collection, &id, data).await?;
        Ok(id)
    }

    async fn delete(&self, collection: &str, id: &str) -> CoreResult<bool> {
        Ok(self
            .collections
            .get_mut(collection)
            .map(|mut docs| docs.remove(id).is_some())
            .unwrap_or(false))
    }

    async fn list(&self, collection: &str) -> CoreResult<Vec<Document>> {
        Ok(self.snapshot(collection))
    }

    async fn list_where(&self, collection: &str, field: &str, value: Value) -> CoreResult<Vec<Document>> {
        Ok(self
            .snapshot(collection)
            .into_iter()
            .filter(|doc| doc.data.get(field) == Some(&value))
            .collect())
    }
}

/// In-process object storage; keeps object names and content types only.
pub struct MemoryObjectStore {
    base_url: String,
    bucket: String,
    objects: DashMap<String, String>,
}

impl MemoryObjectStore {
    pub fn new(base_url: &str, bucket: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            bucket: bucket.to_string(),
            objects: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn contains_url(&self, url: &str) -> bool {
        self.content_type(url).is_some()
    }

    pub fn content_type(&self, url: &str) -> Option<String> {
        let name = object_name_from_url(&self.base_url, &self.bucket, url)?;
        self.objects.get(&name).map(|entry| entry.value().clone())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(&self, directory: &str, file: &FileUpload) -> CoreResult<String> {
        let mut path = object_path(directory, &file.file_name, Utc::now().timestamp_millis());
        // Same name within the same millisecond
        while self.objects.contains_key(&path) {
            path = format!("{}-{}", path, Uuid::new_v4().simple());
        }
        self.objects.insert(path.clone(), file.content_type.clone());
        Ok(public_url(&self.base_url, &self.bucket, &path))
    }

    async fn delete(&self, url: &str) -> CoreResult<()> {
        let name = object_name_from_url(&self.base_url, &self.bucket, url)
            .ok_or_else(|| CoreError::ValidationError(format!("Not a storage URL: {}", url)))?;
        self.objects
            .remove(&name)
            .map(|_| ())
            .ok_or_else(|| CoreError::NotFound(format!("Object {}", name)))
    }

    async fn list(&self, prefix: &str) -> CoreResult<Vec<StoredObject>> {
        let mut objects: Vec<StoredObject> = self
            .objects
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| StoredObject {
                url: public_url(&self.base_url, &self.bucket, entry.key()),
                name: entry.key().clone(),
            })
            .collect();
        objects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(objects)
    }

    async fn delete_all(&self) -> CoreResult<usize> {
        let removed = self.objects.len();
        self.objects.clear();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_document_round_trip() {
        let store = MemoryDocumentStore::new();
        store.set("category/Mains/dishes", "d1", json!({"name": "Korma"})).await.unwrap();

        let doc = store.get("category/Mains/dishes", "d1").await.unwrap().unwrap();
        assert_eq!(doc.data["name"], "Korma");
        assert!(store.get("category/Desserts/dishes", "d1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_merge_requires_existing_document() {
        let store = MemoryDocumentStore::new();
        let err = store.merge("users", "ghost", json!({"rewards": 1})).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));

        store.set("users", "u1", json!({"rewards": 1, "role": "user"})).await.unwrap();
        store.merge("users", "u1", json!({"rewards": 5})).await.unwrap();
        let doc = store.get("users", "u1").await.unwrap().unwrap();
        assert_eq!(doc.data, json!({"rewards": 5, "role": "user"}));
    }

    #[tokio::test]
    async fn test_list_where() {
        let store = MemoryDocumentStore::new();
        store.add("orders", json!({"userId": "u1"})).await.unwrap();
        store.add("orders", json!({"userId": "u2"})).await.unwrap();
        store.add("orders", json!({"userId": "u1"})).await.unwrap();

        assert_eq!(store.list("orders").await.unwrap().len(), 3);
        assert_eq!(store.list_where("orders", "userId", json!("u1")).await.unwrap().len(), 2);
        assert!(!store.delete("orders", "nope").await.unwrap());
    }

    #[tokio::test]
    async fn test_object_store() {
        let store = MemoryObjectStore::new("https://storage.example.com", "bucket");
        let file = FileUpload {
            file_name: "front.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: vec![1, 2, 3],
        };
        let url = store.upload("locations", &file).await.unwrap();
        assert!(url.starts_with("https://storage.example.com/bucket/locations/"));
        assert_eq!(store.content_type(&url).as_deref(), Some("image/jpeg"));
        assert_eq!(store.list("locations/").await.unwrap().len(), 1);
        assert!(store.list("images/").await.unwrap().is_empty());

        store.delete(&url).await.unwrap();
        assert!(store.is_empty());
        assert!(store.delete(&url).await.is_err());
    }
}
