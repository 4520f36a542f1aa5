use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{CoreError, CoreResult};

/// A raw document as held by the document database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Self { id: id.into(), data }
    }

    /// Decode the document body into a typed record.
    pub fn decode<T: DeserializeOwned>(&self) -> CoreResult<Stored<T>> {
        let value = serde_json::from_value(self.data.clone())?;
        Ok(Stored {
            id: self.id.clone(),
            value,
        })
    }
}

/// A typed record together with the id it is stored under.
#[derive(Debug, Clone, PartialEq)]
pub struct Stored<T> {
    pub id: String,
    pub value: T,
}

/// Capability set of the hosted document database.
///
/// Collections are addressed by slash-separated paths so sub-collections
/// (`users/{uid}/cart`) need no special support.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> CoreResult<Option<Document>>;

    /// Create or fully replace a document.
    async fn set(&self, collection: &str, id: &str, data: Value) -> CoreResult<()>;

    /// Shallow-merge top-level fields into an existing document.
    /// Fails with `NotFound` when the document does not exist.
    async fn merge(&self, collection: &str, id: &str, patch: Value) -> CoreResult<()>;

    /// Insert a document under a generated id and return that id.
    async fn add(&self, collection: &str, data: Value) -> CoreResult<String>;

    /// Returns whether a document was removed.
    async fn delete(&self, collection: &str, id: &str) -> CoreResult<bool>;

    /// All documents of a collection ordered by id.
    async fn list(&self, collection: &str) -> CoreResult<Vec<Document>>;

    /// Documents whose top-level `field` equals `value`, ordered by id.
    async fn list_where(&self, collection: &str, field: &str, value: Value) -> CoreResult<Vec<Document>>;
}

pub fn collection_path(parts: &[&str]) -> String {
    parts.join("/")
}

/// Reject ids that would escape their collection path.
pub fn ensure_document_id(id: &str) -> CoreResult<()> {
    if id.trim().is_empty() || id.contains('/') {
        return Err(CoreError::ValidationError(format!("Invalid document id: {:?}", id)));
    }
    Ok(())
}

/// Shallow merge used by store implementations for `merge`.
pub fn merge_fields(target: &mut Value, patch: Value) -> CoreResult<()> {
    let patch = match patch {
        Value::Object(map) => map,
        _ => return Err(CoreError::ValidationError("Update payload must be an object".to_string())),
    };

    match target {
        Value::Object(existing) => {
            for (key, value) in patch {
                existing.insert(key, value);
            }
            Ok(())
        }
        _ => Err(CoreError::StoreError("Stored document is not an object".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_fields_overwrites_top_level_keys() {
        let mut doc = json!({"name": "Biryani", "price": 12.0, "available": true});
        merge_fields(&mut doc, json!({"price": 14.5, "discount": 10})).unwrap();
        assert_eq!(doc, json!({"name": "Biryani", "price": 14.5, "available": true, "discount": 10}));
    }

    #[test]
    fn test_merge_rejects_non_object_patch() {
        let mut doc = json!({"name": "Biryani"});
        assert!(merge_fields(&mut doc, json!([1, 2])).is_err());
    }

    #[test]
    fn test_document_id_rules() {
        assert!(ensure_document_id("SUMMER21").is_ok());
        assert!(ensure_document_id("").is_err());
        assert!(ensure_document_id("a/b").is_err());
    }

    #[test]
    fn test_decode_keeps_id() {
        #[derive(Deserialize)]
        struct Named {
            name: String,
        }

        let doc = Document::new("42", json!({"name": "Naan"}));
        let stored = doc.decode::<Named>().unwrap();
        assert_eq!(stored.id, "42");
        assert_eq!(stored.value.name, "Naan");
    }
}
