use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use super::{DocumentStore, EntityId, JsonDocument, StoreError};

/// In-memory document store. Preserves insertion order per collection
/// and counts operations so tests can assert that a request never
/// touched the store at all, or never performed a write.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<(EntityId, JsonDocument)>>>,
    ops: AtomicU64,
    writes: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total store operations issued (reads and writes).
    pub fn ops(&self) -> u64 {
        self.ops.load(Ordering::SeqCst)
    }

    /// Mutating operations issued (insert, update, delete).
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.ops.fetch_add(1, Ordering::SeqCst);
    }

    fn touch_write(&self) {
        self.touch();
        self.writes.fetch_add(1, Ordering::SeqCst);
    }

    fn with_id(id: EntityId, doc: &JsonDocument) -> JsonDocument {
        let mut out = doc.clone();
        out.insert("id".to_string(), Value::String(id.to_hex()));
        out
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_all(&self, collection: &str) -> Result<Vec<JsonDocument>, StoreError> {
        self.touch();
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().map(|(id, d)| Self::with_id(*id, d)).collect())
            .unwrap_or_default())
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: EntityId,
    ) -> Result<Option<JsonDocument>, StoreError> {
        self.touch();
        let collections = self.collections.read().await;
        Ok(collections.get(collection).and_then(|docs| {
            docs.iter()
                .find(|(doc_id, _)| *doc_id == id)
                .map(|(doc_id, d)| Self::with_id(*doc_id, d))
        }))
    }

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
        exclude: Option<EntityId>,
    ) -> Result<Option<JsonDocument>, StoreError> {
        self.touch();
        let collections = self.collections.read().await;
        Ok(collections.get(collection).and_then(|docs| {
            docs.iter()
                .filter(|(doc_id, _)| exclude != Some(*doc_id))
                .find(|(_, d)| d.get(field) == Some(value))
                .map(|(doc_id, d)| Self::with_id(*doc_id, d))
        }))
    }

    async fn insert_one(
        &self,
        collection: &str,
        document: JsonDocument,
    ) -> Result<EntityId, StoreError> {
        self.touch_write();
        let id = EntityId::generate();
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push((id, document));
        Ok(id)
    }

    async fn update_one(
        &self,
        collection: &str,
        id: EntityId,
        fields: JsonDocument,
    ) -> Result<bool, StoreError> {
        self.touch_write();
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(false);
        };
        match docs.iter_mut().find(|(doc_id, _)| *doc_id == id) {
            Some((_, doc)) => {
                for (key, value) in fields {
                    doc.insert(key, value);
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_one(&self, collection: &str, id: EntityId) -> Result<bool, StoreError> {
        self.touch_write();
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|(doc_id, _)| *doc_id != id);
        Ok(docs.len() < before)
    }

    async fn count_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<u64, StoreError> {
        self.touch();
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().filter(|(_, d)| d.get(field) == Some(value)).count() as u64)
            .unwrap_or(0))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> JsonDocument {
        value.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn insert_then_find_by_id() {
        let store = MemoryStore::new();
        let id = store
            .insert_one("contacts", doc(json!({ "firstName": "Ada" })))
            .await
            .unwrap();

        let found = store.find_by_id("contacts", id).await.unwrap().unwrap();
        assert_eq!(found.get("firstName"), Some(&json!("Ada")));
        assert_eq!(found.get("id"), Some(&json!(id.to_hex())));
    }

    #[tokio::test]
    async fn update_merges_fields() {
        let store = MemoryStore::new();
        let id = store
            .insert_one("contacts", doc(json!({ "firstName": "Ada", "lastName": "Lovelace" })))
            .await
            .unwrap();

        let matched = store
            .update_one("contacts", id, doc(json!({ "firstName": "Grace" })))
            .await
            .unwrap();
        assert!(matched);

        let found = store.find_by_id("contacts", id).await.unwrap().unwrap();
        assert_eq!(found.get("firstName"), Some(&json!("Grace")));
        // untouched field survives the merge
        assert_eq!(found.get("lastName"), Some(&json!("Lovelace")));
    }

    #[tokio::test]
    async fn delete_and_count() {
        let store = MemoryStore::new();
        let id = store
            .insert_one("recipes", doc(json!({ "authorId": "abc" })))
            .await
            .unwrap();

        let n = store
            .count_by_field("recipes", "authorId", &json!("abc"))
            .await
            .unwrap();
        assert_eq!(n, 1);

        assert!(store.delete_one("recipes", id).await.unwrap());
        assert!(!store.delete_one("recipes", id).await.unwrap());
    }

    #[tokio::test]
    async fn operation_counters_track_reads_and_writes() {
        let store = MemoryStore::new();
        assert_eq!(store.ops(), 0);

        store.find_all("users").await.unwrap();
        assert_eq!(store.ops(), 1);
        assert_eq!(store.writes(), 0);

        store.insert_one("users", JsonDocument::new()).await.unwrap();
        assert_eq!(store.ops(), 2);
        assert_eq!(store.writes(), 1);
    }
}
