use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use std::sync::Arc;

use super::{DocumentStore, EntityId, JsonDocument, StoreError};

/// Generic CRUD surface over one named collection. The repository owns
/// the `createdAt`/`updatedAt` timestamps; payloads reaching it have
/// already been validated and never carry either field.
pub struct Repository {
    store: Arc<dyn DocumentStore>,
    collection: &'static str,
}

fn now_stamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl Repository {
    pub fn new(store: Arc<dyn DocumentStore>, collection: &'static str) -> Self {
        Self { store, collection }
    }

    pub async fn list(&self) -> Result<Vec<JsonDocument>, StoreError> {
        self.store.find_all(self.collection).await
    }

    pub async fn get_by_id(&self, id: EntityId) -> Result<Option<JsonDocument>, StoreError> {
        self.store.find_by_id(self.collection, id).await
    }

    pub async fn exists(&self, id: EntityId) -> Result<bool, StoreError> {
        Ok(self.get_by_id(id).await?.is_some())
    }

    /// Insert a validated document, stamping both timestamps.
    pub async fn insert(&self, mut value: JsonDocument) -> Result<EntityId, StoreError> {
        let now = now_stamp();
        value.insert("createdAt".to_string(), Value::String(now.clone()));
        value.insert("updatedAt".to_string(), Value::String(now));
        self.store.insert_one(self.collection, value).await
    }

    /// Full-document replace with a validated payload. Stamps
    /// `updatedAt` and never touches `createdAt` (the write is a
    /// field-level merge, so undeclared fields are left alone).
    /// Returns false when no document matched the identifier.
    pub async fn replace(&self, id: EntityId, mut value: JsonDocument) -> Result<bool, StoreError> {
        value.insert("updatedAt".to_string(), Value::String(now_stamp()));
        self.store.update_one(self.collection, id, value).await
    }

    /// Returns false when no document matched the identifier.
    pub async fn delete(&self, id: EntityId) -> Result<bool, StoreError> {
        self.store.delete_one(self.collection, id).await
    }

    /// Count documents whose `field` holds the given identifier, in its
    /// external hex form. Used by delete-guards.
    pub async fn count_referencing(&self, field: &str, id: EntityId) -> Result<u64, StoreError> {
        self.store
            .count_by_field(self.collection, field, &Value::String(id.to_hex()))
            .await
    }

    /// Uniqueness pre-write lookup, optionally excluding the document
    /// being replaced.
    pub async fn find_by_unique_field(
        &self,
        field: &str,
        value: &Value,
        exclude: Option<EntityId>,
    ) -> Result<Option<JsonDocument>, StoreError> {
        self.store
            .find_by_field(self.collection, field, value, exclude)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use serde_json::json;

    fn doc(value: Value) -> JsonDocument {
        value.as_object().unwrap().clone()
    }

    fn repo(store: &Arc<MemoryStore>, collection: &'static str) -> Repository {
        Repository::new(store.clone() as Arc<dyn DocumentStore>, collection)
    }

    #[tokio::test]
    async fn insert_stamps_both_timestamps() {
        let store = Arc::new(MemoryStore::new());
        let users = repo(&store, "users");

        let id = users.insert(doc(json!({ "email": "a@b.com" }))).await.unwrap();
        let user = users.get_by_id(id).await.unwrap().unwrap();

        let created = user.get("createdAt").and_then(Value::as_str).unwrap();
        let updated = user.get("updatedAt").and_then(Value::as_str).unwrap();
        assert_eq!(created, updated);
        chrono::DateTime::parse_from_rfc3339(created).unwrap();
    }

    #[tokio::test]
    async fn replace_advances_updated_at_only() {
        let store = Arc::new(MemoryStore::new());
        let users = repo(&store, "users");

        let id = users.insert(doc(json!({ "email": "a@b.com" }))).await.unwrap();
        let before = users.get_by_id(id).await.unwrap().unwrap();

        let matched = users
            .replace(id, doc(json!({ "email": "c@d.com" })))
            .await
            .unwrap();
        assert!(matched);

        let after = users.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(after.get("createdAt"), before.get("createdAt"));
        assert!(
            after.get("updatedAt").and_then(Value::as_str).unwrap()
                > before.get("createdAt").and_then(Value::as_str).unwrap()
        );
        assert_eq!(after.get("email"), Some(&json!("c@d.com")));
    }

    #[tokio::test]
    async fn replace_unknown_id_reports_no_match() {
        let store = Arc::new(MemoryStore::new());
        let users = repo(&store, "users");
        let matched = users
            .replace(EntityId::generate(), doc(json!({ "email": "a@b.com" })))
            .await
            .unwrap();
        assert!(!matched);
    }

    #[tokio::test]
    async fn count_referencing_matches_hex_form() {
        let store = Arc::new(MemoryStore::new());
        let users = repo(&store, "users");
        let recipes = repo(&store, "recipes");

        let author = users.insert(doc(json!({ "email": "a@b.com" }))).await.unwrap();
        recipes
            .insert(doc(json!({ "title": "Soup", "authorId": author.to_hex() })))
            .await
            .unwrap();

        assert_eq!(recipes.count_referencing("authorId", author).await.unwrap(), 1);
        assert_eq!(
            recipes
                .count_referencing("authorId", EntityId::generate())
                .await
                .unwrap(),
            0
        );
    }
}
