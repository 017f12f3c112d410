pub mod id;
pub mod memory;
pub mod mongo;
pub mod repository;

pub use id::{EntityId, InvalidIdentifier};
pub use repository::Repository;

use async_trait::async_trait;
use serde_json::{Map, Value};

/// A stored document as a JSON object. Documents coming back out of the
/// store carry an `id` field holding the hex identifier; documents going
/// in never do (the store assigns the identifier).
pub type JsonDocument = Map<String, Value>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store operation timed out after {0}ms")]
    Timeout(u64),

    #[error("store query failed: {0}")]
    Query(String),
}

/// Collection-oriented document store. The one seam between the CRUD
/// core and whatever backend holds the data; `MongoStore` implements it
/// for production and `MemoryStore` backs the tests.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Unfiltered scan of a collection, in store order.
    async fn find_all(&self, collection: &str) -> Result<Vec<JsonDocument>, StoreError>;

    async fn find_by_id(
        &self,
        collection: &str,
        id: EntityId,
    ) -> Result<Option<JsonDocument>, StoreError>;

    /// Exact-match lookup on a single field, optionally excluding one
    /// document (used for uniqueness checks during replace).
    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
        exclude: Option<EntityId>,
    ) -> Result<Option<JsonDocument>, StoreError>;

    /// Insert a document and return the assigned identifier.
    async fn insert_one(
        &self,
        collection: &str,
        document: JsonDocument,
    ) -> Result<EntityId, StoreError>;

    /// Merge the given fields into the matched document ($set semantics,
    /// field-level merge). Returns false when no document matched.
    async fn update_one(
        &self,
        collection: &str,
        id: EntityId,
        fields: JsonDocument,
    ) -> Result<bool, StoreError>;

    /// Returns false when no document matched.
    async fn delete_one(&self, collection: &str, id: EntityId) -> Result<bool, StoreError>;

    async fn count_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<u64, StoreError>;

    /// Connectivity probe for the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}
