use async_trait::async_trait;
use bson::{doc, Bson, Document};
use futures::TryStreamExt;
use mongodb::options::IndexOptions;
use mongodb::{Client, Database, IndexModel};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::{error, info};

use super::{DocumentStore, EntityId, JsonDocument, StoreError};

/// MongoDB-backed document store. Every operation runs under an
/// explicit per-call deadline instead of inheriting whatever the driver
/// defaults to.
pub struct MongoStore {
    db: Database,
    op_timeout: Duration,
}

impl MongoStore {
    /// Connect and verify the connection with a ping. A failure here is
    /// meant to be fatal at startup: the process should not accept
    /// traffic without a working store.
    pub async fn connect(uri: &str, db_name: &str, op_timeout_ms: u64) -> Result<Self, StoreError> {
        // Bound server selection so an unreachable store fails fast
        // instead of hanging the startup.
        let uri = if uri.contains('?') {
            format!("{uri}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000")
        } else {
            format!("{uri}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000")
        };

        let client = Client::with_uri_str(&uri).await.map_err(map_driver_error)?;
        let db = client.database(db_name);

        db.run_command(doc! { "ping": 1 })
            .await
            .map_err(map_driver_error)?;
        info!("connected to document store database '{}'", db_name);

        let store = Self {
            db,
            op_timeout: Duration::from_millis(op_timeout_ms),
        };
        store.ensure_indexes().await?;
        Ok(store)
    }

    /// Store-level uniqueness constraint on user emails. The handler
    /// layer still performs its pre-write lookup so error reporting
    /// stays uniform, but the index closes the check-then-act window.
    async fn ensure_indexes(&self) -> Result<(), StoreError> {
        let model = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.db
            .collection::<Document>("users")
            .create_index(model)
            .await
            .map_err(map_driver_error)?;
        Ok(())
    }

    fn collection(&self, name: &str) -> mongodb::Collection<Document> {
        self.db.collection::<Document>(name)
    }

    async fn timed<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.op_timeout.as_millis() as u64)),
        }
    }
}

fn map_driver_error(e: mongodb::error::Error) -> StoreError {
    use mongodb::error::ErrorKind;
    match *e.kind {
        ErrorKind::ServerSelection { .. } | ErrorKind::Io(_) => {
            StoreError::Unavailable(e.to_string())
        }
        _ => StoreError::Query(e.to_string()),
    }
}

fn to_document(value: &JsonDocument) -> Result<Document, StoreError> {
    bson::to_document(value).map_err(|e| StoreError::Query(format!("encode failed: {e}")))
}

fn id_filter(id: EntityId) -> Document {
    doc! { "_id": id.as_object_id() }
}

fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::Null => Value::Null,
        Bson::Boolean(b) => Value::Bool(b),
        Bson::Int32(n) => Value::from(n),
        Bson::Int64(n) => Value::from(n),
        Bson::Double(n) => serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Bson::String(s) => Value::String(s),
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => Value::String(dt.to_chrono().to_rfc3339()),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        Bson::Document(doc) => {
            Value::Object(doc.into_iter().map(|(k, v)| (k, bson_to_json(v))).collect())
        }
        other => other.into_relaxed_extjson(),
    }
}

/// Map a stored document to its external JSON shape: `_id` becomes the
/// `id` hex string, everything else converts per value type.
fn document_to_json(mut doc: Document) -> JsonDocument {
    let mut out = JsonDocument::new();
    if let Some(Bson::ObjectId(oid)) = doc.remove("_id") {
        out.insert("id".to_string(), Value::String(oid.to_hex()));
    }
    for (key, value) in doc {
        out.insert(key, bson_to_json(value));
    }
    out
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn find_all(&self, collection: &str) -> Result<Vec<JsonDocument>, StoreError> {
        let coll = self.collection(collection);
        self.timed(async move {
            let cursor = coll.find(doc! {}).await.map_err(map_driver_error)?;
            let docs: Vec<Document> = cursor.try_collect().await.map_err(map_driver_error)?;
            Ok(docs.into_iter().map(document_to_json).collect())
        })
        .await
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: EntityId,
    ) -> Result<Option<JsonDocument>, StoreError> {
        let coll = self.collection(collection);
        self.timed(async move {
            let found = coll
                .find_one(id_filter(id))
                .await
                .map_err(map_driver_error)?;
            Ok(found.map(document_to_json))
        })
        .await
    }

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
        exclude: Option<EntityId>,
    ) -> Result<Option<JsonDocument>, StoreError> {
        let coll = self.collection(collection);
        let field_value =
            bson::to_bson(value).map_err(|e| StoreError::Query(format!("encode failed: {e}")))?;
        let mut filter = doc! { field: field_value };
        if let Some(id) = exclude {
            filter.insert("_id", doc! { "$ne": id.as_object_id() });
        }
        self.timed(async move {
            let found = coll.find_one(filter).await.map_err(map_driver_error)?;
            Ok(found.map(document_to_json))
        })
        .await
    }

    async fn insert_one(
        &self,
        collection: &str,
        document: JsonDocument,
    ) -> Result<EntityId, StoreError> {
        let coll = self.collection(collection);
        let doc = to_document(&document)?;
        self.timed(async move {
            let result = coll.insert_one(doc).await.map_err(map_driver_error)?;
            result
                .inserted_id
                .as_object_id()
                .map(EntityId::from)
                .ok_or_else(|| StoreError::Query("insert returned no identifier".to_string()))
        })
        .await
    }

    async fn update_one(
        &self,
        collection: &str,
        id: EntityId,
        fields: JsonDocument,
    ) -> Result<bool, StoreError> {
        let coll = self.collection(collection);
        let set = to_document(&fields)?;
        self.timed(async move {
            let result = coll
                .update_one(id_filter(id), doc! { "$set": set })
                .await
                .map_err(map_driver_error)?;
            Ok(result.matched_count > 0)
        })
        .await
    }

    async fn delete_one(&self, collection: &str, id: EntityId) -> Result<bool, StoreError> {
        let coll = self.collection(collection);
        self.timed(async move {
            let result = coll
                .delete_one(id_filter(id))
                .await
                .map_err(map_driver_error)?;
            Ok(result.deleted_count > 0)
        })
        .await
    }

    async fn count_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<u64, StoreError> {
        let coll = self.collection(collection);
        let field_value =
            bson::to_bson(value).map_err(|e| StoreError::Query(format!("encode failed: {e}")))?;
        self.timed(async move {
            coll.count_documents(doc! { field: field_value })
                .await
                .map_err(map_driver_error)
        })
        .await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let db = self.db.clone();
        self.timed(async move {
            db.run_command(doc! { "ping": 1 }).await.map_err(|e| {
                error!("store ping failed: {}", e);
                map_driver_error(e)
            })?;
            Ok(())
        })
        .await
    }
}
