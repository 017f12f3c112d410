//! Referential integrity checks run between validation and the write.
//!
//! Advisory consistency only: a referenced document can disappear
//! between the lookup and the subsequent insert/update. The first
//! missing reference found is reported, in declaration order, for every
//! entity type alike.

use serde_json::Value;
use std::sync::Arc;

use crate::error::ApiError;
use crate::schema::entities::{FkPath, ForeignKey};
use crate::store::{DocumentStore, EntityId, JsonDocument, Repository};

/// Confirm that every declared foreign-key field present in the
/// normalized payload resolves to an existing document. Array-valued
/// keys check every element; any miss fails the whole operation.
pub async fn check_references(
    store: &Arc<dyn DocumentStore>,
    value: &JsonDocument,
    foreign_keys: &[ForeignKey],
) -> Result<(), ApiError> {
    for fk in foreign_keys {
        match &fk.path {
            FkPath::Scalar(name) => {
                if let Some(raw) = value.get(*name).and_then(Value::as_str) {
                    check_one(store, name, fk.target, raw).await?;
                }
            }
            FkPath::ArrayElement { array, field } => {
                let elements = value
                    .get(*array)
                    .and_then(Value::as_array)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                for (index, element) in elements.iter().enumerate() {
                    if let Some(raw) = element.get(*field).and_then(Value::as_str) {
                        let path = format!("{array}[{index}].{field}");
                        check_one(store, &path, fk.target, raw).await?;
                    }
                }
            }
        }
    }
    Ok(())
}

async fn check_one(
    store: &Arc<dyn DocumentStore>,
    field: &str,
    target: &'static str,
    raw: &str,
) -> Result<(), ApiError> {
    // Validation has already constrained the shape; a parse failure
    // here still reports as a missing reference rather than a 500.
    let Ok(id) = EntityId::parse(raw) else {
        return Err(ApiError::missing_reference(field, target, raw));
    };
    let exists = Repository::new(store.clone(), target).exists(id).await?;
    if exists {
        Ok(())
    } else {
        Err(ApiError::missing_reference(field, target, raw))
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

    fn store() -> Arc<dyn DocumentStore> {
        Arc::new(MemoryStore::new())
    }

    #[tokio::test]
    async fn scalar_reference_resolves() {
        let store = store();
        let author = Repository::new(store.clone(), "users")
            .insert(doc(json!({ "email": "a@b.com" })))
            .await
            .unwrap();

        let fks = vec![ForeignKey { path: FkPath::Scalar("authorId"), target: "users" }];
        let value = doc(json!({ "authorId": author.to_hex() }));
        assert!(check_references(&store, &value, &fks).await.is_ok());
    }

    #[tokio::test]
    async fn missing_scalar_reference_is_reported() {
        let store = store();
        let fks = vec![ForeignKey { path: FkPath::Scalar("authorId"), target: "users" }];
        let value = doc(json!({ "authorId": EntityId::generate().to_hex() }));

        let err = check_references(&store, &value, &fks).await.unwrap_err();
        match err {
            ApiError::MissingReference { field, collection, .. } => {
                assert_eq!(field, "authorId");
                assert_eq!(collection, "users");
            }
            other => panic!("expected MissingReference, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn absent_optional_reference_is_skipped() {
        let store = store();
        let fks = vec![ForeignKey { path: FkPath::Scalar("mealPlanId"), target: "mealPlans" }];
        let value = doc(json!({ "name": "Weekly shop" }));
        assert!(check_references(&store, &value, &fks).await.is_ok());
    }

    #[tokio::test]
    async fn array_elements_are_all_checked() {
        let store = store();
        let recipe = Repository::new(store.clone(), "recipes")
            .insert(doc(json!({ "title": "Soup" })))
            .await
            .unwrap();

        let fks = vec![ForeignKey {
            path: FkPath::ArrayElement { array: "meals", field: "recipeId" },
            target: "recipes",
        }];
        let value = doc(json!({
            "meals": [
                { "recipeId": recipe.to_hex() },
                { "recipeId": EntityId::generate().to_hex() },
            ]
        }));

        let err = check_references(&store, &value, &fks).await.unwrap_err();
        match err {
            ApiError::MissingReference { field, .. } => {
                assert_eq!(field, "meals[1].recipeId");
            }
            other => panic!("expected MissingReference, got {other:?}"),
        }
    }
}
