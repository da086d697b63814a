//! In-memory document store.
//!
//! Collections live in a `tokio::sync::RwLock`-guarded map and vanish with the
//! process. Used for development (`STORE_BACKEND=memory`) and tests.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::record::Record;
use super::store::{DocumentStore, StoreError};

/// Thread-safe in-memory store: `collection` -> records in insertion order
#[derive(Clone, Default)]
pub struct InMemoryStore {
    collections: Arc<RwLock<HashMap<String, Vec<Record>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in a collection (0 if it does not exist)
    pub async fn count(&self, collection: &str) -> usize {
        let guard = self.collections.read().await;
        guard.get(collection).map(Vec::len).unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ensure_collection(&self, collection: &str) -> Result<(), StoreError> {
        let mut guard = self.collections.write().await;
        guard.entry(collection.to_string()).or_default();
        Ok(())
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<Record>, StoreError> {
        let guard = self.collections.read().await;
        Ok(guard.get(collection).cloned().unwrap_or_default())
    }

    async fn find_by_id(&self, collection: &str, id: Uuid) -> Result<Option<Record>, StoreError> {
        let guard = self.collections.read().await;
        Ok(guard
            .get(collection)
            .and_then(|records| records.iter().find(|r| r.id == id))
            .cloned())
    }

    async fn insert(&self, collection: &str, fields: Map<String, Value>) -> Result<Record, StoreError> {
        let record = Record::new(Uuid::new_v4(), fields);

        let mut guard = self.collections.write().await;
        guard
            .entry(collection.to_string())
            .or_default()
            .push(record.clone());

        Ok(record)
    }

    async fn update(
        &self,
        collection: &str,
        id: Uuid,
        fields: Map<String, Value>,
    ) -> Result<Option<Record>, StoreError> {
        let mut guard = self.collections.write().await;
        let Some(record) = guard
            .get_mut(collection)
            .and_then(|records| records.iter_mut().find(|r| r.id == id))
        else {
            return Ok(None);
        };

        record.merge(fields);
        Ok(Some(record.clone()))
    }

    async fn delete(&self, collection: &str, id: Uuid) -> Result<Option<Record>, StoreError> {
        let mut guard = self.collections.write().await;
        let Some(records) = guard.get_mut(collection) else {
            return Ok(None);
        };

        Ok(records
            .iter()
            .position(|r| r.id == id)
            .map(|index| records.remove(index)))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn insert_assigns_unique_ids() {
        let store = InMemoryStore::new();
        let a = store.insert("widgets", fields(json!({"name": "a"}))).await.unwrap();
        let b = store.insert("widgets", fields(json!({"name": "b"}))).await.unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(store.count("widgets").await, 2);
    }

    #[tokio::test]
    async fn find_all_keeps_insertion_order() {
        let store = InMemoryStore::new();
        for name in ["first", "second", "third"] {
            store.insert("widgets", fields(json!({ "name": name }))).await.unwrap();
        }

        let names: Vec<Value> = store
            .find_all("widgets")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.fields["name"].clone())
            .collect();
        assert_eq!(names, vec![json!("first"), json!("second"), json!("third")]);
    }

    #[tokio::test]
    async fn collections_are_isolated() {
        let store = InMemoryStore::new();
        let widget = store.insert("widgets", fields(json!({"name": "w"}))).await.unwrap();

        assert!(store.find_by_id("gadgets", widget.id).await.unwrap().is_none());
        assert!(store.find_all("gadgets").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_and_delete_missing_return_none() {
        let store = InMemoryStore::new();
        store.ensure_collection("widgets").await.unwrap();
        let missing = Uuid::new_v4();

        assert!(store.update("widgets", missing, Map::new()).await.unwrap().is_none());
        assert!(store.delete("widgets", missing).await.unwrap().is_none());
        assert!(store.delete("unknown", missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_returns_removed_record() {
        let store = InMemoryStore::new();
        let record = store.insert("widgets", fields(json!({"name": "w"}))).await.unwrap();

        let removed = store.delete("widgets", record.id).await.unwrap();
        assert_eq!(removed, Some(record));
        assert_eq!(store.count("widgets").await, 0);
    }

    #[tokio::test]
    async fn ensure_collection_is_idempotent() {
        let store = InMemoryStore::new();
        store.ensure_collection("widgets").await.unwrap();
        store.insert("widgets", fields(json!({"name": "w"}))).await.unwrap();
        store.ensure_collection("widgets").await.unwrap();

        assert_eq!(store.count("widgets").await, 1);
        assert_eq!(store.find_all("widgets").await.unwrap()[0].get("name"), Some(&json!("w")));
    }
}
