use serde_json::{Map, Value};
use std::sync::Arc;

use crate::database::{parse_id, DocumentStore, Record, StoreError};
use crate::schema::SchemaDefinition;

/// Uniform CRUD operations over the collection backing one schema
pub struct Collection {
    schema: Arc<SchemaDefinition>,
    store: Arc<dyn DocumentStore>,
}

impl Collection {
    pub fn new(schema: Arc<SchemaDefinition>, store: Arc<dyn DocumentStore>) -> Self {
        Self { schema, store }
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }

    fn collection(&self) -> &str {
        self.schema.collection()
    }

    pub async fn list(&self) -> Result<Vec<Record>, StoreError> {
        self.store.find_all(self.collection()).await
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Record, StoreError> {
        let uuid = parse_id(id)?;
        self.store
            .find_by_id(self.collection(), uuid)
            .await?
            .ok_or_else(|| StoreError::not_found(self.name(), id))
    }

    pub async fn create(&self, fields: Map<String, Value>) -> Result<Record, StoreError> {
        self.store.insert(self.collection(), fields).await
    }

    pub async fn update(&self, id: &str, fields: Map<String, Value>) -> Result<Record, StoreError> {
        let uuid = parse_id(id)?;
        self.store
            .update(self.collection(), uuid, fields)
            .await?
            .ok_or_else(|| StoreError::not_found(self.name(), id))
    }

    /// Deleting an id that does not exist is `NotFound`, not a silent success
    pub async fn delete(&self, id: &str) -> Result<Record, StoreError> {
        let uuid = parse_id(id)?;
        self.store
            .delete(self.collection(), uuid)
            .await?
            .ok_or_else(|| StoreError::not_found(self.name(), id))
    }
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.schema.name)
            .field("collection", &self.schema.collection())
            .field("backend", &self.store.backend())
            .finish()
    }
}
