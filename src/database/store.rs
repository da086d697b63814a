use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use super::record::Record;

/// Errors from document store backends
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Invalid collection name: {0}")]
    InvalidCollection(String),

    #[error("Invalid record id: {0}")]
    InvalidId(String),

    #[error("Record {id} not found in {collection}")]
    NotFound { collection: String, id: String },

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl StoreError {
    pub fn not_found(collection: &str, id: impl ToString) -> Self {
        StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }
}

/// Parse an API-supplied identifier into the store's id type
pub fn parse_id(id: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(id).map_err(|_| StoreError::InvalidId(id.to_string()))
}

/// Document database holding one collection per resource type.
///
/// `Ok(None)` from `find_by_id`, `update` and `delete` means the id is absent;
/// callers decide whether that is an error.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name for logs and health output
    fn backend(&self) -> &'static str;

    /// Prepare the collection for use (create table etc). Must be idempotent.
    async fn ensure_collection(&self, collection: &str) -> Result<(), StoreError>;

    async fn find_all(&self, collection: &str) -> Result<Vec<Record>, StoreError>;

    async fn find_by_id(&self, collection: &str, id: Uuid) -> Result<Option<Record>, StoreError>;

    /// Insert a new document; the store assigns the id
    async fn insert(&self, collection: &str, fields: Map<String, Value>) -> Result<Record, StoreError>;

    /// Shallow-merge `fields` into an existing document
    async fn update(
        &self,
        collection: &str,
        id: Uuid,
        fields: Map<String, Value>,
    ) -> Result<Option<Record>, StoreError>;

    /// Remove a document, returning what was removed
    async fn delete(&self, collection: &str, id: Uuid) -> Result<Option<Record>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
