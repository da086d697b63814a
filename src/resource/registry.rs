use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{OnceCell, RwLock};
use tracing::info;

use super::collection::Collection;
use crate::database::{DocumentStore, StoreError};
use crate::schema::SchemaStore;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Invalid Model: {0}")]
    UnknownResourceType(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

type Slot = Arc<OnceCell<Arc<Collection>>>;

/// Resolves resource-type names to cached collection accessors.
///
/// Entries are created on first use and live as long as the registry. Each
/// name has its own init cell, so concurrent first requests for a name build
/// (and prepare the backing collection for) exactly one accessor.
pub struct ResourceRegistry {
    schemas: Arc<dyn SchemaStore>,
    store: Arc<dyn DocumentStore>,
    collections: RwLock<HashMap<String, Slot>>,
}

impl ResourceRegistry {
    pub fn new(schemas: Arc<dyn SchemaStore>, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            schemas,
            store,
            collections: RwLock::new(HashMap::new()),
        }
    }

    pub async fn resolve(&self, name: &str) -> Result<Arc<Collection>, RegistryError> {
        // Fast path: already built
        if let Some(collection) = self.cached(name).await {
            return Ok(collection);
        }

        let schema = self
            .schemas
            .load(name)
            .await
            .ok_or_else(|| RegistryError::UnknownResourceType(name.to_string()))?;

        let slot = {
            let mut collections = self.collections.write().await;
            collections.entry(name.to_string()).or_default().clone()
        };

        let collection = slot
            .get_or_try_init(|| async {
                self.store.ensure_collection(schema.collection()).await?;
                info!(
                    "Registered resource '{}' on {} collection '{}'",
                    schema.name,
                    self.store.backend(),
                    schema.collection()
                );
                Ok::<_, StoreError>(Arc::new(Collection::new(schema.clone(), self.store.clone())))
            })
            .await?;

        Ok(collection.clone())
    }

    async fn cached(&self, name: &str) -> Option<Arc<Collection>> {
        let collections = self.collections.read().await;
        collections.get(name).and_then(|slot| slot.get().cloned())
    }

    /// Names the registry can resolve
    pub fn resource_types(&self) -> Vec<String> {
        self.schemas.names()
    }

    /// Names resolved at least once
    pub async fn loaded(&self) -> Vec<String> {
        let collections = self.collections.read().await;
        let mut names: Vec<String> = collections
            .iter()
            .filter(|(_, slot)| slot.initialized())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }
}
