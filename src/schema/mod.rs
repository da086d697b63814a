//! Schema definitions and the startup-time schema catalog.
//!
//! A schema declares a resource type: the URL name, the backing collection,
//! and a descriptive field list. Field declarations are informational only;
//! records are stored as submitted.

pub mod catalog;

pub use catalog::SchemaCatalog;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Longest accepted resource or collection name (PostgreSQL identifier limit)
pub const MAX_NAME_LEN: usize = 63;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Invalid schema name '{0}': expected [a-z][a-z0-9_]* up to 63 characters")]
    InvalidName(String),

    #[error("Duplicate schema '{0}'")]
    Duplicate(String),

    #[error("Failed to read schema file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse schema file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    Any,
}

impl Default for FieldType {
    fn default() -> Self {
        FieldType::Any
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
}

/// Declarative description of one resource type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub name: String,
    /// Backing collection; defaults to `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    collection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldDefinition>,
}

impl SchemaDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collection: None,
            description: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, field_type: FieldType, required: bool) -> Self {
        self.fields.insert(name.into(), FieldDefinition { field_type, required });
        self
    }

    pub fn collection(&self) -> &str {
        self.collection.as_deref().unwrap_or(&self.name)
    }

    /// Names and collections end up as quoted SQL identifiers, so both are restricted
    pub fn validate(&self) -> Result<(), SchemaError> {
        if !is_valid_name(&self.name) {
            return Err(SchemaError::InvalidName(self.name.clone()));
        }
        if !is_valid_name(self.collection()) {
            return Err(SchemaError::InvalidName(self.collection().to_string()));
        }
        Ok(())
    }
}

pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    name.len() <= MAX_NAME_LEN
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Source of schema definitions keyed by resource-type name
#[async_trait]
pub trait SchemaStore: Send + Sync {
    async fn load(&self, name: &str) -> Option<Arc<SchemaDefinition>>;

    /// Registered resource-type names, sorted
    fn names(&self) -> Vec<String>;
}
