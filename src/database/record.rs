use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Fields owned by the store and never accepted from API input
pub const SYSTEM_FIELDS: &[&str] = &["id"];

/// Errors that can occur while turning API input into record fields
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("System field '{0}' cannot be set via API input")]
    SystemFieldNotAllowed(&'static str),
    #[error("Invalid JSON format: {0}")]
    InvalidJson(String),
}

/// A stored document: store-assigned id plus arbitrary fields
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: Uuid,
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(id: Uuid, fields: Map<String, Value>) -> Self {
        Self { id, fields }
    }

    /// Build a record from a stored `data` document
    pub fn from_document(id: Uuid, document: Value) -> Self {
        match document {
            Value::Object(fields) => Self::new(id, fields),
            other => {
                tracing::warn!("Record {} holds a non-object document, wrapping it", id);
                let mut fields = Map::new();
                fields.insert("value".to_string(), other);
                Self::new(id, fields)
            }
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Shallow merge: supplied fields replace existing ones, the rest are kept
    pub fn merge(&mut self, changes: Map<String, Value>) {
        for (key, value) in changes {
            self.fields.insert(key, value);
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry("id", &self.id)?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Validate API input and extract its fields, rejecting system fields
pub fn fields_from_json(json: Value) -> Result<Map<String, Value>, RecordError> {
    match json {
        Value::Object(map) => {
            if let Some(field) = SYSTEM_FIELDS.iter().find(|f| map.contains_key(**f)) {
                return Err(RecordError::SystemFieldNotAllowed(*field));
            }
            Ok(map)
        }
        _ => Err(RecordError::InvalidJson("Expected JSON object".to_string())),
    }
}
