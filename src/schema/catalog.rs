use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use super::{SchemaDefinition, SchemaError, SchemaStore};

/// In-process registration table of schemas, populated at startup
#[derive(Debug, Default, Clone)]
pub struct SchemaCatalog {
    schemas: HashMap<String, Arc<SchemaDefinition>>,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, schema: SchemaDefinition) -> Result<(), SchemaError> {
        schema.validate()?;
        if self.schemas.contains_key(&schema.name) {
            return Err(SchemaError::Duplicate(schema.name));
        }
        debug!("Registered schema '{}' -> collection '{}'", schema.name, schema.collection());
        self.schemas.insert(schema.name.clone(), Arc::new(schema));
        Ok(())
    }

    /// Builder form of `register`
    pub fn with(mut self, schema: SchemaDefinition) -> Result<Self, SchemaError> {
        self.register(schema)?;
        Ok(self)
    }

    /// Load every `*.yaml` / `*.yml` file in `dir`. Each file must carry its own `name`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let dir = dir.as_ref();
        let io_err = |source| SchemaError::Io {
            path: dir.display().to_string(),
            source,
        };

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            let is_yaml = matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("yaml") | Some("yml")
            );
            if path.is_file() && is_yaml {
                paths.push(path);
            }
        }
        // Stable registration order so duplicate errors are deterministic
        paths.sort();

        let mut catalog = Self::new();
        for path in paths {
            let text = std::fs::read_to_string(&path).map_err(|source| SchemaError::Io {
                path: path.display().to_string(),
                source,
            })?;
            let schema: SchemaDefinition =
                serde_yaml::from_str(&text).map_err(|source| SchemaError::Parse {
                    path: path.display().to_string(),
                    source,
                })?;
            catalog.register(schema)?;
        }

        info!("Loaded {} schema(s) from {}", catalog.len(), dir.display());
        Ok(catalog)
    }

    pub fn get(&self, name: &str) -> Option<Arc<SchemaDefinition>> {
        self.schemas.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[async_trait]
impl SchemaStore for SchemaCatalog {
    async fn load(&self, name: &str) -> Option<Arc<SchemaDefinition>> {
        self.get(name)
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.schemas.keys().cloned().collect();
        names.sort();
        names
    }
}
