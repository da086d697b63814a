use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::{postgres::PgPoolOptions, postgres::PgRow, PgPool, Row};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use super::record::Record;
use super::store::{DocumentStore, StoreError};
use crate::config::DatabaseConfig;
use crate::schema::is_valid_name;

/// PostgreSQL-backed document store: one `(id, data JSONB)` table per collection
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect using the configured URL and pool settings
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let url = config
            .url
            .as_deref()
            .ok_or(StoreError::ConfigMissing("DATABASE_URL"))?;
        let parsed = url::Url::parse(url).map_err(|_| StoreError::InvalidDatabaseUrl)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;

        info!(
            "Connected to PostgreSQL at {}{} (max {} connections)",
            parsed.host_str().unwrap_or("localhost"),
            parsed.path(),
            config.max_connections
        );
        Ok(Self { pool })
    }

    /// Close the pool (e.g., on shutdown)
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed PostgreSQL pool");
    }

    /// Quote SQL identifier to prevent injection
    fn quote_identifier(name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    /// Validated, quoted table name for a collection
    fn table(collection: &str) -> Result<String, StoreError> {
        if !is_valid_name(collection) {
            return Err(StoreError::InvalidCollection(collection.to_string()));
        }
        Ok(Self::quote_identifier(collection))
    }

    fn row_to_record(row: PgRow) -> Result<Record, StoreError> {
        let id: Uuid = row.try_get("id")?;
        let data: Value = row.try_get("data")?;
        Ok(Record::from_document(id, data))
    }
}

#[async_trait]
impl DocumentStore for PostgresStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ensure_collection(&self, collection: &str) -> Result<(), StoreError> {
        let table = Self::table(collection)?;
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id UUID PRIMARY KEY,
                data JSONB NOT NULL DEFAULT '{{}}'::jsonb,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
            table
        );
        sqlx::query(&sql).execute(&self.pool).await?;

        debug!("Collection table ready: {}", table);
        Ok(())
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<Record>, StoreError> {
        let sql = format!(
            "SELECT id, data FROM {} ORDER BY created_at, id",
            Self::table(collection)?
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_record).collect()
    }

    async fn find_by_id(&self, collection: &str, id: Uuid) -> Result<Option<Record>, StoreError> {
        let sql = format!("SELECT id, data FROM {} WHERE id = $1", Self::table(collection)?);
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.map(Self::row_to_record).transpose()
    }

    async fn insert(&self, collection: &str, fields: Map<String, Value>) -> Result<Record, StoreError> {
        let sql = format!(
            "INSERT INTO {} (id, data) VALUES ($1, $2) RETURNING id, data",
            Self::table(collection)?
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(Value::Object(fields))
            .fetch_one(&self.pool)
            .await?;
        Self::row_to_record(row)
    }

    async fn update(
        &self,
        collection: &str,
        id: Uuid,
        fields: Map<String, Value>,
    ) -> Result<Option<Record>, StoreError> {
        // jsonb `||` is a shallow merge, matching Record::merge
        let sql = format!(
            "UPDATE {} SET data = data || $2, updated_at = now() WHERE id = $1 RETURNING id, data",
            Self::table(collection)?
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(Value::Object(fields))
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_record).transpose()
    }

    async fn delete(&self, collection: &str, id: Uuid) -> Result<Option<Record>, StoreError> {
        let sql = format!(
            "DELETE FROM {} WHERE id = $1 RETURNING id, data",
            Self::table(collection)?
        );
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.map(Self::row_to_record).transpose()
    }

    /// Pings the pool to ensure connectivity
    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreBackend;
    use crate::resource::Collection;
    use crate::schema::SchemaDefinition;
    use serde_json::json;
    use std::sync::Arc;

    /// Store on `DATABASE_URL` plus a fresh collection name; `None` when no database is configured
    async fn live_store() -> Option<(PostgresStore, String)> {
        let _ = dotenvy::dotenv();
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set, skipping PostgreSQL store test");
            return None;
        };
        let config = DatabaseConfig {
            backend: StoreBackend::Postgres,
            url: Some(url),
            max_connections: 2,
            connection_timeout: 5,
        };
        let store = PostgresStore::connect(&config).await.unwrap();
        let collection = format!("store_test_{}", Uuid::new_v4().simple());
        store.ensure_collection(&collection).await.unwrap();
        Some((store, collection))
    }

    async fn drop_collection(store: &PostgresStore, collection: &str) {
        let sql = format!("DROP TABLE IF EXISTS {}", PostgresStore::table(collection).unwrap());
        sqlx::query(&sql).execute(&store.pool).await.unwrap();
    }

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn crud_round_trip_against_live_database() {
        let Some((store, collection)) = live_store().await else {
            return;
        };
        // Idempotent on an existing table
        store.ensure_collection(&collection).await.unwrap();

        let created = store
            .insert(&collection, fields(json!({"name": "gizmo", "size": 3, "tags": ["a"]})))
            .await
            .unwrap();
        assert_eq!(created.get("name"), Some(&json!("gizmo")));

        let fetched = store.find_by_id(&collection, created.id).await.unwrap();
        assert_eq!(fetched, Some(created.clone()));

        let updated = store
            .update(&collection, created.id, fields(json!({"size": 5, "color": "red"})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.get("name"), Some(&json!("gizmo")));
        assert_eq!(updated.get("size"), Some(&json!(5)));
        assert_eq!(updated.get("color"), Some(&json!("red")));
        assert_eq!(updated.get("tags"), Some(&json!(["a"])));

        let second = store.insert(&collection, fields(json!({"name": "widget"}))).await.unwrap();
        let ids: Vec<Uuid> = store.find_all(&collection).await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&created.id) && ids.contains(&second.id));

        let removed = store.delete(&collection, created.id).await.unwrap();
        assert_eq!(removed, Some(updated));
        assert!(store.find_by_id(&collection, created.id).await.unwrap().is_none());

        drop_collection(&store, &collection).await;
        store.close().await;
    }

    #[tokio::test]
    async fn missing_ids_against_live_database() {
        let Some((store, collection)) = live_store().await else {
            return;
        };
        let missing = Uuid::new_v4();

        assert!(store.find_by_id(&collection, missing).await.unwrap().is_none());
        assert!(store.update(&collection, missing, fields(json!({"a": 1}))).await.unwrap().is_none());
        assert!(store.delete(&collection, missing).await.unwrap().is_none());

        let schema = Arc::new(SchemaDefinition::new("things").with_collection(collection.clone()));
        let things = Collection::new(schema, Arc::new(store.clone()));
        let err = things.get_by_id(&missing.to_string()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { ref collection, .. } if collection == "things"));

        drop_collection(&store, &collection).await;
        store.close().await;
    }

    #[test]
    fn quotes_identifiers() {
        assert_eq!(PostgresStore::quote_identifier("widgets"), "\"widgets\"");
        assert_eq!(PostgresStore::quote_identifier("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn rejects_unsafe_table_names() {
        assert_eq!(PostgresStore::table("widgets").unwrap(), "\"widgets\"");
        assert!(matches!(
            PostgresStore::table("widgets; DROP TABLE users"),
            Err(StoreError::InvalidCollection(_))
        ));
        assert!(PostgresStore::table("Widgets").is_err());
    }

    #[tokio::test]
    async fn connect_requires_url() {
        let config = DatabaseConfig {
            backend: crate::config::StoreBackend::Postgres,
            url: None,
            max_connections: 1,
            connection_timeout: 1,
        };
        assert!(matches!(
            PostgresStore::connect(&config).await,
            Err(StoreError::ConfigMissing("DATABASE_URL"))
        ));
    }

    #[tokio::test]
    async fn connect_rejects_malformed_url() {
        let config = DatabaseConfig {
            backend: crate::config::StoreBackend::Postgres,
            url: Some("not a url".to_string()),
            max_connections: 1,
            connection_timeout: 1,
        };
        assert!(matches!(
            PostgresStore::connect(&config).await,
            Err(StoreError::InvalidDatabaseUrl)
        ));
    }
}
