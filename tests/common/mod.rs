#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{Map, Value};
use tower::ServiceExt;
use uuid::Uuid;

use resource_proxy::auth::{JwtIdentityProvider, IdentityProvider};
use resource_proxy::database::{DocumentStore, InMemoryStore, Record, StoreError};
use resource_proxy::resource::ResourceRegistry;
use resource_proxy::schema::{FieldType, SchemaCatalog, SchemaDefinition};
use resource_proxy::server::{router, AppState};
use resource_proxy::types::{Permission, Role};

pub const TEST_SECRET: &str = "test-secret";

/// In-memory store that counts record operations (list/get/insert/update/delete)
#[derive(Default)]
pub struct CountingStore {
    pub inner: InMemoryStore,
    record_calls: AtomicUsize,
}

impl CountingStore {
    pub fn record_calls(&self) -> usize {
        self.record_calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.record_calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for CountingStore {
    fn backend(&self) -> &'static str {
        "counting"
    }

    async fn ensure_collection(&self, collection: &str) -> Result<(), StoreError> {
        self.inner.ensure_collection(collection).await
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<Record>, StoreError> {
        self.hit();
        self.inner.find_all(collection).await
    }

    async fn find_by_id(&self, collection: &str, id: Uuid) -> Result<Option<Record>, StoreError> {
        self.hit();
        self.inner.find_by_id(collection, id).await
    }

    async fn insert(&self, collection: &str, fields: Map<String, Value>) -> Result<Record, StoreError> {
        self.hit();
        self.inner.insert(collection, fields).await
    }

    async fn update(&self, collection: &str, id: Uuid, fields: Map<String, Value>) -> Result<Option<Record>, StoreError> {
        self.hit();
        self.inner.update(collection, id, fields).await
    }

    async fn delete(&self, collection: &str, id: Uuid) -> Result<Option<Record>, StoreError> {
        self.hit();
        self.inner.delete(collection, id).await
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Router wired to a counting in-memory store and a JWT provider
pub struct TestApp {
    pub router: Router,
    pub store: Arc<CountingStore>,
    pub identity: Arc<JwtIdentityProvider>,
}

impl TestApp {
    pub fn new() -> Self {
        let catalog = SchemaCatalog::new()
            .with(SchemaDefinition::new("widgets").with_field("name", FieldType::String, true))
            .unwrap()
            .with(SchemaDefinition::new("clothes").with_collection("garments"))
            .unwrap();

        let store = Arc::new(CountingStore::default());
        let identity = Arc::new(JwtIdentityProvider::new(TEST_SECRET, 1).unwrap());
        let registry = Arc::new(ResourceRegistry::new(Arc::new(catalog), store.clone()));
        let identity_dyn: Arc<dyn IdentityProvider> = identity.clone();

        Self {
            router: router(AppState::new(registry, identity_dyn)),
            store,
            identity,
        }
    }

    pub fn token(&self, role: Role) -> String {
        self.identity
            .issue(&self.identity.claims_for("tester", role))
            .unwrap()
    }

    pub fn token_with(&self, permissions: Vec<Permission>) -> String {
        let claims = self.identity.claims_for("tester", Role::User).with_permissions(permissions);
        self.identity.issue(&claims).unwrap()
    }

    pub async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send_request(request).await
    }

    pub async fn send_request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }
}

/// The server binary running on a free port with the in-memory store
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    pub fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_resource-proxy"));
        cmd.env("PROXY_PORT", port.to_string())
            .env("BIND_ADDRESS", "127.0.0.1")
            .env("APP_ENV", "development")
            .env("STORE_BACKEND", "memory")
            .env("SCHEMA_DIR", concat!(env!("CARGO_MANIFEST_DIR"), "/schemas"))
            .env("JWT_SECRET", TEST_SECRET)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    pub async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == reqwest::StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
