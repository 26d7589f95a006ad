#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use pages_api::auth::{generate_jwt, Claims, Credentials, IdentityError, JwtSessionResolver, Session, SessionResolver};
use pages_api::config::AppConfig;
use pages_api::database::{Fields, RecordStore, StoreError};
use pages_api::pages::PageSettings;
use pages_api::server::{self, AppState};
use serde_json::Value;

pub const TEST_SECRET: &str = "integration-test-secret";

/// Store double that records every insert and answers with a canned result
pub struct RecordingStore {
    calls: AtomicUsize,
    inserted: Mutex<Vec<(String, Fields)>>,
    reply: StoreReply,
}

#[derive(Clone)]
pub enum StoreReply {
    /// Return the inserted fields plus a generated id
    EchoWithId,
    /// Accept the write without returning a row
    Nothing,
    Reject(&'static str),
}

impl RecordingStore {
    pub fn new(reply: StoreReply) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            inserted: Mutex::new(Vec::new()),
            reply,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn inserted(&self) -> Vec<(String, Fields)> {
        self.inserted.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordStore for RecordingStore {
    async fn insert(&self, table: &str, fields: Fields) -> Result<Option<Value>, StoreError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.inserted.lock().unwrap().push((table.to_string(), fields.clone()));

        match &self.reply {
            StoreReply::EchoWithId => {
                let mut record = fields;
                record.insert("id".to_string(), Value::from(n));
                Ok(Some(Value::Object(record)))
            }
            StoreReply::Nothing => Ok(None),
            StoreReply::Reject(msg) => Err(StoreError::Rejected(msg.to_string())),
        }
    }
}

/// Resolver double whose provider always blows up
pub struct PanickingResolver;

#[async_trait]
impl SessionResolver for PanickingResolver {
    async fn resolve_session(&self, _credentials: &Credentials) -> Result<Option<Session>, IdentityError> {
        panic!("identity provider crashed");
    }
}

/// Resolver double that reports a provider outage
pub struct FailingResolver;

#[async_trait]
impl SessionResolver for FailingResolver {
    async fn resolve_session(&self, _credentials: &Credentials) -> Result<Option<Session>, IdentityError> {
        Err(IdentityError::Unavailable("upstream returned 502".to_string()))
    }
}

pub fn jwt_resolver() -> Arc<dyn SessionResolver> {
    Arc::new(JwtSessionResolver::new(TEST_SECRET))
}

pub fn token_for(user_id: &str) -> String {
    generate_jwt(&Claims::new(user_id, 1).expect("claims"), TEST_SECRET).expect("token")
}

/// Page body limit of every spawned test server
pub const TEST_BODY_LIMIT: usize = 64 * 1024;

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    task: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Serve the real router with the given collaborators on a free port
    pub async fn spawn(resolver: Arc<dyn SessionResolver>, store: Arc<dyn RecordStore>) -> Result<Self> {
        let mut config = AppConfig::from_env();
        config.api.enable_request_logging = false;
        config.security.session_cookie = "access_token".to_string();
        config.api.max_request_size_bytes = TEST_BODY_LIMIT;

        let settings = PageSettings {
            collaborator_timeout: Some(Duration::from_secs(2)),
            ..PageSettings::default()
        };
        let state = AppState::new(resolver, store, settings, config.security.session_cookie.clone());
        let app = server::app(state, &config);

        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test listener")?;

        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            port,
            base_url: format!("http://127.0.0.1:{}", port),
            task,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
