use futures::FutureExt;
use serde_json::Value;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use super::request::{PageCreateRequest, PageRecord, ValidationError, ValidationPolicy};
use crate::auth::{Credentials, SessionResolver, UserId};
use crate::config::AppConfig;
use crate::database::{Fields, RecordStore};

pub const PAGES_TABLE: &str = "pages";

/// Knobs the handler needs; injected rather than read from the global config
#[derive(Debug, Clone)]
pub struct PageSettings {
    pub owner_column: String,
    pub validation: ValidationPolicy,
    pub collaborator_timeout: Option<Duration>,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            owner_column: "owner_id".to_string(),
            validation: ValidationPolicy::default(),
            collaborator_timeout: None,
        }
    }
}

impl PageSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            owner_column: config.database.owner_column.clone(),
            validation: ValidationPolicy {
                reject_empty_fields: config.validation.reject_empty_fields,
                max_title_length: config.validation.max_title_length,
            },
            collaborator_timeout: config.api.collaborator_timeout_ms.map(Duration::from_millis),
        }
    }
}

/// Terminal outcome of one create-page request
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    /// Stored record, or the submitted payload when storage returned none
    Created(Value),
    Unauthenticated,
    ValidationFailure(ValidationError),
    /// Short, caller-safe diagnostic
    PersistenceFailure { detail: String },
}

#[derive(Debug)]
enum CallFault {
    TimedOut,
    Panicked,
}

/// Authenticated write path for pages.
///
/// The session is resolved and checked before anything touches storage, and
/// the owner column is always filled from that session. Each call makes at
/// most one insert attempt. If the caller drops the future while the insert
/// is in flight, the provider may still complete the write.
pub struct PageCreationHandler {
    resolver: Arc<dyn SessionResolver>,
    store: Arc<dyn RecordStore>,
    settings: PageSettings,
}

impl PageCreationHandler {
    pub fn new(resolver: Arc<dyn SessionResolver>, store: Arc<dyn RecordStore>, settings: PageSettings) -> Self {
        Self {
            resolver,
            store,
            settings,
        }
    }

    pub async fn handle(&self, credentials: &Credentials, body: &[u8]) -> PageOutcome {
        match self.authorize(credentials).await {
            Some(user_id) => self.create_for(&user_id, body).await,
            None => PageOutcome::Unauthenticated,
        }
    }

    /// Resolve the caller allowed to create a page, or None when the request must be refused.
    ///
    /// Transports that stream the body call this before reading it.
    pub async fn authorize(&self, credentials: &Credentials) -> Option<UserId> {
        let user_id = self.authenticate(credentials).await;
        if user_id.is_none() {
            tracing::warn!(
                outcome = "unauthenticated",
                credentials = credentials.kind(),
                "page creation refused"
            );
        }
        user_id
    }

    /// Validate and persist a page for a caller already returned by `authorize`
    pub async fn create_for(&self, user_id: &UserId, body: &[u8]) -> PageOutcome {
        let request = match PageCreateRequest::from_json(body, &self.settings.validation) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(outcome = "validation_failure", user_id = %user_id, reason = %e, "page payload rejected");
                return PageOutcome::ValidationFailure(e);
            }
        };

        let title_len = request.title.chars().count();
        let fields = PageRecord::new(request, user_id.clone()).into_fields(&self.settings.owner_column);

        match self.persist(user_id, fields).await {
            Ok(record) => {
                tracing::info!(outcome = "created", user_id = %user_id, title_len, "page created");
                PageOutcome::Created(record)
            }
            Err(detail) => {
                tracing::error!(outcome = "persistence_failure", user_id = %user_id, detail = %detail, "page creation failed");
                PageOutcome::PersistenceFailure { detail }
            }
        }
    }

    /// Resolve the caller; every fault along the way means "no session"
    async fn authenticate(&self, credentials: &Credentials) -> Option<UserId> {
        let resolved = guarded(
            self.settings.collaborator_timeout,
            async { self.resolver.resolve_session(credentials).await },
        )
        .await;

        let session = match resolved {
            Ok(Ok(Some(session))) => session,
            Ok(Ok(None)) => return None,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "session resolution failed, treating caller as anonymous");
                return None;
            }
            Err(CallFault::TimedOut) => {
                tracing::error!("session resolution timed out, treating caller as anonymous");
                return None;
            }
            Err(CallFault::Panicked) => {
                tracing::error!("identity resolver panicked, treating caller as anonymous");
                return None;
            }
        };

        let user_id = session.usable_user_id();
        if user_id.is_none() {
            tracing::warn!("session carried no usable user id");
        }
        user_id
    }

    /// Single insert attempt; Err carries the caller-facing detail
    async fn persist(&self, user_id: &UserId, fields: Fields) -> Result<Value, String> {
        let echo = Value::Object(fields.clone());
        let inserted = guarded(
            self.settings.collaborator_timeout,
            async move { self.store.insert(PAGES_TABLE, fields).await },
        )
        .await;

        match inserted {
            Ok(Ok(Some(record))) => self.check_record(user_id, record),
            Ok(Ok(None)) => Ok(echo),
            Ok(Err(e)) => {
                tracing::error!(error = %e, "storage insert failed");
                Err(e.client_detail())
            }
            Err(CallFault::TimedOut) => Err("storage request timed out".to_string()),
            Err(CallFault::Panicked) => {
                tracing::error!("record store panicked during insert");
                Err("unexpected storage fault".to_string())
            }
        }
    }

    /// The provider's echo must be an object and must not contradict the owner we stamped
    fn check_record(&self, user_id: &UserId, record: Value) -> Result<Value, String> {
        let Some(object) = record.as_object() else {
            tracing::error!("storage returned a non-object record");
            return Err("storage returned an unexpected response".to_string());
        };

        match object.get(&self.settings.owner_column) {
            Some(Value::String(owner)) if owner != user_id.as_str() => {
                tracing::error!(user_id = %user_id, "stored record carries a different owner");
                Err("storage returned an unexpected response".to_string())
            }
            _ => Ok(record),
        }
    }
}

/// Run a collaborator call with the optional timeout, containing panics.
///
/// Callers pass an async block so that a panic raised while building the
/// collaborator's future is caught as well.
async fn guarded<F: Future>(limit: Option<Duration>, call: F) -> Result<F::Output, CallFault> {
    let call = AssertUnwindSafe(call).catch_unwind();
    let finished = match limit {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .map_err(|_| CallFault::TimedOut)?,
        None => call.await,
    };
    finished.map_err(|_| CallFault::Panicked)
}
