use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::SessionResolver;
use crate::config::AppConfig;
use crate::database::RecordStore;
use crate::handlers;
use crate::pages::{PageCreationHandler, PageSettings};

const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Shared, immutable per-process state handed to every request
#[derive(Clone)]
pub struct AppState {
    pub pages: Arc<PageCreationHandler>,
    pub store: Arc<dyn RecordStore>,
    /// Name of the cookie that may carry the session token
    pub session_cookie: String,
    /// Largest page body read once the caller is authenticated
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(
        resolver: Arc<dyn SessionResolver>,
        store: Arc<dyn RecordStore>,
        settings: PageSettings,
        session_cookie: impl Into<String>,
    ) -> Self {
        let pages = Arc::new(PageCreationHandler::new(resolver, store.clone(), settings));
        Self {
            pages,
            store,
            session_cookie: session_cookie.into(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }
}

pub fn app(state: AppState, config: &AppConfig) -> Router {
    let state = state.with_max_body_bytes(config.api.max_request_size_bytes);

    let mut router = Router::new()
        // Public
        .route("/", get(handlers::public::root))
        .route("/health", get(handlers::public::health))
        // Authenticated (resolved inside the handler)
        .route("/api/pages", post(handlers::pages::create))
        .fallback(handlers::public::not_found)
        .with_state(state);

    if config.security.enable_cors {
        if let Some(cors) = cors_layer(&config.security.cors_origins) {
            router = router.layer(cors);
        }
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Credentials, IdentityError, Session};
    use crate::database::{Fields, StoreError};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct FixedResolver(Option<&'static str>);

    #[async_trait]
    impl SessionResolver for FixedResolver {
        async fn resolve_session(&self, credentials: &Credentials) -> Result<Option<Session>, IdentityError> {
            Ok(credentials.token().and(self.0).map(Session::new))
        }
    }

    struct EchoStore {
        healthy: bool,
    }

    #[async_trait]
    impl RecordStore for EchoStore {
        async fn insert(&self, _table: &str, fields: Fields) -> Result<Option<Value>, StoreError> {
            Ok(Some(Value::Object(fields)))
        }

        async fn ping(&self) -> Result<(), StoreError> {
            if self.healthy {
                Ok(())
            } else {
                Err(StoreError::Unavailable("connection refused".into()))
            }
        }
    }

    fn test_app(healthy: bool) -> Router {
        let state = AppState::new(
            Arc::new(FixedResolver(Some("u1"))),
            Arc::new(EchoStore { healthy }),
            PageSettings::default(),
            "access_token",
        );
        let mut config = AppConfig::from_env();
        config.api.max_request_size_bytes = 1024;
        app(state, &config)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn creates_page_with_cookie_session() {
        let request = Request::post("/api/pages")
            .header(header::COOKIE, "access_token=abc")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"title":"Route A","content":"..."}"#))
            .unwrap();

        let response = test_app(true).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Page created successfully");
        assert_eq!(body["data"]["owner_id"], "u1");
    }

    #[tokio::test]
    async fn rejects_missing_credentials() {
        let request = Request::post("/api/pages")
            .body(Body::from(r#"{"title":"x","content":"y"}"#))
            .unwrap();

        let response = test_app(true).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await, json!({ "message": "Not authenticated" }));
    }

    #[tokio::test]
    async fn oversized_body_without_credentials_is_401() {
        let request = Request::post("/api/pages")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(vec![b'x'; 4096]))
            .unwrap();

        let response = test_app(true).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await, json!({ "message": "Not authenticated" }));
    }

    #[tokio::test]
    async fn oversized_body_with_session_is_json_413() {
        let request = Request::post("/api/pages")
            .header(header::AUTHORIZATION, "Bearer abc")
            .body(Body::from(vec![b'x'; 4096]))
            .unwrap();

        let response = test_app(true).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body_json(response).await["message"], "Request body too large");
    }

    #[tokio::test]
    async fn malformed_body_with_session_is_bad_request() {
        let request = Request::post("/api/pages")
            .header(header::AUTHORIZATION, "Bearer abc")
            .body(Body::from("{"))
            .unwrap();

        let response = test_app(true).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["message"], "Invalid page payload");
    }

    #[tokio::test]
    async fn health_reports_storage_state() {
        let ok = test_app(true)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);

        let degraded = test_app(false)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(degraded.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_json(degraded).await;
        assert!(!body.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let response = test_app(true)
            .oneshot(Request::get("/api/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, json!({ "message": "Not found" }));
    }

    #[test]
    fn cors_layer_needs_a_valid_origin() {
        assert!(cors_layer(&[]).is_none());
        assert!(cors_layer(&["bad\norigin".to_string()]).is_none());
        assert!(cors_layer(&["https://app.example.com".to_string()]).is_some());
    }
}
