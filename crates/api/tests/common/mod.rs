//! Common test utilities for integration tests.
//!
//! The router runs against `InMemoryStore`, so these tests need no database.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request},
    response::Response,
    Router,
};
use campus_events_api::app::{build_router, AppState};
use campus_events_api::config::{
    Config, DatabaseConfig, JwtAuthConfig, LoggingConfig, PolicyConfig, SecurityConfig,
    ServerConfig,
};
use chrono::{Duration, Utc};
use domain::models::{CheckInPolicy, NewEvent};
use domain::store::{EventStore, InMemoryStore};
use persistence::UpsertStrategy;
use serde_json::Value;
use shared::jwt::JwtConfig;
use shared::Role;
use std::sync::Arc;

pub const TEST_JWT_SECRET: &str = "integration-test-secret";
pub const ADMIN_SUBJECT: &str = "ops@campus.test";
pub const STUDENT_SUBJECT: &str = "r001@campus.test";

/// Test configuration with rate limiting off and the open check-in policy.
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout_secs: 30,
            max_body_size: 65_536,
        },
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout_secs: 10,
            idle_timeout_secs: 600,
            upsert_strategy: UpsertStrategy::Native,
        },
        logging: LoggingConfig {
            level: "warn".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig {
            cors_origins: vec![],
            rate_limit_per_minute: 0,
            hsts_enabled: false,
            trust_forwarded_for: false,
        },
        jwt: JwtAuthConfig {
            secret: TEST_JWT_SECRET.to_string(),
            leeway_secs: 0,
        },
        policy: PolicyConfig {
            direct_attendance: CheckInPolicy::Open,
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response {
        use tower::ServiceExt;
        self.router.clone().oneshot(request).await.unwrap()
    }
}

pub fn create_test_app(config: Config) -> TestApp {
    let store = Arc::new(InMemoryStore::new());
    let state = AppState::new(config, store.clone()).expect("valid jwt secret");
    TestApp {
        router: build_router(state),
        store,
    }
}

pub fn default_test_app() -> TestApp {
    create_test_app(test_config())
}

fn issue(subject: &str, role: Role) -> String {
    JwtConfig::new(TEST_JWT_SECRET, 0)
        .unwrap()
        .issue_token(subject, role, 600)
        .unwrap()
        .0
}

pub fn admin_token() -> String {
    issue(ADMIN_SUBJECT, Role::Admin)
}

pub fn student_token() -> String {
    issue(STUDENT_SUBJECT, Role::Student)
}

/// JSON request, optionally carrying a bearer token.
pub fn json_request(method: Method, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Body-less request, optionally carrying a bearer token.
pub fn empty_request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn parse_response_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(Value::Null)
}

/// Inserts an event directly into the store.
pub async fn seed_event(store: &InMemoryStore, event_id: &str, capacity: Option<i32>) {
    seed_event_with(store, event_id, capacity, false).await;
}

pub async fn seed_event_with(
    store: &InMemoryStore,
    event_id: &str,
    capacity: Option<i32>,
    cancelled: bool,
) {
    let now = Utc::now();
    store
        .insert_event(&NewEvent {
            event_id: event_id.to_string(),
            title: format!("Event {}", event_id),
            event_type: "workshop".to_string(),
            description: String::new(),
            starts_at: now + Duration::days(7),
            capacity,
            college_id: "c1".to_string(),
            cancelled,
            features: vec![],
            created_at: now,
        })
        .await
        .unwrap();
}
