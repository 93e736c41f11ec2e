#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use storefront_api::{
    app_router,
    config::AppConfig,
    db,
    entities::product,
    services::catalog::CreateProductRequest,
    AppState,
};
use tower::ServiceExt;
use uuid::Uuid;

pub const ADMIN_EMAIL: &str = "admin@storefront.test";
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// A registered account and its bearer token.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub token: String,
}

/// Helper harness for spinning up the full router backed by an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Like [`TestApp::new`] but lets a test adjust configuration first.
    pub async fn with_config(customize: impl FnOnce(&mut AppConfig)) -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "test_secret_key_for_testing_purposes_only_32chars".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        // A single connection keeps every query on the same in-memory database.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.admin_emails = Some(ADMIN_EMAIL.to_string());
        cfg.cors_allow_any_origin = true;
        customize(&mut cfg);

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), Arc::new(cfg));
        let router = app_router(state.clone());
        Self { router, state }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    /// Sends a request and decodes the JSON response body.
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = self.request(method, uri, token, body).await;
        let status = response.status();
        (status, response_json(response).await)
    }

    pub async fn register(&self, name: &str, email: &str) -> TestUser {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({ "name": name, "email": email, "password": TEST_PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        TestUser {
            id: body["id"].as_str().and_then(|s| s.parse().ok()).expect("user id"),
            email: email.to_string(),
            token: body["token"].as_str().expect("token").to_string(),
        }
    }

    pub async fn customer(&self) -> TestUser {
        let email = format!("customer-{}@storefront.test", Uuid::new_v4().simple());
        self.register("Asha Rao", &email).await
    }

    pub async fn admin(&self) -> TestUser {
        self.register("Store Admin", ADMIN_EMAIL).await
    }

    /// Inserts a catalog product directly through the catalog service.
    pub async fn seed_product(&self, name: &str, price: Decimal) -> product::Model {
        let request: CreateProductRequest = serde_json::from_value(json!({
            "name": name,
            "price": price.to_string(),
            "category": "Accessories",
        }))
        .expect("product request");
        self.state
            .services
            .catalog
            .create_product(request)
            .await
            .expect("seed product")
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
}

/// Reads a money field that is serialized as a decimal string.
pub fn money(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().expect("decimal string"),
        Value::Number(n) => n.to_string().parse().expect("decimal number"),
        other => panic!("not a money value: {other}"),
    }
}

pub fn shipping_address() -> Value {
    json!({
        "fullName": "Asha Rao",
        "phone": "+91 90000 00000",
        "email": "asha@example.com",
        "address": "12 Hill Road",
        "city": "Pune",
        "postalCode": "411001"
    })
}
