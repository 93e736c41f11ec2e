//! Storefront API Library
//!
//! HTTP backend for a small e-commerce storefront: accounts, catalog, coupons
//! and server-priced orders with an administrator fulfilment workflow.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod repositories;
pub mod services;
pub mod tracing;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    routing::{get, post, put},
    Extension, Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::AuthRouterExt;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<config::AppConfig>,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: Arc<config::AppConfig>) -> Self {
        let services = handlers::AppServices::new(db.clone(), config.clone());
        Self {
            db,
            config,
            services,
        }
    }
}

/// Every `/api` route, grouped by the access level it requires.
pub fn api_routes() -> Router<AppState> {
    let auth_public = Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login));

    let auth_account = Router::new()
        .route("/auth/profile", get(handlers::auth::profile))
        .route("/auth/save-address", post(handlers::auth::save_address))
        .with_auth();

    let products_read = Router::new()
        .route("/products", get(handlers::products::list_products))
        .route("/products/:id", get(handlers::products::get_product));

    let products_admin = Router::new()
        .route("/products", post(handlers::products::create_product))
        .route(
            "/products/:id",
            put(handlers::products::update_product).delete(handlers::products::delete_product),
        )
        .with_admin();

    let orders_customer = Router::new()
        .route("/orders", post(handlers::orders::create_order))
        .route("/orders/myorders", get(handlers::orders::my_orders))
        .route("/orders/:id", get(handlers::orders::get_order))
        .with_auth();

    let orders_admin = Router::new()
        .route("/orders/all-orders", get(handlers::orders::all_orders))
        .route(
            "/orders/:id/status",
            put(handlers::orders::update_order_status),
        )
        .with_admin();

    let coupons_public =
        Router::new().route("/coupons/verify", post(handlers::coupons::verify_coupon));

    let coupons_admin = Router::new()
        .route(
            "/coupons",
            get(handlers::coupons::list_coupons).post(handlers::coupons::create_coupon),
        )
        .route(
            "/coupons/:id",
            axum::routing::delete(handlers::coupons::delete_coupon),
        )
        .with_admin();

    let admin = Router::new()
        .route("/admin/stats", get(handlers::admin::stats))
        .with_admin();

    Router::new()
        .merge(auth_public)
        .merge(auth_account)
        .merge(products_read)
        .merge(products_admin)
        .merge(orders_customer)
        .merge(orders_admin)
        .merge(coupons_public)
        .merge(coupons_admin)
        .merge(admin)
}

/// CORS policy from configuration: the explicit allow-list when present,
/// permissive when allowed, otherwise same-origin only.
pub fn cors_layer(cfg: &config::AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = cfg
        .cors_origins()
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if !origins.is_empty() {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([
                header::AUTHORIZATION,
                header::CONTENT_TYPE,
                HeaderName::from_static(middleware_helpers::REQUEST_ID_HEADER),
            ])
            .allow_credentials(cfg.cors_allow_credentials)
    } else if cfg.should_allow_permissive_cors() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    }
}

/// Full application router with the shared middleware stack applied.
pub fn app_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let body_limit = state.config.max_body_size;
    let auth_service = state.services.auth.clone();

    Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health_check))
        .nest("/api", api_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http().make_span_with(crate::tracing::RequestSpanMaker))
        .layer(cors)
        // Inject AuthService into request extensions for auth middleware
        .layer(Extension(auth_service))
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id_middleware,
        ))
        .with_state(state)
}
