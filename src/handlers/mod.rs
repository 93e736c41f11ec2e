pub mod admin;
pub mod auth;
pub mod common;
pub mod coupons;
pub mod health;
pub mod orders;
pub mod products;

use std::sync::Arc;

use crate::auth::{AuthConfig, AuthService};
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::repositories::{OrderRepository, ProductRepository};
use crate::services::{
    catalog::CatalogService, coupons::CouponService, orders::OrderService, reports::ReportService,
    users::UserService,
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub auth: Arc<AuthService>,
    pub users: Arc<UserService>,
    pub catalog: Arc<CatalogService>,
    pub orders: Arc<OrderService>,
    pub coupons: Arc<CouponService>,
    pub reports: Arc<ReportService>,
}

impl AppServices {
    /// Wires every service against one connection pool and configuration.
    pub fn new(db_pool: Arc<DbPool>, config: Arc<AppConfig>) -> Self {
        let auth = Arc::new(AuthService::new(
            AuthConfig::from(config.as_ref()),
            db_pool.clone(),
        ));
        let orders = Arc::new(OrderService::new(
            Arc::new(OrderRepository::new(db_pool.clone())),
            Arc::new(ProductRepository::new(db_pool.clone())),
            config.unknown_product_policy,
        ));

        Self {
            users: Arc::new(UserService::new(db_pool.clone(), auth.clone(), config)),
            catalog: Arc::new(CatalogService::new(db_pool.clone())),
            coupons: Arc::new(CouponService::new(db_pool.clone())),
            reports: Arc::new(ReportService::new(db_pool)),
            orders,
            auth,
        }
    }
}
