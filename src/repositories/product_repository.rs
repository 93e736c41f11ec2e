use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, EntityTrait};
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

use crate::entities::product::{Entity as Product, Model as ProductModel};
use crate::errors::ServiceError;

/// The slice of a catalog product that order placement needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogProduct {
    pub id: Uuid,
    pub name: String,
    pub unit_price: Decimal,
}

impl From<ProductModel> for CatalogProduct {
    fn from(product: ProductModel) -> Self {
        Self {
            id: product.id,
            name: product.name,
            unit_price: product.price,
        }
    }
}

/// Authoritative source of product names and current prices.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Resolves a client supplied product reference. Unknown or malformed
    /// references resolve to `None`.
    async fn get_product(&self, reference: &str) -> Result<Option<CatalogProduct>, ServiceError>;
}

/// Sea-ORM backed [`ProductCatalog`].
#[derive(Debug, Clone)]
pub struct ProductRepository {
    db: Arc<DatabaseConnection>,
}

impl ProductRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProductCatalog for ProductRepository {
    async fn get_product(&self, reference: &str) -> Result<Option<CatalogProduct>, ServiceError> {
        let Ok(id) = Uuid::parse_str(reference.trim()) else {
            debug!(reference, "product reference is not a valid id");
            return Ok(None);
        };

        let product = Product::find_by_id(id).one(&*self.db).await.map_err(|e| {
            error!(error = %e, product_id = %id, "catalog lookup failed");
            ServiceError::DatabaseError(e)
        })?;

        Ok(product.map(CatalogProduct::from))
    }
}
