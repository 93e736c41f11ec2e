//! Storage seams used by the order services.
//!
//! The services only see the [`OrderStore`] and [`ProductCatalog`] traits so
//! their business rules can be exercised against mocks.

pub mod order_repository;
pub mod product_repository;

pub use order_repository::{
    AdminOrderRow, CustomerSummary, OrderListing, OrderRepository, OrderStore, PageRequest,
};
pub use product_repository::{CatalogProduct, ProductCatalog, ProductRepository};
