// Order placement and fulfilment
pub mod order_pricing;
pub mod order_status;
pub mod orders;

// Accounts
pub mod users;

// Catalog and promotions
pub mod catalog;
pub mod coupons;

// Admin reporting
pub mod reports;
