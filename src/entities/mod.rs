use rust_decimal::Decimal;

pub mod coupon;
pub mod order;
pub mod product;
pub mod user;

pub use order::{LineItems, OrderLineItem, OrderStatus, PaymentMethod, ShippingAddress};

/// Largest amount the `numeric(14,2)` money columns can store.
pub fn max_money() -> Decimal {
    Decimal::new(99_999_999_999_999, 2)
}
