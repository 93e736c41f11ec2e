//! Pure pricing rules for order placement.
//!
//! Prices always come from the catalog snapshot handed to [`OrderPricer`];
//! nothing a client sends can influence a line price or the order total.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::config::UnknownProductPolicy;
use crate::entities::max_money;
use crate::entities::order::{OrderLineItem, PaymentMethod};
use crate::errors::ServiceError;
use crate::repositories::CatalogProduct;

pub const NO_ORDER_ITEMS: &str = "No order items";
pub const ORDER_TOTAL_TOO_LARGE: &str = "Order total exceeds the maximum allowed amount";

/// Result of pricing every requested line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedOrder {
    pub items: Vec<OrderLineItem>,
    pub total_price: Decimal,
    /// References dropped under [`UnknownProductPolicy::Skip`], in request order.
    pub skipped: Vec<String>,
}

/// Accumulates catalog-resolved lines in request order.
#[derive(Debug)]
pub struct OrderPricer {
    policy: UnknownProductPolicy,
    items: Vec<OrderLineItem>,
    skipped: Vec<String>,
}

impl OrderPricer {
    pub fn new(policy: UnknownProductPolicy) -> Self {
        Self {
            policy,
            items: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Adds one requested line. `product` is what the catalog returned for
    /// `reference`; under the reject policy an unknown reference aborts pricing.
    pub fn add(
        &mut self,
        reference: &str,
        quantity: i32,
        product: Option<CatalogProduct>,
    ) -> Result<(), ServiceError> {
        match product {
            Some(product) => {
                self.items.push(OrderLineItem {
                    product: product.id,
                    name: product.name,
                    unit_price: product.unit_price,
                    quantity,
                });
                Ok(())
            }
            None => match self.policy {
                UnknownProductPolicy::Reject => {
                    Err(ServiceError::ProductNotFound(reference.to_string()))
                }
                UnknownProductPolicy::Skip => {
                    self.skipped.push(reference.to_string());
                    Ok(())
                }
            },
        }
    }

    pub fn finish(self) -> Result<PricedOrder, ServiceError> {
        if self.items.is_empty() {
            return Err(ServiceError::ValidationError(NO_ORDER_ITEMS.to_string()));
        }
        let total_price = order_total(&self.items)
            .filter(|total| *total <= max_money())
            .ok_or_else(|| ServiceError::ValidationError(ORDER_TOTAL_TOO_LARGE.to_string()))?;
        Ok(PricedOrder {
            items: self.items,
            total_price,
            skipped: self.skipped,
        })
    }
}

/// Sum of `unit_price * quantity` over every line, or `None` on overflow.
pub fn order_total(items: &[OrderLineItem]) -> Option<Decimal> {
    items
        .iter()
        .try_fold(Decimal::ZERO, |total, item| total.checked_add(item.line_total()?))
}

/// Payment state of a freshly placed order: online payments are settled at
/// placement, cash on delivery is settled when the order is delivered.
pub fn initial_settlement(method: PaymentMethod, now: DateTime<Utc>) -> (bool, Option<DateTime<Utc>>) {
    match method {
        PaymentMethod::Online => (true, Some(now)),
        PaymentMethod::CashOnDelivery => (false, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn product(name: &str, price: Decimal) -> CatalogProduct {
        CatalogProduct {
            id: Uuid::new_v4(),
            name: name.to_string(),
            unit_price: price,
        }
    }

    #[test]
    fn totals_lines_at_catalog_price() {
        let case = product("Phone Case", dec!(500));
        let cable = product("USB-C Cable", dec!(200));
        let mut pricer = OrderPricer::new(UnknownProductPolicy::Reject);
        pricer.add(&case.id.to_string(), 2, Some(case.clone())).unwrap();
        pricer.add(&cable.id.to_string(), 1, Some(cable.clone())).unwrap();

        let priced = pricer.finish().unwrap();
        assert_eq!(priced.total_price, dec!(1200));
        assert_eq!(priced.items.len(), 2);
        assert_eq!(priced.items[0].name, "Phone Case");
        assert_eq!(priced.items[0].unit_price, dec!(500));
        assert_eq!(priced.items[1].product, cable.id);
        assert!(priced.skipped.is_empty());
    }

    #[test]
    fn duplicate_products_stay_separate_lines() {
        let case = product("Phone Case", dec!(19.99));
        let mut pricer = OrderPricer::new(UnknownProductPolicy::Reject);
        pricer.add("a", 1, Some(case.clone())).unwrap();
        pricer.add("a", 3, Some(case)).unwrap();

        let priced = pricer.finish().unwrap();
        assert_eq!(priced.items.len(), 2);
        assert_eq!(priced.total_price, dec!(79.96));
    }

    #[test]
    fn reject_policy_names_missing_reference() {
        let mut pricer = OrderPricer::new(UnknownProductPolicy::Reject);
        let err = pricer.add("ghost-product", 1, None).unwrap_err();
        assert_matches!(err, ServiceError::ProductNotFound(ref r) if r == "ghost-product");
    }

    #[test]
    fn skip_policy_records_missing_reference() {
        let tempered = product("Tempered Glass", dec!(300));
        let mut pricer = OrderPricer::new(UnknownProductPolicy::Skip);
        pricer.add("ghost-product", 4, None).unwrap();
        pricer.add("tg", 1, Some(tempered)).unwrap();

        let priced = pricer.finish().unwrap();
        assert_eq!(priced.total_price, dec!(300));
        assert_eq!(priced.skipped, vec!["ghost-product".to_string()]);
    }

    #[test]
    fn nothing_priced_is_rejected() {
        let mut pricer = OrderPricer::new(UnknownProductPolicy::Skip);
        pricer.add("ghost-product", 1, None).unwrap();
        assert_matches!(
            pricer.finish(),
            Err(ServiceError::ValidationError(ref m)) if m == NO_ORDER_ITEMS
        );
    }

    #[test]
    fn overflowing_line_is_a_validation_error() {
        let mut pricer = OrderPricer::new(UnknownProductPolicy::Reject);
        pricer
            .add("huge", i32::MAX, Some(product("Gold Case", dec!(100000000000000000000))))
            .unwrap();
        assert_matches!(
            pricer.finish(),
            Err(ServiceError::ValidationError(ref m)) if m == ORDER_TOTAL_TOO_LARGE
        );
    }

    #[test]
    fn overflowing_sum_is_none() {
        let line = OrderLineItem {
            product: Uuid::new_v4(),
            name: "Gold Case".into(),
            unit_price: Decimal::MAX,
            quantity: 1,
        };
        assert_eq!(order_total(&[line.clone(), line]), None);
    }

    #[test]
    fn total_above_money_column_is_rejected() {
        let priciest = product("Gold Case", max_money());
        let mut pricer = OrderPricer::new(UnknownProductPolicy::Reject);
        pricer.add("gold", 1, Some(priciest.clone())).unwrap();
        assert_eq!(pricer.finish().unwrap().total_price, max_money());

        let mut pricer = OrderPricer::new(UnknownProductPolicy::Reject);
        pricer.add("gold", 2, Some(priciest)).unwrap();
        assert_matches!(
            pricer.finish(),
            Err(ServiceError::ValidationError(ref m)) if m == ORDER_TOTAL_TOO_LARGE
        );
    }

    #[test]
    fn online_is_paid_at_placement() {
        let now = Utc::now();
        assert_eq!(initial_settlement(PaymentMethod::Online, now), (true, Some(now)));
        assert_eq!(
            initial_settlement(PaymentMethod::CashOnDelivery, now),
            (false, None)
        );
    }
}
