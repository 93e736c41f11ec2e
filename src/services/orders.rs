use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::UnknownProductPolicy,
    entities::order::{Model as OrderModel, OrderStatus, PaymentMethod, ShippingAddress},
    errors::ServiceError,
    repositories::{OrderListing, OrderStore, PageRequest, ProductCatalog},
    services::{
        order_pricing::{initial_settlement, OrderPricer, NO_ORDER_ITEMS},
        order_status::apply_status_change,
    },
};

/// A line as requested by the customer. Any price the client sends is ignored.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OrderItemRequest {
    #[validate(length(min = 1, message = "Product reference is required"))]
    pub product: String,
    #[validate(range(min = 1, max = 10000, message = "Quantity must be between 1 and 10000"))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(default)]
    #[validate]
    pub items: Vec<OrderItemRequest>,
    #[serde(default)]
    #[validate]
    pub shipping_address: ShippingAddress,
    /// Free-form; only the exact value `"COD"` selects cash on delivery.
    #[serde(default)]
    pub payment_method: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

/// Newly placed order plus any references dropped by the skip policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    #[serde(flatten)]
    pub order: OrderModel,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped_products: Vec<String>,
}

/// Service for placing, listing and fulfilling orders.
#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderStore>,
    catalog: Arc<dyn ProductCatalog>,
    unknown_product_policy: UnknownProductPolicy,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        catalog: Arc<dyn ProductCatalog>,
        unknown_product_policy: UnknownProductPolicy,
    ) -> Self {
        Self {
            orders,
            catalog,
            unknown_product_policy,
        }
    }

    /// Prices the requested items against the catalog and persists a new
    /// order for `user_id`. Nothing is written unless every step succeeds.
    #[instrument(skip(self, request), fields(user_id = %user_id, item_count = request.items.len()))]
    pub async fn create_order(
        &self,
        user_id: Uuid,
        request: CreateOrderRequest,
    ) -> Result<PlacedOrder, ServiceError> {
        if request.items.is_empty() {
            return Err(ServiceError::ValidationError(NO_ORDER_ITEMS.to_string()));
        }
        request.validate()?;

        let mut pricer = OrderPricer::new(self.unknown_product_policy);
        for item in &request.items {
            let product = self.catalog.get_product(&item.product).await?;
            pricer.add(&item.product, item.quantity, product)?;
        }
        let priced = pricer.finish()?;
        if !priced.skipped.is_empty() {
            warn!(skipped = ?priced.skipped, "Dropped order lines for unknown products");
        }

        let now = Utc::now();
        let payment_method = PaymentMethod::from_request(request.payment_method.as_deref());
        let (is_paid, paid_at) = initial_settlement(payment_method, now);

        let order = OrderModel {
            id: Uuid::new_v4(),
            user_id,
            items: priced.items.into(),
            shipping_address: request.shipping_address,
            payment_method,
            total_price: priced.total_price,
            is_paid,
            paid_at,
            status: OrderStatus::Processing,
            is_delivered: false,
            delivered_at: None,
            version: 1,
            created_at: now,
            updated_at: now,
        };

        let order = self.orders.insert(order).await?;
        info!(order_id = %order.id, total_price = %order.total_price, "Order created");

        Ok(PlacedOrder {
            order,
            skipped_products: priced.skipped,
        })
    }

    /// The caller's own orders, newest first.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_user_orders(&self, user_id: Uuid) -> Result<Vec<OrderModel>, ServiceError> {
        self.orders.find_by_user(user_id).await
    }

    /// Every order in the system, newest first.
    #[instrument(skip(self))]
    pub async fn list_all_orders(
        &self,
        page: Option<PageRequest>,
    ) -> Result<OrderListing, ServiceError> {
        self.orders.list_all(page).await
    }

    /// Loads an order visible to the requester. Orders owned by someone else
    /// are reported as missing unless the requester is an admin.
    #[instrument(skip(self), fields(order_id = %order_id, requester = %requester_id))]
    pub async fn get_order(
        &self,
        order_id: Uuid,
        requester_id: Uuid,
        requester_is_admin: bool,
    ) -> Result<OrderModel, ServiceError> {
        match self.orders.find_by_id(order_id).await? {
            Some(order) if requester_is_admin || order.user_id == requester_id => Ok(order),
            _ => Err(ServiceError::NotFound("Order not found".to_string())),
        }
    }

    /// Moves an order to `status`, applying delivery side effects. Fails with
    /// `ConcurrentModification` if another update landed in between.
    #[instrument(skip(self), fields(order_id = %order_id, new_status = ?status))]
    pub async fn update_order_status(
        &self,
        order_id: Uuid,
        status: OrderStatus,
    ) -> Result<OrderModel, ServiceError> {
        let mut order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        let expected_version = order.version;
        let previous = order.status;
        apply_status_change(&mut order, status, Utc::now());

        if !self
            .orders
            .update_if_version(order.clone(), expected_version)
            .await?
        {
            warn!(order_id = %order_id, expected_version, "Order changed during status update");
            return Err(ServiceError::ConcurrentModification(order_id));
        }

        info!(order_id = %order_id, from = ?previous, to = ?status, "Order status updated");
        Ok(order)
    }
}
