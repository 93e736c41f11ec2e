use chrono::{DateTime, Utc};

use crate::entities::order::{Model as OrderModel, OrderStatus};

/// Applies an admin status change to `order` in memory.
///
/// Every status is reachable from every other. Moving to `Delivered` marks
/// the order delivered and settles an unpaid cash-on-delivery order. Leaving
/// `Delivered` keeps the delivery and payment facts already recorded.
pub fn apply_status_change(order: &mut OrderModel, status: OrderStatus, now: DateTime<Utc>) {
    order.status = status;

    if status == OrderStatus::Delivered {
        order.is_delivered = true;
        order.delivered_at = Some(now);

        if order.payment_method.is_cash_on_delivery() && !order.is_paid {
            order.is_paid = true;
            order.paid_at = Some(now);
        }
    }

    order.updated_at = now;
    order.version += 1;
}
