use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use crate::entities::order::{
    ActiveModel as OrderActiveModel, Column, Entity as Order, Model as OrderModel,
};
use crate::entities::user::{self, Model as UserModel};
use crate::errors::ServiceError;

/// 1-based page selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u64,
}

/// Customer details shown next to an order in the admin listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<UserModel> for CustomerSummary {
    fn from(user: UserModel) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOrderRow {
    #[serde(flatten)]
    pub order: OrderModel,
    pub customer: Option<CustomerSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderListing {
    pub rows: Vec<AdminOrderRow>,
    /// Number of orders across all pages.
    pub total: u64,
}

/// Durable order storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order in a single write.
    async fn insert(&self, order: OrderModel) -> Result<OrderModel, ServiceError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<OrderModel>, ServiceError>;

    /// Orders placed by `user_id`, newest first.
    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<OrderModel>, ServiceError>;

    /// Every order with its customer, newest first; all of them when `page` is `None`.
    async fn list_all(&self, page: Option<PageRequest>) -> Result<OrderListing, ServiceError>;

    /// Writes the mutable fulfilment fields of `order` only if the stored row
    /// still carries `expected_version`. Returns `false` when it does not.
    async fn update_if_version(
        &self,
        order: OrderModel,
        expected_version: i32,
    ) -> Result<bool, ServiceError>;
}

/// Sea-ORM backed [`OrderStore`].
#[derive(Debug, Clone)]
pub struct OrderRepository {
    db: Arc<DatabaseConnection>,
}

impl OrderRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn db_error(operation: &'static str) -> impl Fn(sea_orm::DbErr) -> ServiceError {
    move |e| {
        error!(error = %e, operation, "order store failure");
        ServiceError::DatabaseError(e)
    }
}

#[async_trait]
impl OrderStore for OrderRepository {
    async fn insert(&self, order: OrderModel) -> Result<OrderModel, ServiceError> {
        let active = OrderActiveModel {
            id: Set(order.id),
            user_id: Set(order.user_id),
            items: Set(order.items.clone()),
            shipping_address: Set(order.shipping_address.clone()),
            payment_method: Set(order.payment_method),
            total_price: Set(order.total_price),
            is_paid: Set(order.is_paid),
            paid_at: Set(order.paid_at),
            status: Set(order.status),
            is_delivered: Set(order.is_delivered),
            delivered_at: Set(order.delivered_at),
            version: Set(order.version),
            created_at: Set(order.created_at),
            updated_at: Set(order.updated_at),
        };

        Order::insert(active)
            .exec_without_returning(&*self.db)
            .await
            .map_err(db_error("insert"))?;

        Ok(order)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<OrderModel>, ServiceError> {
        Order::find_by_id(id)
            .one(&*self.db)
            .await
            .map_err(db_error("find_by_id"))
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<OrderModel>, ServiceError> {
        Order::find()
            .filter(Column::UserId.eq(user_id))
            .order_by_desc(Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(db_error("find_by_user"))
    }

    async fn list_all(&self, page: Option<PageRequest>) -> Result<OrderListing, ServiceError> {
        let query = Order::find()
            .find_also_related(user::Entity)
            .order_by_desc(Column::CreatedAt);

        let (rows, total) = match page {
            None => {
                let rows = query.all(&*self.db).await.map_err(db_error("list_all"))?;
                let total = rows.len() as u64;
                (rows, total)
            }
            Some(page) => {
                let paginator = query.paginate(&*self.db, page.per_page.max(1));
                let total = paginator
                    .num_items()
                    .await
                    .map_err(db_error("count_all"))?;
                // Pages past the end are empty without asking the database.
                let index = page.page.saturating_sub(1);
                let rows = match index.checked_mul(page.per_page.max(1)) {
                    Some(offset) if offset < total => paginator
                        .fetch_page(index)
                        .await
                        .map_err(db_error("list_all_page"))?,
                    _ => Vec::new(),
                };
                (rows, total)
            }
        };

        Ok(OrderListing {
            rows: rows
                .into_iter()
                .map(|(order, user)| AdminOrderRow {
                    order,
                    customer: user.map(CustomerSummary::from),
                })
                .collect(),
            total,
        })
    }

    async fn update_if_version(
        &self,
        order: OrderModel,
        expected_version: i32,
    ) -> Result<bool, ServiceError> {
        let changes = OrderActiveModel {
            status: Set(order.status),
            is_paid: Set(order.is_paid),
            paid_at: Set(order.paid_at),
            is_delivered: Set(order.is_delivered),
            delivered_at: Set(order.delivered_at),
            version: Set(order.version),
            updated_at: Set(order.updated_at),
            ..Default::default()
        };

        let result = Order::update_many()
            .set(changes)
            .filter(Column::Id.eq(order.id))
            .filter(Column::Version.eq(expected_version))
            .exec(&*self.db)
            .await
            .map_err(db_error("update_if_version"))?;

        Ok(result.rows_affected == 1)
    }
}
