use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ColumnTrait, ConnectionTrait, DatabaseBackend, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::instrument;

use crate::entities::order::{self, OrderStatus};
use crate::entities::{product, user};
use crate::errors::ServiceError;

/// Number of most recent trading days reported in `dailySales`.
pub const DAILY_SALES_WINDOW: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySales {
    /// UTC calendar day, `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub sales: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub users_count: u64,
    pub products_count: u64,
    pub orders_count: u64,
    pub total_revenue: Decimal,
    pub daily_sales: Vec<DailySales>,
}

/// Orders per-day totals oldest first and keeps the last `DAILY_SALES_WINDOW`
/// days that had sales.
///
/// The window is the most recent days, not the earliest ones: a store with a
/// long history still sees the current week.
pub fn daily_sales<I>(days: I) -> Vec<DailySales>
where
    I: IntoIterator<Item = (NaiveDate, Decimal)>,
{
    let mut by_day: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for (date, sales) in days {
        *by_day.entry(date).or_default() += sales;
    }

    let skip = by_day.len().saturating_sub(DAILY_SALES_WINDOW);
    by_day
        .into_iter()
        .skip(skip)
        .map(|(date, sales)| DailySales { date, sales })
        .collect()
}

/// SQL expression for the UTC calendar day an order was placed, as `YYYY-MM-DD` text.
fn order_day_expr(backend: DatabaseBackend) -> &'static str {
    match backend {
        DatabaseBackend::Postgres => "to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD')",
        DatabaseBackend::MySql => "DATE_FORMAT(created_at, '%Y-%m-%d')",
        DatabaseBackend::Sqlite => "date(created_at)",
    }
}

/// Dashboard figures for administrators.
#[derive(Clone)]
pub struct ReportService {
    db: Arc<DatabaseConnection>,
}

impl ReportService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Cancelled orders count towards `ordersCount` but not towards revenue.
    #[instrument(skip(self))]
    pub async fn admin_stats(&self) -> Result<AdminStats, ServiceError> {
        let db = &*self.db;
        let users_count = user::Entity::find().count(db).await?;
        let products_count = product::Entity::find().count(db).await?;
        let orders_count = order::Entity::find().count(db).await?;

        let total_revenue = order::Entity::find()
            .select_only()
            .column_as(order::Column::TotalPrice.sum(), "revenue")
            .filter(order::Column::Status.ne(OrderStatus::Cancelled))
            .into_tuple::<Option<Decimal>>()
            .one(db)
            .await?
            .flatten()
            .unwrap_or_default();

        Ok(AdminStats {
            users_count,
            products_count,
            orders_count,
            total_revenue,
            daily_sales: self.recent_daily_sales().await?,
        })
    }

    /// Non-cancelled sales grouped by UTC day in the database.
    async fn recent_daily_sales(&self) -> Result<Vec<DailySales>, ServiceError> {
        let db = &*self.db;
        let day = Expr::cust(order_day_expr(db.get_database_backend()));

        let rows = order::Entity::find()
            .select_only()
            .column_as(day.clone(), "day")
            .column_as(order::Column::TotalPrice.sum(), "sales")
            .filter(order::Column::Status.ne(OrderStatus::Cancelled))
            .group_by(day.clone())
            .order_by_desc(day)
            .limit(DAILY_SALES_WINDOW as u64)
            .into_tuple::<(String, Decimal)>()
            .all(db)
            .await?;

        let days = rows
            .into_iter()
            .map(|(day, sales)| {
                NaiveDate::parse_from_str(&day, "%Y-%m-%d")
                    .map(|date| (date, sales))
                    .map_err(|e| {
                        ServiceError::InternalError(format!("unexpected order day {day:?}: {e}"))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(daily_sales(days))
    }
}
