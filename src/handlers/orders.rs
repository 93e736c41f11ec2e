use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    response::{IntoResponse, Json, Response},
};

use crate::{
    auth::AuthUser,
    entities::order::Model as OrderModel,
    errors::ServiceError,
    handlers::common::{created_response, parse_id, PaginatedOrders, PaginationParams, ValidatedJson},
    services::orders::{CreateOrderRequest, UpdateOrderStatusRequest},
    AppState,
};

const ORDER_NOT_FOUND: &str = "Order not found";

/// `POST /api/orders`
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<CreateOrderRequest>,
) -> Result<Response, ServiceError> {
    let placed = state
        .services
        .orders
        .create_order(user.user_id, request)
        .await?;
    Ok(created_response(placed))
}

/// `GET /api/orders/myorders`
pub async fn my_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<OrderModel>>, ServiceError> {
    let orders = state.services.orders.list_user_orders(user.user_id).await?;
    Ok(Json(orders))
}

/// `GET /api/orders/all-orders`: a plain array unless `page` or `limit` is given.
pub async fn all_orders(
    State(state): State<AppState>,
    query: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<Response, ServiceError> {
    let params = PaginationParams::from_query(query)?;
    let page = params.page_request(&state.config);
    let listing = state.services.orders.list_all_orders(page).await?;

    Ok(match page {
        None => Json(listing.rows).into_response(),
        Some(page) => Json(PaginatedOrders::new(listing.rows, page, listing.total)).into_response(),
    })
}

/// `GET /api/orders/:id`
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<OrderModel>, ServiceError> {
    let order_id = parse_id(&id, ORDER_NOT_FOUND)?;
    let order = state
        .services
        .orders
        .get_order(order_id, user.user_id, user.is_admin)
        .await?;
    Ok(Json(order))
}

/// `PUT /api/orders/:id/status`
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateOrderStatusRequest>,
) -> Result<Json<OrderModel>, ServiceError> {
    let order_id = parse_id(&id, ORDER_NOT_FOUND)?;
    let order = state
        .services
        .orders
        .update_order_status(order_id, request.status)
        .await?;
    Ok(Json(order))
}
