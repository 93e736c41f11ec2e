use axum::{
    extract::{Path, State},
    response::{Json, Response},
};

use crate::{
    entities::product::Model as ProductModel,
    errors::ServiceError,
    handlers::common::{created_response, parse_id, ValidatedJson},
    services::catalog::{CreateProductRequest, MessageResponse, UpdateProductRequest},
    AppState,
};

const PRODUCT_NOT_FOUND: &str = "Product not found";

pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductModel>>, ServiceError> {
    Ok(Json(state.services.catalog.list_products().await?))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductModel>, ServiceError> {
    let id = parse_id(&id, PRODUCT_NOT_FOUND)?;
    Ok(Json(state.services.catalog.get_product(id).await?))
}

pub async fn create_product(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateProductRequest>,
) -> Result<Response, ServiceError> {
    let product = state.services.catalog.create_product(request).await?;
    Ok(created_response(product))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateProductRequest>,
) -> Result<Json<ProductModel>, ServiceError> {
    let id = parse_id(&id, PRODUCT_NOT_FOUND)?;
    Ok(Json(state.services.catalog.update_product(id, request).await?))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ServiceError> {
    let id = parse_id(&id, PRODUCT_NOT_FOUND)?;
    Ok(Json(state.services.catalog.delete_product(id).await?))
}
