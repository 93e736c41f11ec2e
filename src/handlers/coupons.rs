use axum::{
    extract::{Path, State},
    response::{Json, Response},
};

use crate::{
    entities::coupon::Model as CouponModel,
    errors::ServiceError,
    handlers::common::{created_response, parse_id, ValidatedJson},
    services::{
        catalog::MessageResponse,
        coupons::{CreateCouponRequest, VerifiedCoupon, VerifyCouponRequest},
    },
    AppState,
};

pub async fn list_coupons(
    State(state): State<AppState>,
) -> Result<Json<Vec<CouponModel>>, ServiceError> {
    Ok(Json(state.services.coupons.list_coupons().await?))
}

pub async fn create_coupon(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateCouponRequest>,
) -> Result<Response, ServiceError> {
    let coupon = state.services.coupons.create_coupon(request).await?;
    Ok(created_response(coupon))
}

pub async fn delete_coupon(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ServiceError> {
    let id = parse_id(&id, "Coupon not found")?;
    Ok(Json(state.services.coupons.delete_coupon(id).await?))
}

/// Public: lets the storefront show a discount before checkout.
pub async fn verify_coupon(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<VerifyCouponRequest>,
) -> Result<Json<VerifiedCoupon>, ServiceError> {
    Ok(Json(state.services.coupons.verify_coupon(request).await?))
}
