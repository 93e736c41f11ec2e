use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    SqlErr,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::entities::coupon;
use crate::errors::ServiceError;
use crate::services::catalog::MessageResponse;

const COUPON_EXISTS: &str = "Coupon code already exists";
const INVALID_COUPON: &str = "Invalid or expired coupon";

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCouponRequest {
    #[validate(length(min = 1, max = 40, message = "Coupon code is required"))]
    pub code: String,
    #[validate(range(min = 1, max = 100, message = "Discount must be between 1 and 100"))]
    pub discount_percentage: i32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VerifyCouponRequest {
    #[validate(length(min = 1, message = "Coupon code is required"))]
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedCoupon {
    pub code: String,
    pub discount_percentage: i32,
}

fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Discount codes. Verification only reports the discount; order totals are
/// never adjusted by a coupon.
#[derive(Clone)]
pub struct CouponService {
    db: Arc<DatabaseConnection>,
}

impl CouponService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list_coupons(&self) -> Result<Vec<coupon::Model>, ServiceError> {
        Ok(coupon::Entity::find()
            .order_by_desc(coupon::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, request), fields(code = %request.code))]
    pub async fn create_coupon(
        &self,
        request: CreateCouponRequest,
    ) -> Result<coupon::Model, ServiceError> {
        request.validate()?;
        let code = normalize_code(&request.code);

        let exists = coupon::Entity::find()
            .filter(coupon::Column::Code.eq(code.as_str()))
            .one(&*self.db)
            .await?
            .is_some();
        if exists {
            return Err(ServiceError::AlreadyExists(COUPON_EXISTS.to_string()));
        }

        let now = Utc::now();
        let created = coupon::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code),
            discount_percentage: Set(request.discount_percentage),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                ServiceError::AlreadyExists(COUPON_EXISTS.to_string())
            }
            _ => ServiceError::DatabaseError(e),
        })?;

        info!(coupon_id = %created.id, code = %created.code, "coupon created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn delete_coupon(&self, id: Uuid) -> Result<MessageResponse, ServiceError> {
        let result = coupon::Entity::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound("Coupon not found".to_string()));
        }
        info!(coupon_id = %id, "coupon deleted");
        Ok(MessageResponse::new("Coupon deleted"))
    }

    /// Case-insensitive lookup of an active coupon.
    #[instrument(skip(self, request))]
    pub async fn verify_coupon(
        &self,
        request: VerifyCouponRequest,
    ) -> Result<VerifiedCoupon, ServiceError> {
        request.validate()?;
        let coupon = coupon::Entity::find()
            .filter(coupon::Column::Code.eq(normalize_code(&request.code)))
            .filter(coupon::Column::IsActive.eq(true))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(INVALID_COUPON.to_string()))?;

        Ok(VerifiedCoupon {
            code: coupon.code,
            discount_percentage: coupon.discount_percentage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_upper_cased_and_trimmed() {
        assert_eq!(normalize_code(" save10 "), "SAVE10");
    }

    #[test]
    fn discount_outside_range_is_rejected() {
        for discount in [0, 101] {
            let request = CreateCouponRequest {
                code: "SAVE".into(),
                discount_percentage: discount,
            };
            assert!(request.validate().is_err(), "discount {discount}");
        }
    }
}
