use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::entities::max_money;
use crate::entities::product::{self, ImageList};
use crate::errors::ServiceError;

const PRODUCT_NOT_FOUND: &str = "Product not found";

fn validate_positive_price(price: &Decimal) -> Result<(), ValidationError> {
    if !price.is_sign_positive() || price.is_zero() {
        let mut err = ValidationError::new("positive_price");
        err.message = Some("Price must be greater than zero".into());
        return Err(err);
    }
    if *price > max_money() {
        let mut err = ValidationError::new("price_too_large");
        err.message = Some("Price exceeds the maximum allowed amount".into());
        return Err(err);
    }
    Ok(())
}

fn validate_rating(rating: &Decimal) -> Result<(), ValidationError> {
    if *rating >= Decimal::ZERO && *rating <= Decimal::from(5) {
        Ok(())
    } else {
        let mut err = ValidationError::new("rating_range");
        err.message = Some("Rating must be between 0 and 5".into());
        Err(err)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 200, message = "Product name is required"))]
    pub name: String,
    #[validate(custom = "validate_positive_price")]
    pub price: Decimal,
    #[validate(custom = "validate_positive_price")]
    pub original_price: Option<Decimal>,
    pub image: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,
    pub brand: Option<String>,
    pub compatibility: Option<String>,
    pub color: Option<String>,
    pub material: Option<String>,
    pub tag: Option<String>,
    #[validate(custom = "validate_rating")]
    pub rating: Option<Decimal>,
    #[validate(range(min = 0))]
    pub reviews: Option<i32>,
    pub description: Option<String>,
    pub is_available: Option<bool>,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(custom = "validate_positive_price")]
    pub price: Option<Decimal>,
    #[validate(custom = "validate_positive_price")]
    pub original_price: Option<Decimal>,
    pub image: Option<String>,
    pub images: Option<Vec<String>>,
    #[validate(length(min = 1))]
    pub category: Option<String>,
    pub brand: Option<String>,
    pub compatibility: Option<String>,
    pub color: Option<String>,
    pub material: Option<String>,
    pub tag: Option<String>,
    #[validate(custom = "validate_rating")]
    pub rating: Option<Decimal>,
    #[validate(range(min = 0))]
    pub reviews: Option<i32>,
    pub description: Option<String>,
    pub is_available: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Product catalog administration and browsing.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn find(&self, id: Uuid) -> Result<product::Model, ServiceError> {
        product::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(PRODUCT_NOT_FOUND.to_string()))
    }

    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<product::Model>, ServiceError> {
        Ok(product::Entity::find()
            .order_by_desc(product::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, id: Uuid) -> Result<product::Model, ServiceError> {
        self.find(id).await
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_product(
        &self,
        request: CreateProductRequest,
    ) -> Result<product::Model, ServiceError> {
        request.validate()?;
        let now = Utc::now();
        let image = request
            .image
            .filter(|url| !url.trim().is_empty())
            .or_else(|| request.images.first().cloned());

        let created = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name.trim().to_string()),
            price: Set(request.price),
            original_price: Set(request.original_price),
            image: Set(image),
            images: Set(ImageList(request.images)),
            category: Set(request.category),
            brand: Set(request.brand),
            compatibility: Set(request.compatibility),
            color: Set(request.color),
            material: Set(request.material),
            tag: Set(request.tag),
            rating: Set(request.rating.unwrap_or_default()),
            reviews: Set(request.reviews.unwrap_or(0)),
            description: Set(request.description),
            is_available: Set(request.is_available.unwrap_or(true)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(product_id = %created.id, price = %created.price, "product created");
        Ok(created)
    }

    #[instrument(skip(self, request))]
    pub async fn update_product(
        &self,
        id: Uuid,
        request: UpdateProductRequest,
    ) -> Result<product::Model, ServiceError> {
        request.validate()?;
        let existing = self.find(id).await?;
        let mut active: product::ActiveModel = existing.into();

        if let Some(name) = request.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(price) = request.price {
            active.price = Set(price);
        }
        if let Some(original_price) = request.original_price {
            active.original_price = Set(Some(original_price));
        }
        if let Some(images) = request.images {
            active.images = Set(ImageList(images));
        }
        if let Some(image) = request.image {
            active.image = Set(Some(image));
        }
        if let Some(category) = request.category {
            active.category = Set(category);
        }
        if request.brand.is_some() {
            active.brand = Set(request.brand);
        }
        if request.compatibility.is_some() {
            active.compatibility = Set(request.compatibility);
        }
        if request.color.is_some() {
            active.color = Set(request.color);
        }
        if request.material.is_some() {
            active.material = Set(request.material);
        }
        if request.tag.is_some() {
            active.tag = Set(request.tag);
        }
        if let Some(rating) = request.rating {
            active.rating = Set(rating);
        }
        if let Some(reviews) = request.reviews {
            active.reviews = Set(reviews);
        }
        if request.description.is_some() {
            active.description = Set(request.description);
        }
        if let Some(is_available) = request.is_available {
            active.is_available = Set(is_available);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db).await?;
        info!(product_id = %updated.id, "product updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: Uuid) -> Result<MessageResponse, ServiceError> {
        let existing = self.find(id).await?;
        existing.delete(&*self.db).await?;
        info!(product_id = %id, "product removed");
        Ok(MessageResponse::new("Product removed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn create_request(price: Decimal) -> CreateProductRequest {
        CreateProductRequest {
            name: "Phone Case".into(),
            price,
            original_price: None,
            image: None,
            images: vec![],
            category: "Cases".into(),
            brand: None,
            compatibility: None,
            color: None,
            material: None,
            tag: None,
            rating: None,
            reviews: None,
            description: None,
            is_available: None,
        }
    }

    #[test]
    fn price_must_be_positive() {
        assert!(create_request(dec!(499)).validate().is_ok());
        assert!(create_request(dec!(0)).validate().is_err());
        assert!(create_request(dec!(-1)).validate().is_err());
    }

    #[test]
    fn price_must_fit_the_money_column() {
        assert!(create_request(max_money()).validate().is_ok());
        assert!(create_request(dec!(1000000000000)).validate().is_err());
        assert!(create_request(dec!(100000000000000000000)).validate().is_err());
    }

    #[test]
    fn update_validates_only_present_fields() {
        assert!(UpdateProductRequest::default().validate().is_ok());
        let bad = UpdateProductRequest {
            price: Some(dec!(0)),
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        let bad_rating = UpdateProductRequest {
            rating: Some(dec!(5.5)),
            ..Default::default()
        };
        assert!(bad_rating.validate().is_err());
    }
}
