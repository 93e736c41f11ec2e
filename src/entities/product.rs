use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

/// Catalog product. Orders never reference these rows after placement; they
/// carry their own name/price snapshot.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub image: Option<String>,
    pub images: ImageList,
    pub category: String,
    pub brand: Option<String>,
    pub compatibility: Option<String>,
    pub color: Option<String>,
    pub material: Option<String>,
    pub tag: Option<String>,
    pub rating: Decimal,
    pub reviews: i32,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Already-hosted image URLs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct ImageList(pub Vec<String>);
