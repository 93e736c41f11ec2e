use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A placed order. Line items and the shipping address are stored inline so
/// that an order is written in a single row and never changes when the
/// catalog does.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    pub items: LineItems,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub total_price: Decimal,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub status: OrderStatus,
    pub is_delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    /// Optimistic concurrency token, bumped on every update.
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Order lifecycle status. Any status may be set from any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum OrderStatus {
    #[sea_orm(string_value = "Processing")]
    Processing,
    #[sea_orm(string_value = "Shipped")]
    Shipped,
    #[sea_orm(string_value = "Delivered")]
    Delivered,
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
}

impl Default for OrderStatus {
    fn default() -> Self {
        Self::Processing
    }
}

/// How the customer settles the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "Online")]
    Online,
    #[serde(rename = "COD")]
    #[sea_orm(string_value = "COD")]
    CashOnDelivery,
}

impl PaymentMethod {
    /// Interprets the free-form `paymentMethod` sent by clients: exactly
    /// `"COD"` selects cash on delivery, anything else (including nothing)
    /// is an online payment.
    pub fn from_request(raw: Option<&str>) -> Self {
        match raw {
            Some("COD") => Self::CashOnDelivery,
            _ => Self::Online,
        }
    }

    pub fn is_cash_on_delivery(self) -> bool {
        matches!(self, Self::CashOnDelivery)
    }
}

/// Price/name snapshot of a catalog product taken when the order was placed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineItem {
    pub product: Uuid,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
}

impl OrderLineItem {
    /// `None` when the product does not fit in a `Decimal`.
    pub fn line_total(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct LineItems(pub Vec<OrderLineItem>);

impl LineItems {
    pub fn iter(&self) -> std::slice::Iter<'_, OrderLineItem> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<OrderLineItem>> for LineItems {
    fn from(items: Vec<OrderLineItem>) -> Self {
        Self(items)
    }
}

/// Delivery destination, also reused for a customer's saved addresses.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate, FromJsonQueryResult,
)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingAddress {
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    #[validate(length(min = 1, message = "Phone is required"))]
    pub phone: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    #[serde(alias = "pincode")]
    #[validate(length(min = 1, message = "Postal code is required"))]
    pub postal_code: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn payment_method_only_exact_cod_is_cash_on_delivery() {
        assert_eq!(
            PaymentMethod::from_request(Some("COD")),
            PaymentMethod::CashOnDelivery
        );
        assert_eq!(PaymentMethod::from_request(None), PaymentMethod::Online);
        assert_eq!(PaymentMethod::from_request(Some("Online")), PaymentMethod::Online);
        assert_eq!(PaymentMethod::from_request(Some("cod")), PaymentMethod::Online);
        assert_eq!(PaymentMethod::from_request(Some("")), PaymentMethod::Online);
    }

    #[test]
    fn payment_method_wire_names() {
        assert_eq!(
            serde_json::to_value(PaymentMethod::CashOnDelivery).unwrap(),
            json!("COD")
        );
        assert_eq!(serde_json::to_value(PaymentMethod::Online).unwrap(), json!("Online"));
    }

    #[test]
    fn shipping_address_accepts_legacy_pincode() {
        let address: ShippingAddress = serde_json::from_value(json!({
            "fullName": "Asha Rao",
            "phone": "9000000000",
            "email": "asha@example.com",
            "address": "12 Hill Road",
            "city": "Pune",
            "pincode": "411001"
        }))
        .unwrap();
        assert_eq!(address.postal_code, "411001");
        assert!(address.validate().is_ok());
    }

    #[test]
    fn shipping_address_requires_every_field() {
        let address: ShippingAddress =
            serde_json::from_value(json!({ "fullName": "Asha Rao" })).unwrap();
        let errors = address.validate().unwrap_err();
        let fields = errors.field_errors();
        for field in ["phone", "email", "address", "city", "postal_code"] {
            assert!(fields.contains_key(field), "missing error for {field}");
        }
        assert!(!fields.contains_key("full_name"));
    }

    #[test]
    fn line_total_multiplies_snapshot_price() {
        let line = OrderLineItem {
            product: Uuid::new_v4(),
            name: "Case".into(),
            unit_price: dec!(499.50),
            quantity: 3,
        };
        assert_eq!(line.line_total(), Some(dec!(1498.50)));
    }

    #[test]
    fn line_total_overflow_is_none() {
        let line = OrderLineItem {
            product: Uuid::new_v4(),
            name: "Case".into(),
            unit_price: Decimal::MAX,
            quantity: 2,
        };
        assert_eq!(line.line_total(), None);
    }
}
