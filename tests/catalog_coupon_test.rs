mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use common::{money, shipping_address, TestApp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, IntoActiveModel};
use serde_json::json;
use storefront_api::entities::order::{self, LineItems, OrderStatus, PaymentMethod, ShippingAddress};
use uuid::Uuid;

/// Stores an order placed `days_ago` days before now.
async fn backdated_order(
    app: &TestApp,
    user_id: Uuid,
    days_ago: i64,
    total_price: Decimal,
    status: OrderStatus,
) {
    let placed = Utc::now() - Duration::days(days_ago);
    order::Model {
        id: Uuid::new_v4(),
        user_id,
        items: LineItems::default(),
        shipping_address: ShippingAddress::default(),
        payment_method: PaymentMethod::Online,
        total_price,
        is_paid: true,
        paid_at: Some(placed),
        status,
        is_delivered: false,
        delivered_at: None,
        version: 1,
        created_at: placed,
        updated_at: placed,
    }
    .into_active_model()
    .insert(&*app.state.db)
    .await
    .expect("insert backdated order");
}

#[tokio::test]
async fn root_and_health_respond() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let (status, health) = app.call(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "up");
    assert_eq!(health["database"]["status"], "up");
}

#[tokio::test]
async fn admin_manages_products() {
    let app = TestApp::new().await;
    let admin = app.admin().await;

    let (status, created) = app
        .call(
            Method::POST,
            "/api/products",
            Some(&admin.token),
            Some(json!({
                "name": "Magsafe Case",
                "price": "899",
                "category": "Cases",
                "images": ["https://cdn.example.com/case-1.jpg", "https://cdn.example.com/case-2.jpg"],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["image"], "https://cdn.example.com/case-1.jpg");
    assert_eq!(created["isAvailable"], true);
    let uri = format!("/api/products/{}", created["id"].as_str().expect("id"));

    let (status, listed) = app.call(Method::GET, "/api/products", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    let (status, updated) = app
        .call(Method::PUT, &uri, Some(&admin.token), Some(json!({ "price": "799", "tag": "Sale" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(money(&updated["price"]), dec!(799));
    assert_eq!(updated["tag"], "Sale");
    assert_eq!(updated["name"], "Magsafe Case");

    let (status, removed) = app.call(Method::DELETE, &uri, Some(&admin.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(removed["message"], "Product removed");

    let (status, body) = app.call(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Product not found");
}

#[tokio::test]
async fn product_writes_require_admin_and_valid_price() {
    let app = TestApp::new().await;
    let user = app.customer().await;
    let admin = app.admin().await;
    let body = json!({ "name": "Free Case", "price": "0", "category": "Cases" });

    let (status, _) = app
        .call(Method::POST, "/api/products", None, Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .call(Method::POST, "/api/products", Some(&user.token), Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, error) = app
        .call(Method::POST, "/api/products", Some(&admin.token), Some(body))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error["message"]
        .as_str()
        .is_some_and(|m| m.contains("Price must be greater than zero")));

    let (status, error) = app
        .call(
            Method::POST,
            "/api/products",
            Some(&admin.token),
            Some(json!({ "name": "Gold Case", "price": "100000000000000000000", "category": "Cases" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error["message"]
        .as_str()
        .is_some_and(|m| m.contains("Price exceeds the maximum allowed amount")));
}

#[tokio::test]
async fn coupon_lifecycle() {
    let app = TestApp::new().await;
    let admin = app.admin().await;

    let (status, coupon) = app
        .call(
            Method::POST,
            "/api/coupons",
            Some(&admin.token),
            Some(json!({ "code": "save10", "discountPercentage": 10 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{coupon}");
    assert_eq!(coupon["code"], "SAVE10");

    let (status, body) = app
        .call(
            Method::POST,
            "/api/coupons",
            Some(&admin.token),
            Some(json!({ "code": "SAVE10", "discountPercentage": 15 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Coupon code already exists");

    let (status, verified) = app
        .call(Method::POST, "/api/coupons/verify", None, Some(json!({ "code": "Save10" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verified, json!({ "code": "SAVE10", "discountPercentage": 10 }));

    let (status, listed) = app
        .call(Method::GET, "/api/coupons", Some(&admin.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    let uri = format!("/api/coupons/{}", coupon["id"].as_str().expect("id"));
    let (status, deleted) = app.call(Method::DELETE, &uri, Some(&admin.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["message"], "Coupon deleted");

    let (status, _) = app.call(Method::DELETE, &uri, Some(&admin.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .call(Method::POST, "/api/coupons/verify", None, Some(json!({ "code": "SAVE10" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Invalid or expired coupon");
}

#[tokio::test]
async fn coupons_do_not_change_order_totals() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let user = app.customer().await;
    let product = app.seed_product("Phone Case", dec!(500)).await;
    app.call(
        Method::POST,
        "/api/coupons",
        Some(&admin.token),
        Some(json!({ "code": "HALF", "discountPercentage": 50 })),
    )
    .await;

    let (_, order) = app
        .call(
            Method::POST,
            "/api/orders",
            Some(&user.token),
            Some(json!({
                "items": [{ "product": product.id, "quantity": 1 }],
                "shippingAddress": shipping_address(),
                "couponCode": "HALF",
            })),
        )
        .await;
    assert_eq!(money(&order["totalPrice"]), dec!(500));
}

#[tokio::test]
async fn admin_stats_exclude_cancelled_revenue() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let user = app.customer().await;
    let case = app.seed_product("Phone Case", dec!(500)).await;
    let cable = app.seed_product("USB-C Cable", dec!(200)).await;

    let mut ids = Vec::new();
    for (product, quantity) in [(&case, 2), (&cable, 1)] {
        let (_, order) = app
            .call(
                Method::POST,
                "/api/orders",
                Some(&user.token),
                Some(json!({
                    "items": [{ "product": product.id, "quantity": quantity }],
                    "shippingAddress": shipping_address(),
                })),
            )
            .await;
        ids.push(order["id"].as_str().expect("id").to_string());
    }
    app.call(
        Method::PUT,
        &format!("/api/orders/{}/status", ids[1]),
        Some(&admin.token),
        Some(json!({ "status": "Cancelled" })),
    )
    .await;

    let (status, stats) = app
        .call(Method::GET, "/api/admin/stats", Some(&admin.token), None)
        .await;
    assert_eq!(status, StatusCode::OK, "{stats}");
    assert_eq!(stats["usersCount"], 2);
    assert_eq!(stats["productsCount"], 2);
    assert_eq!(stats["ordersCount"], 2);
    assert_eq!(money(&stats["totalRevenue"]), dec!(1000));

    let daily = stats["dailySales"].as_array().expect("dailySales");
    assert_eq!(daily.len(), 1);
    assert_eq!(money(&daily[0]["sales"]), dec!(1000));
    assert_eq!(
        daily[0]["date"],
        chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string()
    );
}

#[tokio::test]
async fn admin_stats_on_an_empty_store() {
    let app = TestApp::new().await;
    let admin = app.admin().await;

    let (status, stats) = app
        .call(Method::GET, "/api/admin/stats", Some(&admin.token), None)
        .await;
    assert_eq!(status, StatusCode::OK, "{stats}");
    assert_eq!(stats["ordersCount"], 0);
    assert_eq!(money(&stats["totalRevenue"]), Decimal::ZERO);
    assert_eq!(stats["dailySales"], json!([]));
}

#[tokio::test]
async fn daily_sales_cover_the_latest_week() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let user = app.customer().await;

    for days_ago in 0..9 {
        let total = Decimal::from(10 * (days_ago + 1));
        backdated_order(&app, user.id, days_ago, total, OrderStatus::Delivered).await;
    }
    backdated_order(&app, user.id, 0, dec!(1000), OrderStatus::Cancelled).await;

    let (status, stats) = app
        .call(Method::GET, "/api/admin/stats", Some(&admin.token), None)
        .await;
    assert_eq!(status, StatusCode::OK, "{stats}");
    assert_eq!(stats["ordersCount"], 10);
    assert_eq!(money(&stats["totalRevenue"]), dec!(450));

    let daily = stats["dailySales"].as_array().expect("dailySales");
    assert_eq!(daily.len(), 7);
    let day = |days_ago: i64| {
        (Utc::now() - Duration::days(days_ago))
            .date_naive()
            .format("%Y-%m-%d")
            .to_string()
    };
    assert_eq!(daily[0]["date"], day(6));
    assert_eq!(money(&daily[0]["sales"]), dec!(70));
    assert_eq!(daily[6]["date"], day(0));
    assert_eq!(money(&daily[6]["sales"]), dec!(10));
}

#[tokio::test]
async fn unsupported_methods_are_not_allowed() {
    let app = TestApp::new().await;
    let admin = app.admin().await;

    for token in [None, Some(admin.token.as_str())] {
        let response = app.request(Method::PATCH, "/api/products", token, None).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    let response = app.request(Method::PATCH, "/api/coupons", None, None).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
