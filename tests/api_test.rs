mod common;

use axum::http::{Method, StatusCode};
use common::{notebook_specs, read_json, TestApp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use std::str::FromStr;

#[tokio::test]
async fn status_endpoint_reports_ok() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/status", None, &[]).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn health_endpoint_pings_the_database() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/health", None, &[]).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["data"]["checks"]["database"], "healthy");
}

#[tokio::test]
async fn latest_rejects_unknown_kinds_but_tolerates_unknown_prioritize() {
    let app = TestApp::new().await;
    app.seed_product("NB", "nb", dec!(1000.00), notebook_specs())
        .await;

    let response = app
        .request(
            Method::GET,
            "/api/v1/catalog/latest?kinds=notebook,toaster",
            None,
            &[],
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request(
            Method::GET,
            "/api/v1/catalog/latest?kinds=notebook&prioritize=toaster",
            None,
            &[],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    let items = body.as_array().expect("latest returns an array");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["kind"], "notebook");
}

#[tokio::test]
async fn product_detail_carries_its_display_url() {
    let app = TestApp::new().await;
    app.seed_product("ThinkBook", "thinkbook", dec!(1000.00), notebook_specs())
        .await;

    let response = app
        .request(Method::GET, "/api/v1/products/notebook/thinkbook", None, &[])
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["url"], "/products/notebook/thinkbook");
    assert_eq!(body["title"], "ThinkBook");

    let response = app
        .request(Method::GET, "/api/v1/products/notebook/missing", None, &[])
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .request(Method::GET, "/api/v1/products/toaster/thinkbook", None, &[])
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cart_requires_an_owner_header() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/cart", None, &[]).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request(
            Method::GET,
            "/api/v1/cart",
            None,
            &[("x-customer-id", "not-a-uuid")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cart_flow_over_http() {
    let app = TestApp::new().await;
    let notebook = app
        .seed_product("Aero 14", "aero-14", dec!(1250.00), notebook_specs())
        .await;
    let session = [("x-session-id", "sess-http")];

    // First touch creates an empty active cart.
    let response = app.request(Method::GET, "/api/v1/cart", None, &session).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["cart"]["total_products"], 0);
    assert!(body["lines"].as_array().unwrap().is_empty());

    // Add two notebooks.
    let response = app
        .request(
            Method::POST,
            "/api/v1/cart/items",
            Some(json!({
                "kind": "notebook",
                "product_id": notebook.id,
                "quantity": 2,
            })),
            &session,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["total_products"], 2);
    let final_price = Decimal::from_str(body["final_price"].as_str().unwrap()).unwrap();
    assert_eq!(final_price, dec!(2500.00));

    // An unknown kind in the payload is rejected.
    let response = app
        .request(
            Method::POST,
            "/api/v1/cart/items",
            Some(json!({
                "kind": "toaster",
                "product_id": notebook.id,
            })),
            &session,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Checkout, then the cart refuses mutations.
    let response = app
        .request(Method::POST, "/api/v1/cart/checkout", None, &session)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["status"], "ordered");

    // The next cart request hands out a fresh empty cart.
    let response = app.request(Method::GET, "/api/v1/cart", None, &session).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["cart"]["total_products"], 0);
}

#[tokio::test]
async fn removing_a_line_over_http_returns_no_content() {
    let app = TestApp::new().await;
    let notebook = app
        .seed_product("Swift 16", "swift-16", dec!(950.00), notebook_specs())
        .await;
    let session = [("x-session-id", "sess-del")];

    app.request(
        Method::POST,
        "/api/v1/cart/items",
        Some(json!({
            "kind": "notebook",
            "product_id": notebook.id,
        })),
        &session,
    )
    .await;

    let response = app.request(Method::GET, "/api/v1/cart", None, &session).await;
    let body = read_json(response).await;
    let line_id = body["lines"][0]["id"].as_str().unwrap().to_string();

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/cart/items/{}", line_id),
            None,
            &session,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.request(Method::GET, "/api/v1/cart", None, &session).await;
    let body = read_json(response).await;
    assert_eq!(body["cart"]["total_products"], 0);
}

#[tokio::test]
async fn customer_endpoints_round_trip() {
    let app = TestApp::new().await;
    let user_id = uuid::Uuid::new_v4();

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/customers?user_id={}", user_id),
            None,
            &[],
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .request(
            Method::POST,
            "/api/v1/customers",
            Some(json!({
                "user_id": user_id,
                "phone": "+1-555-0100",
            })),
            &[],
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json(response).await;
    let customer_id = body["id"].as_str().unwrap().to_string();

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/customers/{}/contact", customer_id),
            Some(json!({ "address": "42 Elm Street" })),
            &[],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["address"], "42 Elm Street");
    assert_eq!(body["phone"], "+1-555-0100");
}
