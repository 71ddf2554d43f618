//! Router-level tests: token handling, status codes and the main buy flow.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use bazaar_auth::{Hs256JwtValidator, JwtClaims, Principal, Role};
use bazaar_core::UserId;
use bazaar_infra::{InMemoryStore, Store};

const SECRET: &[u8] = b"test-secret";

fn app() -> Router {
    let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
    bazaar_api::app::build_app(String::from_utf8(SECRET.to_vec()).unwrap(), store)
}

fn token_for(principal: &Principal) -> String {
    let validator = Hs256JwtValidator::new(SECRET.to_vec());
    let now = Utc::now();
    validator
        .issue(&JwtClaims {
            sub: principal.user_id,
            role: principal.role,
            is_staff: principal.is_staff,
            is_superuser: principal.is_superuser,
            issued_at: now,
            expires_at: now + Duration::hours(1),
        })
        .unwrap()
}

fn get(path: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn send_json(method: &str, path: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let response = app().oneshot(get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_reject_missing_and_garbage_tokens() {
    let app = app();
    let response = app.clone().oneshot(get("/cart", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(get("/cart", Some("not-a-jwt")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_routes_require_staff_not_just_a_token() {
    let app = app();
    let buyer = token_for(&Principal::new(UserId::new(), Role::Buyer));
    let response = app
        .oneshot(get("/admin/products/pending", Some(&buyer)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn full_buy_flow_over_http() {
    let app = app();
    let staff = token_for(&Principal::staff(UserId::new(), Role::Buyer));
    let seller = token_for(&Principal::new(UserId::new(), Role::Seller));
    let buyer = token_for(&Principal::new(UserId::new(), Role::Buyer));

    // Sellers manage categories; buyers are turned away.
    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/seller/categories",
            &buyer,
            json!({ "name": "Furniture" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/seller/categories",
            &seller,
            json!({ "name": "Furniture" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let category = body_json(response).await["id"].as_str().unwrap().to_string();

    // Seller lists a product; it starts pending and is invisible to others.
    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/seller/products",
            &seller,
            json!({
                "name": "Walnut desk",
                "description": "Solid wood",
                "price": "70.00",
                "quantity": 5,
                "category": category,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let product = body_json(response).await["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(get(&format!("/catalog/products/{product}"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Staff approves; the listing becomes public.
    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            &format!("/admin/products/{product}/approve"),
            &staff,
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get(&format!("/catalog/products/{product}"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Buyer carts one and checks out cash-on-delivery.
    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/cart",
            &buyer,
            json!({ "product": product, "quantity": 1 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/checkout",
            &buyer,
            json!({ "address": "12 Canal Street", "pin_code": "560001" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let order = body_json(response).await;
    assert_eq!(order["total_amount"], "70.00");
    assert_eq!(order["status"], "confirmed");
    assert!(order["order_number"].as_str().unwrap().starts_with("ORD"));

    // Checking out an empty cart is unprocessable.
    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/checkout",
            &buyer,
            json!({ "address": "12 Canal Street", "pin_code": "560001" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["error"], "empty_cart");

    // And the purchase unlocks a review, which then shows up on the list.
    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            &format!("/catalog/products/{product}/reviews"),
            &buyer,
            json!({ "rating": 5, "comment": "sturdy" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(get(
            &format!("/catalog/products/{product}/reviews"),
            Some(&buyer),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let reviews = body_json(response).await;
    assert_eq!(reviews["items"].as_array().unwrap().len(), 1);
    assert_eq!(reviews["items"][0]["rating"], 5);
}
