//! Cart, wishlist and checkout endpoints.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use bazaar_core::{CartLineId, ProductId};
use bazaar_infra::Services;
use bazaar_orders::{CheckoutDraft, PaymentMethod};

use crate::app::{dto, errors};
use crate::context::CurrentUser;

pub fn router() -> Router {
    Router::new()
        .route("/cart", get(view_cart).post(add_to_cart))
        .route(
            "/cart/:id",
            axum::routing::put(update_line).delete(remove_line),
        )
        .route("/wishlist", get(view_wishlist))
        .route(
            "/wishlist/:product_id",
            post(add_to_wishlist).delete(remove_from_wishlist),
        )
        .route("/checkout", post(checkout))
}

pub async fn view_cart(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
) -> axum::response::Response {
    match services.cart.view(user.principal()).await {
        Ok(view) => (StatusCode::OK, Json(dto::cart_view_to_json(&view))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn add_to_cart(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<dto::AddToCartRequest>,
) -> axum::response::Response {
    let product = ProductId::from_uuid(body.product);
    match services
        .cart
        .add(user.principal(), product, body.quantity)
        .await
    {
        Ok(line) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "id": line.id.to_string(),
                "quantity": line.quantity,
            })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_line(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateCartRequest>,
) -> axum::response::Response {
    let id: CartLineId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid line id")
        }
    };
    match services
        .cart
        .update(user.principal(), id, body.quantity)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn remove_line(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: CartLineId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid line id")
        }
    };
    match services.cart.remove(user.principal(), id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn view_wishlist(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
) -> axum::response::Response {
    match services.cart.wishlist(user.principal()).await {
        Ok(entries) => (StatusCode::OK, Json(dto::wishlist_to_json(&entries))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn add_to_wishlist(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path(product_id): Path<String>,
) -> axum::response::Response {
    let product: ProductId = match product_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id")
        }
    };
    match services.cart.wishlist_add(user.principal(), product).await {
        Ok(added) => (
            StatusCode::OK,
            Json(serde_json::json!({ "added": added })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn remove_from_wishlist(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path(product_id): Path<String>,
) -> axum::response::Response {
    let product: ProductId = match product_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id")
        }
    };
    match services
        .cart
        .wishlist_remove(user.principal(), product)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn checkout(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<dto::CheckoutRequest>,
) -> axum::response::Response {
    let payment_method = match body.payment_method.as_deref() {
        None => PaymentMethod::CashOnDelivery,
        Some(s) => match PaymentMethod::parse(s) {
            Ok(v) => v,
            Err(e) => {
                return errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "validation_error",
                    e.to_string(),
                )
            }
        },
    };
    let draft = CheckoutDraft {
        address: body.address,
        pin_code: body.pin_code,
        payment_method,
    };
    match services.checkout.checkout(user.principal(), draft).await {
        Ok(order) => (StatusCode::CREATED, Json(dto::order_to_json(&order))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
