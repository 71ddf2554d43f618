//! Staff endpoints: the approval queue.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use bazaar_core::ProductId;
use bazaar_infra::Services;

use crate::app::{dto, errors};
use crate::context::CurrentUser;

pub fn router() -> Router {
    Router::new()
        .route("/products/pending", get(pending_products))
        .route("/products/:id/approve", post(approve_product))
        .route("/products/:id/reject", post(reject_product))
}

fn parse_product_id(id: &str) -> Result<ProductId, axum::response::Response> {
    id.parse().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id")
    })
}

pub async fn pending_products(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
) -> axum::response::Response {
    match services.approval.pending(user.principal()).await {
        Ok(products) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "items": products.iter().map(dto::product_to_json).collect::<Vec<_>>(),
            })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn approve_product(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.approval.approve(user.principal(), id).await {
        Ok(product) => (StatusCode::OK, Json(dto::product_to_json(&product))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn reject_product(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.approval.reject(user.principal(), id).await {
        Ok(product) => (StatusCode::OK, Json(dto::product_to_json(&product))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

