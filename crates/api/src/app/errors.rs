use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use bazaar_core::DomainError;
use bazaar_infra::ServiceError;
use bazaar_orders::CheckoutError;

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Domain(e) => domain_error_to_response(e),
        ServiceError::Authz(e) => json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string()),
        ServiceError::Checkout(e) => checkout_error_to_response(e),
        ServiceError::Store(msg) => {
            tracing::error!(error = %msg, "storage failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                "internal storage failure",
            )
        }
    }
}

fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DomainError::PermissionDenied => {
            json_error(StatusCode::FORBIDDEN, "forbidden", "permission denied")
        }
    }
}

/// Checkout failures are unprocessable requests, not bad syntax; the body
/// carries enough structure for a client to render per-product messages.
fn checkout_error_to_response(err: CheckoutError) -> axum::response::Response {
    match err {
        CheckoutError::EmptyCart => (
            StatusCode::UNPROCESSABLE_ENTITY,
            axum::Json(json!({
                "error": "empty_cart",
                "message": err.to_string(),
            })),
        )
            .into_response(),
        CheckoutError::SelfPurchase { ref products } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            axum::Json(json!({
                "error": "self_purchase",
                "message": err.to_string(),
                "products": products,
            })),
        )
            .into_response(),
        CheckoutError::InsufficientStock { ref shortages } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            axum::Json(json!({
                "error": "insufficient_stock",
                "message": err.to_string(),
                "shortages": shortages
                    .iter()
                    .map(|s| json!({
                        "product": s.product.to_string(),
                        "name": s.product_name,
                        "requested": s.requested,
                        "available": s.available,
                    }))
                    .collect::<Vec<_>>(),
            })),
        )
            .into_response(),
        CheckoutError::Domain(e) => domain_error_to_response(e),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
