//! Review submission and listing.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use bazaar_core::ProductId;
use bazaar_infra::Services;

use crate::app::{dto, errors};
use crate::context::CurrentUser;

pub fn router() -> Router {
    Router::new().route(
        "/catalog/products/:id/reviews",
        post(submit_review).get(product_reviews),
    )
}

pub async fn submit_review(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(body): Json<dto::ReviewRequest>,
) -> axum::response::Response {
    let product: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id")
        }
    };
    match services
        .reviews
        .submit(user.principal(), product, body.rating, &body.comment)
        .await
    {
        Ok(review) => (StatusCode::CREATED, Json(dto::review_to_json(&review))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn product_reviews(
    Extension(services): Extension<Services>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let product: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id")
        }
    };
    match services.reviews.for_product(product).await {
        Ok(reviews) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "items": reviews.iter().map(dto::review_to_json).collect::<Vec<_>>(),
            })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
