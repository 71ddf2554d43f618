//! Catalog browsing (public) and seller listing management.

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use bazaar_catalog::{Pagination, ProductDraft};
use bazaar_core::{CategoryId, Money, ProductId};
use bazaar_infra::Services;

use crate::app::{dto, errors};
use crate::context::CurrentUser;

pub fn public_router() -> Router {
    Router::new()
        .route("/catalog/home", get(home))
        .route("/catalog/search", get(search))
        .route("/catalog/categories", get(categories))
        .route("/catalog/categories/:slug", get(category_products))
        .route("/catalog/products/:id", get(product_detail))
}

pub fn seller_router() -> Router {
    Router::new()
        .route("/seller/products", post(create_product).get(seller_dashboard))
        .route(
            "/seller/products/:id",
            axum::routing::put(update_product).delete(delete_product),
        )
        .route("/seller/categories", post(create_category))
}

fn pagination(page: Option<u32>, per_page: Option<u32>) -> Pagination {
    Pagination::new(page.unwrap_or(1), per_page.unwrap_or(12))
}

fn parse_product_id(id: &str) -> Result<ProductId, axum::response::Response> {
    id.parse().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id")
    })
}

fn parse_draft(body: dto::ProductRequest) -> Result<ProductDraft, axum::response::Response> {
    let price: Money = body.price.parse().map_err(|_| {
        errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "price must be a decimal amount with at most two fractional digits",
        )
    })?;
    Ok(ProductDraft {
        name: body.name,
        description: body.description,
        price,
        quantity: body.quantity,
        category: CategoryId::from_uuid(body.category),
        is_featured: body.is_featured,
    })
}

pub async fn home(Extension(services): Extension<Services>) -> axum::response::Response {
    match services.catalog.home().await {
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

pub async fn search(
    Extension(services): Extension<Services>,
    Query(params): Query<dto::SearchParams>,
) -> axum::response::Response {
    let page = pagination(params.page, params.per_page);
    match services.catalog.search(&params.q, page).await {
        Ok(results) => (StatusCode::OK, Json(dto::product_page_to_json(&results))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn categories(Extension(services): Extension<Services>) -> axum::response::Response {
    match services.catalog.categories().await {
        Ok(categories) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "items": categories.iter().map(dto::category_to_json).collect::<Vec<_>>(),
            })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn category_products(
    Extension(services): Extension<Services>,
    Path(slug): Path<String>,
    Query(params): Query<dto::PageParams>,
) -> axum::response::Response {
    let page = pagination(params.page, params.per_page);
    match services.catalog.category_products(&slug, page).await {
        Ok((category, products)) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "category": dto::category_to_json(&category),
                "products": dto::product_page_to_json(&products),
            })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn product_detail(
    Extension(services): Extension<Services>,
    viewer: Option<Extension<CurrentUser>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let principal = viewer.as_ref().map(|Extension(u)| u.principal());
    match services.catalog.product_detail(principal, id).await {
        Ok(detail) => (StatusCode::OK, Json(dto::product_detail_to_json(&detail))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn seller_dashboard(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
) -> axum::response::Response {
    match services.catalog.seller_dashboard(user.principal()).await {
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

pub async fn create_product(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<dto::ProductRequest>,
) -> axum::response::Response {
    let draft = match parse_draft(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.catalog.create_product(user.principal(), draft).await {
        Ok(product) => (StatusCode::CREATED, Json(dto::product_to_json(&product))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_category(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<dto::CategoryRequest>,
) -> axum::response::Response {
    match services
        .catalog
        .create_category(user.principal(), &body.name, &body.description)
        .await
    {
        Ok(category) => {
            (StatusCode::CREATED, Json(dto::category_to_json(&category))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_product(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(body): Json<dto::ProductRequest>,
) -> axum::response::Response {
    let id = match parse_product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let edit = match parse_draft(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services
        .catalog
        .update_product(user.principal(), id, edit)
        .await
    {
        Ok(product) => (StatusCode::OK, Json(dto::product_to_json(&product))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_product(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.catalog.delete_product(user.principal(), id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
