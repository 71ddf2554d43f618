use axum::{http::StatusCode, response::IntoResponse, Json};

pub mod admin;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod reviews;

pub async fn health() -> axum::response::Response {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" }))).into_response()
}
