//! HTTP application wiring (Axum router + service wiring).
//!
//! - `routes/`: HTTP routes and handlers, one file per area
//! - `dto.rs`: request bodies and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};

use bazaar_auth::{Hs256JwtValidator, JwtValidator};
use bazaar_infra::{Services, Store};

use crate::middleware::{self, AuthState};

pub mod dto;
pub mod errors;
pub mod routes;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(jwt_secret: String, store: Arc<dyn Store>) -> Router {
    let jwt: Arc<dyn JwtValidator> = Arc::new(Hs256JwtValidator::new(jwt_secret.into_bytes()));
    let auth_state = AuthState { jwt };

    let services = Services::new(store);

    // Public catalog pages; a valid token attaches the viewer, anonymous is fine.
    let public = routes::catalog::public_router().layer(axum::middleware::from_fn_with_state(
        auth_state.clone(),
        middleware::optional_auth_middleware,
    ));

    // Everything else requires authentication.
    let protected = Router::new()
        .merge(routes::catalog::seller_router())
        .merge(routes::cart::router())
        .merge(routes::orders::router())
        .merge(routes::reviews::router())
        .nest("/admin", routes::admin::router())
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::health))
        .merge(public)
        .merge(protected)
        .layer(Extension(services))
}
