//! Application services.
//!
//! Each service owns one workflow slice and speaks [`Store`] underneath.
//! Authorization runs here (via `bazaar-auth` gates) so handlers stay thin.

use std::sync::Arc;

use thiserror::Error;

use bazaar_auth::AuthzError;
use bazaar_core::DomainError;
use bazaar_orders::CheckoutError;

use crate::store::{Store, StoreError};

mod approval;
mod cart;
mod catalog;
mod checkout;
mod orders;
mod reviews;

pub use approval::ApprovalService;
pub use cart::{CartService, CartView};
pub use catalog::{CatalogService, ProductDetail};
pub use checkout::CheckoutService;
pub use orders::OrderService;
pub use reviews::ReviewService;

/// Service-level failure taxonomy; the API layer maps these to responses.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Authz(#[from] AuthzError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error("storage failure: {0}")]
    Store(String),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ServiceError::Domain(DomainError::not_found()),
            StoreError::Conflict(msg) => ServiceError::Domain(DomainError::conflict(msg)),
            StoreError::InsufficientStock(shortages) => {
                ServiceError::Checkout(CheckoutError::InsufficientStock { shortages })
            }
            StoreError::Backend(msg) => ServiceError::Store(msg),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Shared handle to the full service set, wired over one store.
#[derive(Clone)]
pub struct Services {
    pub catalog: CatalogService<Arc<dyn Store>>,
    pub approval: ApprovalService<Arc<dyn Store>>,
    pub cart: CartService<Arc<dyn Store>>,
    pub checkout: CheckoutService<Arc<dyn Store>>,
    pub orders: OrderService<Arc<dyn Store>>,
    pub reviews: ReviewService<Arc<dyn Store>>,
}

impl Services {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            catalog: CatalogService::new(store.clone()),
            approval: ApprovalService::new(store.clone()),
            cart: CartService::new(store.clone()),
            checkout: CheckoutService::new(store.clone()),
            orders: OrderService::new(store.clone()),
            reviews: ReviewService::new(store),
        }
    }
}
