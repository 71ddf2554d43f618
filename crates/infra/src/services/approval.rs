//! Staff approval workflow for product listings.

use chrono::Utc;

use bazaar_auth::{require_staff, Principal};
use bazaar_catalog::Product;
use bazaar_core::{DomainError, ProductId};

use super::ServiceResult;
use crate::store::Store;

#[derive(Clone)]
pub struct ApprovalService<S> {
    store: S,
}

impl<S: Store> ApprovalService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The review queue: every listing currently `pending`.
    pub async fn pending(&self, principal: &Principal) -> ServiceResult<Vec<Product>> {
        require_staff(principal)?;
        Ok(self.store.pending_products().await?)
    }

    /// Approve a listing, making it publicly visible. Approving an already
    /// approved listing is a no-op rather than an error.
    pub async fn approve(&self, principal: &Principal, id: ProductId) -> ServiceResult<Product> {
        require_staff(principal)?;
        let mut product = self.store.product(id).await?.ok_or(DomainError::NotFound)?;
        product.approve(Utc::now());
        self.store.update_product(product.clone()).await?;
        tracing::info!(product = %id, staff = %principal.user_id, "product approved");
        Ok(product)
    }

    /// Reject a listing from any state, hiding it from the catalog.
    pub async fn reject(&self, principal: &Principal, id: ProductId) -> ServiceResult<Product> {
        require_staff(principal)?;
        let mut product = self.store.product(id).await?.ok_or(DomainError::NotFound)?;
        product.reject(Utc::now());
        self.store.update_product(product.clone()).await?;
        tracing::info!(product = %id, staff = %principal.user_id, "product rejected");
        Ok(product)
    }
}
