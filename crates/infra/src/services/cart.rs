//! Cart and wishlist management.

use chrono::Utc;

use bazaar_auth::Principal;
use bazaar_cart::{cart_total, CartLine, UpdateOutcome, WishlistEntry};
use bazaar_catalog::Product;
use bazaar_core::{CartLineId, DomainError, Money, ProductId};

use super::ServiceResult;
use crate::store::Store;

/// The cart page: lines joined with their current products plus a total
/// computed fresh from current prices.
#[derive(Debug, Clone)]
pub struct CartView {
    pub lines: Vec<(CartLine, Product)>,
    pub total: Money,
}

#[derive(Clone)]
pub struct CartService<S> {
    store: S,
}

impl<S: Store> CartService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Add a product to the caller's cart. Re-adding accumulates into the
    /// existing line. Only approved listings can be carted, and sellers
    /// cannot cart their own.
    pub async fn add(
        &self,
        principal: &Principal,
        product_id: ProductId,
        quantity: u32,
    ) -> ServiceResult<CartLine> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be at least 1").into());
        }
        let product = self
            .store
            .product(product_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        if !product.is_approved() {
            return Err(DomainError::NotFound.into());
        }
        if product.seller == principal.user_id {
            return Err(DomainError::PermissionDenied.into());
        }
        Ok(self
            .store
            .add_to_cart(principal.user_id, product_id, quantity)
            .await?)
    }

    pub async fn view(&self, principal: &Principal) -> ServiceResult<CartView> {
        let lines = self.store.cart_lines(principal.user_id).await?;
        let total = cart_total(&lines)?;
        Ok(CartView { lines, total })
    }

    /// Overwrite a line's quantity; zero removes the line.
    pub async fn update(
        &self,
        principal: &Principal,
        line_id: CartLineId,
        quantity: u32,
    ) -> ServiceResult<()> {
        let mut line = self.owned_line(principal, line_id).await?;
        match line.set_quantity(quantity, Utc::now()) {
            UpdateOutcome::Removed => self.store.delete_cart_line(line_id).await?,
            UpdateOutcome::Updated => self.store.set_cart_quantity(line_id, quantity).await?,
        }
        Ok(())
    }

    pub async fn remove(&self, principal: &Principal, line_id: CartLineId) -> ServiceResult<()> {
        self.owned_line(principal, line_id).await?;
        Ok(self.store.delete_cart_line(line_id).await?)
    }

    /// Add to wishlist; returns `false` when the product was already there.
    pub async fn wishlist_add(
        &self,
        principal: &Principal,
        product_id: ProductId,
    ) -> ServiceResult<bool> {
        let product = self
            .store
            .product(product_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        if !product.is_approved() {
            return Err(DomainError::NotFound.into());
        }
        let entry = WishlistEntry::new(principal.user_id, product_id, Utc::now());
        Ok(self.store.add_to_wishlist(entry).await?)
    }

    pub async fn wishlist_remove(
        &self,
        principal: &Principal,
        product_id: ProductId,
    ) -> ServiceResult<()> {
        Ok(self
            .store
            .remove_from_wishlist(principal.user_id, product_id)
            .await?)
    }

    pub async fn wishlist(
        &self,
        principal: &Principal,
    ) -> ServiceResult<Vec<(WishlistEntry, Product)>> {
        Ok(self.store.wishlist(principal.user_id).await?)
    }

    /// Lines are addressed by id but only ever the caller's own; anyone
    /// else's id behaves as missing.
    async fn owned_line(
        &self,
        principal: &Principal,
        line_id: CartLineId,
    ) -> ServiceResult<CartLine> {
        let line = self
            .store
            .cart_line(line_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        if line.user != principal.user_id {
            return Err(DomainError::NotFound.into());
        }
        Ok(line)
    }
}
