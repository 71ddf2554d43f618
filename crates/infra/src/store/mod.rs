//! Storage boundary.
//!
//! One trait, two backends: [`InMemoryStore`] for tests/dev and
//! [`PostgresStore`] for production. Implementations must make every
//! compound method atomic — in particular [`Store::commit_checkout`], which
//! re-validates stock inside its unit of work so that two concurrent
//! checkouts can never both decrement past zero.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use bazaar_auth::User;
use bazaar_cart::{CartLine, WishlistEntry};
use bazaar_catalog::{Category, Page, Pagination, Product, ProductFilter};
use bazaar_core::{CartLineId, OrderId, ProductId, UserId};
use bazaar_orders::{Order, OrderStatus, StockShortage};
use bazaar_reviews::Review;

mod in_memory;
mod postgres;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;

/// Store operation error (infrastructure-level).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced row does not exist.
    #[error("not found")]
    NotFound,

    /// Unique-key or state conflict (duplicate slug, duplicate order number).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The atomic stock re-check inside checkout failed; every offending
    /// product is listed.
    #[error("insufficient stock for {} product(s)", .0.len())]
    InsufficientStock(Vec<StockShortage>),

    /// Backend failure (connection, serialization, lock poisoning).
    #[error("store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence boundary consumed by the services.
///
/// Queries that feed the public catalog only ever return approved listings;
/// owner/staff views use the dedicated methods.
#[async_trait]
pub trait Store: Send + Sync {
    // ── users ──────────────────────────────────────────────────────────
    async fn insert_user(&self, user: User) -> StoreResult<()>;
    async fn user(&self, id: UserId) -> StoreResult<Option<User>>;

    // ── categories ─────────────────────────────────────────────────────
    /// Fails with `Conflict` when the slug is taken.
    async fn insert_category(&self, category: Category) -> StoreResult<()>;
    async fn category_by_slug(&self, slug: &str) -> StoreResult<Option<Category>>;
    async fn categories(&self) -> StoreResult<Vec<Category>>;

    // ── products ───────────────────────────────────────────────────────
    async fn insert_product(&self, product: Product) -> StoreResult<()>;
    async fn product(&self, id: ProductId) -> StoreResult<Option<Product>>;
    /// Full-row replacement; `NotFound` if the product does not exist.
    async fn update_product(&self, product: Product) -> StoreResult<()>;
    /// Hard delete with explicit cascade: cart lines, wishlist entries and
    /// reviews referencing the product go with it. Order items are
    /// snapshots and survive.
    async fn delete_product(&self, id: ProductId) -> StoreResult<()>;
    /// Approved listings only, newest first.
    async fn approved_products(
        &self,
        filter: &ProductFilter,
        page: Pagination,
    ) -> StoreResult<Page<Product>>;
    async fn products_by_seller(&self, seller: UserId) -> StoreResult<Vec<Product>>;
    /// Staff queue, newest first.
    async fn pending_products(&self) -> StoreResult<Vec<Product>>;

    // ── cart ───────────────────────────────────────────────────────────
    /// Upsert by (user, product): existing lines accumulate quantity.
    async fn add_to_cart(
        &self,
        user: UserId,
        product: ProductId,
        quantity: u32,
    ) -> StoreResult<CartLine>;
    async fn cart_lines(&self, user: UserId) -> StoreResult<Vec<(CartLine, Product)>>;
    async fn cart_line(&self, id: CartLineId) -> StoreResult<Option<CartLine>>;
    /// Overwrites the quantity (callers handle the zero-deletes rule).
    async fn set_cart_quantity(&self, id: CartLineId, quantity: u32) -> StoreResult<()>;
    async fn delete_cart_line(&self, id: CartLineId) -> StoreResult<()>;

    // ── wishlist ───────────────────────────────────────────────────────
    /// Returns `false` when the entry already existed.
    async fn add_to_wishlist(&self, entry: WishlistEntry) -> StoreResult<bool>;
    async fn remove_from_wishlist(&self, user: UserId, product: ProductId) -> StoreResult<()>;
    async fn wishlist(&self, user: UserId) -> StoreResult<Vec<(WishlistEntry, Product)>>;

    // ── orders ─────────────────────────────────────────────────────────
    /// The single place requiring transactional atomicity: persist the
    /// order with its item snapshots, conditionally decrement stock for
    /// each item (failing the whole operation with `InsufficientStock` if
    /// any product can no longer cover its line), bump sales counters,
    /// flip `out_of_stock` at zero and clear the buyer's cart. All or
    /// nothing.
    async fn commit_checkout(&self, order: Order) -> StoreResult<()>;
    async fn orders_for_user(&self, user: UserId) -> StoreResult<Vec<Order>>;
    async fn order(&self, id: OrderId) -> StoreResult<Option<Order>>;
    async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> StoreResult<()>;

    // ── reviews ────────────────────────────────────────────────────────
    /// Upsert keyed on (user, product).
    async fn upsert_review(&self, review: Review) -> StoreResult<()>;
    async fn review_by(&self, user: UserId, product: ProductId) -> StoreResult<Option<Review>>;
    async fn reviews_for_product(&self, product: ProductId) -> StoreResult<Vec<Review>>;
    /// Proof of purchase: an order item for this (user, product) under an
    /// order whose status confers eligibility.
    async fn has_purchased(&self, user: UserId, product: ProductId) -> StoreResult<bool>;
}

#[async_trait]
impl<S> Store for Arc<S>
where
    S: Store + ?Sized,
{
    async fn insert_user(&self, user: User) -> StoreResult<()> {
        (**self).insert_user(user).await
    }
    async fn user(&self, id: UserId) -> StoreResult<Option<User>> {
        (**self).user(id).await
    }
    async fn insert_category(&self, category: Category) -> StoreResult<()> {
        (**self).insert_category(category).await
    }
    async fn category_by_slug(&self, slug: &str) -> StoreResult<Option<Category>> {
        (**self).category_by_slug(slug).await
    }
    async fn categories(&self) -> StoreResult<Vec<Category>> {
        (**self).categories().await
    }
    async fn insert_product(&self, product: Product) -> StoreResult<()> {
        (**self).insert_product(product).await
    }
    async fn product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        (**self).product(id).await
    }
    async fn update_product(&self, product: Product) -> StoreResult<()> {
        (**self).update_product(product).await
    }
    async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        (**self).delete_product(id).await
    }
    async fn approved_products(
        &self,
        filter: &ProductFilter,
        page: Pagination,
    ) -> StoreResult<Page<Product>> {
        (**self).approved_products(filter, page).await
    }
    async fn products_by_seller(&self, seller: UserId) -> StoreResult<Vec<Product>> {
        (**self).products_by_seller(seller).await
    }
    async fn pending_products(&self) -> StoreResult<Vec<Product>> {
        (**self).pending_products().await
    }
    async fn add_to_cart(
        &self,
        user: UserId,
        product: ProductId,
        quantity: u32,
    ) -> StoreResult<CartLine> {
        (**self).add_to_cart(user, product, quantity).await
    }
    async fn cart_lines(&self, user: UserId) -> StoreResult<Vec<(CartLine, Product)>> {
        (**self).cart_lines(user).await
    }
    async fn cart_line(&self, id: CartLineId) -> StoreResult<Option<CartLine>> {
        (**self).cart_line(id).await
    }
    async fn set_cart_quantity(&self, id: CartLineId, quantity: u32) -> StoreResult<()> {
        (**self).set_cart_quantity(id, quantity).await
    }
    async fn delete_cart_line(&self, id: CartLineId) -> StoreResult<()> {
        (**self).delete_cart_line(id).await
    }
    async fn add_to_wishlist(&self, entry: WishlistEntry) -> StoreResult<bool> {
        (**self).add_to_wishlist(entry).await
    }
    async fn remove_from_wishlist(&self, user: UserId, product: ProductId) -> StoreResult<()> {
        (**self).remove_from_wishlist(user, product).await
    }
    async fn wishlist(&self, user: UserId) -> StoreResult<Vec<(WishlistEntry, Product)>> {
        (**self).wishlist(user).await
    }
    async fn commit_checkout(&self, order: Order) -> StoreResult<()> {
        (**self).commit_checkout(order).await
    }
    async fn orders_for_user(&self, user: UserId) -> StoreResult<Vec<Order>> {
        (**self).orders_for_user(user).await
    }
    async fn order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        (**self).order(id).await
    }
    async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> StoreResult<()> {
        (**self).update_order_status(id, status).await
    }
    async fn upsert_review(&self, review: Review) -> StoreResult<()> {
        (**self).upsert_review(review).await
    }
    async fn review_by(&self, user: UserId, product: ProductId) -> StoreResult<Option<Review>> {
        (**self).review_by(user, product).await
    }
    async fn reviews_for_product(&self, product: ProductId) -> StoreResult<Vec<Review>> {
        (**self).reviews_for_product(product).await
    }
    async fn has_purchased(&self, user: UserId, product: ProductId) -> StoreResult<bool> {
        (**self).has_purchased(user, product).await
    }
}
