use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use bazaar_auth::User;
use bazaar_cart::{CartLine, WishlistEntry};
use bazaar_catalog::{Category, Page, Pagination, Product, ProductFilter};
use bazaar_core::{CartLineId, CategoryId, OrderId, ProductId, UserId};
use bazaar_orders::{Order, OrderStatus, StockShortage};
use bazaar_reviews::Review;

use super::{Store, StoreError, StoreResult};

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, User>,
    categories: HashMap<CategoryId, Category>,
    products: HashMap<ProductId, Product>,
    cart: HashMap<CartLineId, CartLine>,
    wishlist: Vec<WishlistEntry>,
    orders: HashMap<OrderId, Order>,
    reviews: HashMap<(UserId, ProductId), Review>,
}

/// In-memory store.
///
/// Intended for tests/dev. Compound operations take the single write lock
/// for their whole duration, which gives them the same all-or-nothing
/// behavior the Postgres backend gets from transactions.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }
}

fn newest_first(products: &mut [Product]) {
    products.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.as_uuid().cmp(a.id.as_uuid())));
}

#[async_trait]
impl Store for InMemoryStore {
    async fn insert_user(&self, user: User) -> StoreResult<()> {
        let mut state = self.write()?;
        if state.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict(format!(
                "username taken: {}",
                user.username
            )));
        }
        state.users.insert(user.id, user);
        Ok(())
    }

    async fn user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn insert_category(&self, category: Category) -> StoreResult<()> {
        let mut state = self.write()?;
        if state.categories.values().any(|c| c.slug == category.slug) {
            return Err(StoreError::Conflict(format!(
                "category slug taken: {}",
                category.slug
            )));
        }
        state.categories.insert(category.id, category);
        Ok(())
    }

    async fn category_by_slug(&self, slug: &str) -> StoreResult<Option<Category>> {
        Ok(self
            .read()?
            .categories
            .values()
            .find(|c| c.slug == slug)
            .cloned())
    }

    async fn categories(&self) -> StoreResult<Vec<Category>> {
        let mut all: Vec<Category> = self.read()?.categories.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn insert_product(&self, product: Product) -> StoreResult<()> {
        self.write()?.products.insert(product.id, product);
        Ok(())
    }

    async fn product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        Ok(self.read()?.products.get(&id).cloned())
    }

    async fn update_product(&self, product: Product) -> StoreResult<()> {
        let mut state = self.write()?;
        if !state.products.contains_key(&product.id) {
            return Err(StoreError::NotFound);
        }
        state.products.insert(product.id, product);
        Ok(())
    }

    async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        let mut state = self.write()?;
        if state.products.remove(&id).is_none() {
            return Err(StoreError::NotFound);
        }
        // Explicit cascade; order items keep their snapshots.
        state.cart.retain(|_, line| line.product != id);
        state.wishlist.retain(|entry| entry.product != id);
        state.reviews.retain(|(_, product), _| *product != id);
        Ok(())
    }

    async fn approved_products(
        &self,
        filter: &ProductFilter,
        page: Pagination,
    ) -> StoreResult<Page<Product>> {
        let state = self.read()?;
        let mut matches: Vec<Product> = state
            .products
            .values()
            .filter(|p| p.is_approved() && filter.matches(p))
            .cloned()
            .collect();
        newest_first(&mut matches);
        Ok(Page::slice(matches, page))
    }

    async fn products_by_seller(&self, seller: UserId) -> StoreResult<Vec<Product>> {
        let state = self.read()?;
        let mut products: Vec<Product> = state
            .products
            .values()
            .filter(|p| p.seller == seller)
            .cloned()
            .collect();
        newest_first(&mut products);
        Ok(products)
    }

    async fn pending_products(&self) -> StoreResult<Vec<Product>> {
        let state = self.read()?;
        let mut products: Vec<Product> = state
            .products
            .values()
            .filter(|p| p.approval_status == bazaar_catalog::ApprovalStatus::Pending)
            .cloned()
            .collect();
        newest_first(&mut products);
        Ok(products)
    }

    async fn add_to_cart(
        &self,
        user: UserId,
        product: ProductId,
        quantity: u32,
    ) -> StoreResult<CartLine> {
        let now = Utc::now();
        let mut state = self.write()?;
        if let Some(line) = state
            .cart
            .values_mut()
            .find(|l| l.user == user && l.product == product)
        {
            line.accumulate(quantity, now)
                .map_err(|e| StoreError::Backend(e.to_string()))?;
            return Ok(line.clone());
        }
        let line = CartLine::new(CartLineId::new(), user, product, quantity, now)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        state.cart.insert(line.id, line.clone());
        Ok(line)
    }

    async fn cart_lines(&self, user: UserId) -> StoreResult<Vec<(CartLine, Product)>> {
        let state = self.read()?;
        let mut lines: Vec<(CartLine, Product)> = state
            .cart
            .values()
            .filter(|l| l.user == user)
            .filter_map(|l| state.products.get(&l.product).map(|p| (l.clone(), p.clone())))
            .collect();
        lines.sort_by(|a, b| b.0.created_at.cmp(&a.0.created_at));
        Ok(lines)
    }

    async fn cart_line(&self, id: CartLineId) -> StoreResult<Option<CartLine>> {
        Ok(self.read()?.cart.get(&id).cloned())
    }

    async fn set_cart_quantity(&self, id: CartLineId, quantity: u32) -> StoreResult<()> {
        let now = Utc::now();
        let mut state = self.write()?;
        let line = state.cart.get_mut(&id).ok_or(StoreError::NotFound)?;
        line.set_quantity(quantity, now);
        Ok(())
    }

    async fn delete_cart_line(&self, id: CartLineId) -> StoreResult<()> {
        let mut state = self.write()?;
        state.cart.remove(&id).ok_or(StoreError::NotFound)?;
        Ok(())
    }

    async fn add_to_wishlist(&self, entry: WishlistEntry) -> StoreResult<bool> {
        let mut state = self.write()?;
        if state
            .wishlist
            .iter()
            .any(|e| e.user == entry.user && e.product == entry.product)
        {
            return Ok(false);
        }
        state.wishlist.push(entry);
        Ok(true)
    }

    async fn remove_from_wishlist(&self, user: UserId, product: ProductId) -> StoreResult<()> {
        let mut state = self.write()?;
        let before = state.wishlist.len();
        state
            .wishlist
            .retain(|e| !(e.user == user && e.product == product));
        if state.wishlist.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn wishlist(&self, user: UserId) -> StoreResult<Vec<(WishlistEntry, Product)>> {
        let state = self.read()?;
        Ok(state
            .wishlist
            .iter()
            .filter(|e| e.user == user)
            .filter_map(|e| state.products.get(&e.product).map(|p| (e.clone(), p.clone())))
            .collect())
    }

    async fn commit_checkout(&self, order: Order) -> StoreResult<()> {
        let now = Utc::now();
        let mut state = self.write()?;

        if state
            .orders
            .values()
            .any(|o| o.order_number == order.order_number)
        {
            return Err(StoreError::Conflict(format!(
                "duplicate order number: {}",
                order.order_number
            )));
        }

        // Re-check stock under the write lock; stage the decrements and only
        // apply them if every line fits.
        let mut staged: Vec<Product> = Vec::with_capacity(order.items.len());
        let mut shortages: Vec<StockShortage> = Vec::new();
        for item in &order.items {
            match state.products.get(&item.product) {
                None => shortages.push(StockShortage {
                    product: item.product,
                    product_name: item.product_name.clone(),
                    requested: item.quantity,
                    available: 0,
                }),
                Some(product) => {
                    let mut product = product.clone();
                    if product.reserve(item.quantity, now).is_err() {
                        shortages.push(StockShortage {
                            product: item.product,
                            product_name: item.product_name.clone(),
                            requested: item.quantity,
                            available: product.quantity,
                        });
                    } else {
                        staged.push(product);
                    }
                }
            }
        }
        if !shortages.is_empty() {
            return Err(StoreError::InsufficientStock(shortages));
        }

        for product in staged {
            state.products.insert(product.id, product);
        }
        let buyer = order.user;
        state.cart.retain(|_, line| line.user != buyer);
        state.orders.insert(order.id, order);
        Ok(())
    }

    async fn orders_for_user(&self, user: UserId) -> StoreResult<Vec<Order>> {
        let state = self.read()?;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| o.user == user)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        Ok(self.read()?.orders.get(&id).cloned())
    }

    async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> StoreResult<()> {
        let mut state = self.write()?;
        let order = state.orders.get_mut(&id).ok_or(StoreError::NotFound)?;
        order.status = status;
        Ok(())
    }

    async fn upsert_review(&self, review: Review) -> StoreResult<()> {
        let mut state = self.write()?;
        state.reviews.insert((review.user, review.product), review);
        Ok(())
    }

    async fn review_by(&self, user: UserId, product: ProductId) -> StoreResult<Option<Review>> {
        Ok(self.read()?.reviews.get(&(user, product)).cloned())
    }

    async fn reviews_for_product(&self, product: ProductId) -> StoreResult<Vec<Review>> {
        let state = self.read()?;
        let mut reviews: Vec<Review> = state
            .reviews
            .values()
            .filter(|r| r.product == product)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }

    async fn has_purchased(&self, user: UserId, product: ProductId) -> StoreResult<bool> {
        let state = self.read()?;
        Ok(state.orders.values().any(|o| {
            o.user == user
                && bazaar_reviews::confers_eligibility(o.status)
                && o.items.iter().any(|item| item.product == product)
        }))
    }
}
