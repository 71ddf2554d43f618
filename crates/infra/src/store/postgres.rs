//! Postgres-backed store.
//!
//! Plain `sqlx::query` with manual row mapping; no compile-time macros so
//! the crate builds without a live database. The checkout path runs in one
//! transaction with a conditional stock decrement, which is what closes the
//! oversell race: two concurrent checkouts of the last unit serialize on the
//! row update and the loser's `UPDATE ... WHERE quantity >= n` matches zero
//! rows.
//!
//! ## Error mapping
//!
//! | SQLx error | Code | StoreError |
//! |------------|------|------------|
//! | unique violation | `23505` | `Conflict` |
//! | any other database error | — | `Backend` |
//! | pool/connection failures | — | `Backend` |

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};

use bazaar_auth::{Role, User};
use bazaar_cart::{CartLine, WishlistEntry};
use bazaar_catalog::{
    ApprovalStatus, Category, Page, Pagination, Product, ProductFilter, StockStatus,
};
use bazaar_core::{CartLineId, CategoryId, OrderId, ProductId, ReviewId, UserId};
use bazaar_orders::{
    Order, OrderNumber, OrderStatus, PaymentMethod, StockShortage,
};
use bazaar_reviews::Review;

use super::{Store, StoreError, StoreResult};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id              UUID PRIMARY KEY,
    username        TEXT NOT NULL UNIQUE,
    full_name       TEXT NOT NULL DEFAULT '',
    phone_number    TEXT NOT NULL DEFAULT '',
    email           TEXT NOT NULL DEFAULT '',
    role            TEXT NOT NULL,
    is_staff        BOOLEAN NOT NULL DEFAULT FALSE,
    is_superuser    BOOLEAN NOT NULL DEFAULT FALSE,
    created_at      TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS categories (
    id          UUID PRIMARY KEY,
    name        TEXT NOT NULL,
    slug        TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL DEFAULT '',
    created_at  TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS products (
    id              UUID PRIMARY KEY,
    seller_id       UUID NOT NULL REFERENCES users (id),
    category_id     UUID NOT NULL REFERENCES categories (id),
    name            TEXT NOT NULL,
    description     TEXT NOT NULL,
    price_cents     BIGINT NOT NULL CHECK (price_cents >= 0),
    quantity        BIGINT NOT NULL CHECK (quantity >= 0),
    stock_status    TEXT NOT NULL,
    approval_status TEXT NOT NULL,
    rating_centi    INTEGER NOT NULL DEFAULT 0,
    total_sells     BIGINT NOT NULL DEFAULT 0,
    is_featured     BOOLEAN NOT NULL DEFAULT FALSE,
    created_at      TIMESTAMPTZ NOT NULL,
    updated_at      TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_products_approval ON products (approval_status, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_products_seller ON products (seller_id);

CREATE TABLE IF NOT EXISTS cart_lines (
    id         UUID PRIMARY KEY,
    user_id    UUID NOT NULL REFERENCES users (id),
    product_id UUID NOT NULL REFERENCES products (id) ON DELETE CASCADE,
    quantity   BIGINT NOT NULL CHECK (quantity >= 1),
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL,
    UNIQUE (user_id, product_id)
);

CREATE TABLE IF NOT EXISTS wishlist (
    user_id    UUID NOT NULL REFERENCES users (id),
    product_id UUID NOT NULL REFERENCES products (id) ON DELETE CASCADE,
    created_at TIMESTAMPTZ NOT NULL,
    PRIMARY KEY (user_id, product_id)
);

CREATE TABLE IF NOT EXISTS orders (
    id             UUID PRIMARY KEY,
    user_id        UUID NOT NULL REFERENCES users (id),
    order_number   TEXT NOT NULL UNIQUE,
    address        TEXT NOT NULL,
    pin_code       TEXT NOT NULL,
    payment_method TEXT NOT NULL,
    total_cents    BIGINT NOT NULL,
    status         TEXT NOT NULL,
    delivery_date  DATE NOT NULL,
    created_at     TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_orders_user ON orders (user_id, created_at DESC);

CREATE TABLE IF NOT EXISTS order_items (
    order_id     UUID NOT NULL REFERENCES orders (id) ON DELETE CASCADE,
    product_id   UUID NOT NULL,
    product_name TEXT NOT NULL,
    quantity     BIGINT NOT NULL,
    price_cents  BIGINT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_order_items_order ON order_items (order_id);
CREATE INDEX IF NOT EXISTS idx_order_items_product ON order_items (product_id);

CREATE TABLE IF NOT EXISTS reviews (
    id         UUID PRIMARY KEY,
    user_id    UUID NOT NULL REFERENCES users (id),
    product_id UUID NOT NULL REFERENCES products (id) ON DELETE CASCADE,
    rating     INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
    comment    TEXT NOT NULL DEFAULT '',
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL,
    UNIQUE (user_id, product_id)
);
"#;

/// Postgres-backed store. The connection pool is internally shared and the
/// struct is cheap to clone.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded schema. Idempotent.
    pub async fn migrate(&self) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        for statement in SCHEMA.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("migrate", e))?;
        }
        tx.commit().await.map_err(|e| map_sqlx_error("migrate", e))
    }

    async fn order_items(&self, order: OrderId) -> StoreResult<Vec<bazaar_orders::OrderItem>> {
        let rows = sqlx::query(
            "SELECT product_id, product_name, quantity, price_cents
             FROM order_items WHERE order_id = $1",
        )
        .bind(*order.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("order_items", e))?;
        rows.iter().map(order_item_from_row).collect()
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("{operation}: {}", db_err.message());
            if db_err.code().as_deref() == Some("23505") {
                StoreError::Conflict(msg)
            } else {
                StoreError::Backend(msg)
            }
        }
        other => StoreError::Backend(format!("{operation}: {other}")),
    }
}

fn bad_row(what: &str, detail: impl core::fmt::Display) -> StoreError {
    StoreError::Backend(format!("bad {what} row: {detail}"))
}

fn user_from_row(row: &PgRow) -> StoreResult<User> {
    let role: String = row.try_get("role").map_err(|e| bad_row("user", e))?;
    Ok(User {
        id: UserId::from_uuid(row.try_get("id").map_err(|e| bad_row("user", e))?),
        username: row.try_get("username").map_err(|e| bad_row("user", e))?,
        full_name: row.try_get("full_name").map_err(|e| bad_row("user", e))?,
        phone_number: row
            .try_get("phone_number")
            .map_err(|e| bad_row("user", e))?,
        email: row.try_get("email").map_err(|e| bad_row("user", e))?,
        role: Role::parse(&role).map_err(|e| bad_row("user", e))?,
        is_staff: row.try_get("is_staff").map_err(|e| bad_row("user", e))?,
        is_superuser: row
            .try_get("is_superuser")
            .map_err(|e| bad_row("user", e))?,
        created_at: row.try_get("created_at").map_err(|e| bad_row("user", e))?,
    })
}

fn category_from_row(row: &PgRow) -> StoreResult<Category> {
    Ok(Category {
        id: CategoryId::from_uuid(row.try_get("id").map_err(|e| bad_row("category", e))?),
        name: row.try_get("name").map_err(|e| bad_row("category", e))?,
        slug: row.try_get("slug").map_err(|e| bad_row("category", e))?,
        description: row
            .try_get("description")
            .map_err(|e| bad_row("category", e))?,
        created_at: row
            .try_get("created_at")
            .map_err(|e| bad_row("category", e))?,
    })
}

fn product_from_row(row: &PgRow) -> StoreResult<Product> {
    let stock: String = row
        .try_get("stock_status")
        .map_err(|e| bad_row("product", e))?;
    let approval: String = row
        .try_get("approval_status")
        .map_err(|e| bad_row("product", e))?;
    let price: i64 = row
        .try_get("price_cents")
        .map_err(|e| bad_row("product", e))?;
    let quantity: i64 = row.try_get("quantity").map_err(|e| bad_row("product", e))?;
    let rating: i32 = row
        .try_get("rating_centi")
        .map_err(|e| bad_row("product", e))?;
    let total_sells: i64 = row
        .try_get("total_sells")
        .map_err(|e| bad_row("product", e))?;
    Ok(Product {
        id: ProductId::from_uuid(row.try_get("id").map_err(|e| bad_row("product", e))?),
        seller: UserId::from_uuid(row.try_get("seller_id").map_err(|e| bad_row("product", e))?),
        category: CategoryId::from_uuid(
            row.try_get("category_id")
                .map_err(|e| bad_row("product", e))?,
        ),
        name: row.try_get("name").map_err(|e| bad_row("product", e))?,
        description: row
            .try_get("description")
            .map_err(|e| bad_row("product", e))?,
        price: bazaar_core::Money::from_cents(price as u64),
        quantity: quantity as u32,
        stock_status: StockStatus::parse(&stock).map_err(|e| bad_row("product", e))?,
        approval_status: ApprovalStatus::parse(&approval).map_err(|e| bad_row("product", e))?,
        rating: rating as u16,
        total_sells: total_sells as u32,
        is_featured: row
            .try_get("is_featured")
            .map_err(|e| bad_row("product", e))?,
        created_at: row
            .try_get("created_at")
            .map_err(|e| bad_row("product", e))?,
        updated_at: row
            .try_get("updated_at")
            .map_err(|e| bad_row("product", e))?,
    })
}

fn cart_line_from_row(row: &PgRow) -> StoreResult<CartLine> {
    let quantity: i64 = row.try_get("quantity").map_err(|e| bad_row("cart", e))?;
    Ok(CartLine {
        id: CartLineId::from_uuid(row.try_get("id").map_err(|e| bad_row("cart", e))?),
        user: UserId::from_uuid(row.try_get("user_id").map_err(|e| bad_row("cart", e))?),
        product: ProductId::from_uuid(row.try_get("product_id").map_err(|e| bad_row("cart", e))?),
        quantity: quantity as u32,
        created_at: row.try_get("created_at").map_err(|e| bad_row("cart", e))?,
        updated_at: row.try_get("updated_at").map_err(|e| bad_row("cart", e))?,
    })
}

fn order_from_row(row: &PgRow, items: Vec<bazaar_orders::OrderItem>) -> StoreResult<Order> {
    let number: String = row
        .try_get("order_number")
        .map_err(|e| bad_row("order", e))?;
    let payment: String = row
        .try_get("payment_method")
        .map_err(|e| bad_row("order", e))?;
    let status: String = row.try_get("status").map_err(|e| bad_row("order", e))?;
    let total: i64 = row.try_get("total_cents").map_err(|e| bad_row("order", e))?;
    Ok(Order {
        id: OrderId::from_uuid(row.try_get("id").map_err(|e| bad_row("order", e))?),
        user: UserId::from_uuid(row.try_get("user_id").map_err(|e| bad_row("order", e))?),
        order_number: number.parse::<OrderNumber>().map_err(|e| bad_row("order", e))?,
        address: row.try_get("address").map_err(|e| bad_row("order", e))?,
        pin_code: row.try_get("pin_code").map_err(|e| bad_row("order", e))?,
        payment_method: PaymentMethod::parse(&payment).map_err(|e| bad_row("order", e))?,
        total_amount: bazaar_core::Money::from_cents(total as u64),
        status: OrderStatus::parse(&status).map_err(|e| bad_row("order", e))?,
        delivery_date: row
            .try_get("delivery_date")
            .map_err(|e| bad_row("order", e))?,
        created_at: row.try_get("created_at").map_err(|e| bad_row("order", e))?,
        items,
    })
}

fn order_item_from_row(row: &PgRow) -> StoreResult<bazaar_orders::OrderItem> {
    let quantity: i64 = row
        .try_get("quantity")
        .map_err(|e| bad_row("order item", e))?;
    let price: i64 = row
        .try_get("price_cents")
        .map_err(|e| bad_row("order item", e))?;
    Ok(bazaar_orders::OrderItem {
        product: ProductId::from_uuid(
            row.try_get("product_id")
                .map_err(|e| bad_row("order item", e))?,
        ),
        product_name: row
            .try_get("product_name")
            .map_err(|e| bad_row("order item", e))?,
        quantity: quantity as u32,
        price: bazaar_core::Money::from_cents(price as u64),
    })
}

fn review_from_row(row: &PgRow) -> StoreResult<Review> {
    let rating: i32 = row.try_get("rating").map_err(|e| bad_row("review", e))?;
    Ok(Review {
        id: ReviewId::from_uuid(row.try_get("id").map_err(|e| bad_row("review", e))?),
        user: UserId::from_uuid(row.try_get("user_id").map_err(|e| bad_row("review", e))?),
        product: ProductId::from_uuid(
            row.try_get("product_id")
                .map_err(|e| bad_row("review", e))?,
        ),
        rating: rating as u8,
        comment: row.try_get("comment").map_err(|e| bad_row("review", e))?,
        created_at: row.try_get("created_at").map_err(|e| bad_row("review", e))?,
        updated_at: row.try_get("updated_at").map_err(|e| bad_row("review", e))?,
    })
}

/// Reserve stock inside the checkout transaction for one order item.
///
/// Returns `Ok(true)` when the conditional decrement matched, `Ok(false)`
/// when the product no longer covers the line (or vanished).
async fn reserve_stock(
    tx: &mut Transaction<'_, Postgres>,
    product: ProductId,
    quantity: u32,
) -> StoreResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET quantity = quantity - $1,
            total_sells = total_sells + $1,
            stock_status = CASE WHEN quantity - $1 <= 0 THEN 'out_of_stock' ELSE stock_status END,
            updated_at = NOW()
        WHERE id = $2
          AND stock_status = 'in_stock'
          AND quantity >= $1
        "#,
    )
    .bind(quantity as i64)
    .bind(*product.as_uuid())
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("reserve_stock", e))?;
    Ok(result.rows_affected() == 1)
}

#[async_trait]
impl Store for PostgresStore {
    async fn insert_user(&self, user: User) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, full_name, phone_number, email, role,
                               is_staff, is_superuser, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(*user.id.as_uuid())
        .bind(&user.username)
        .bind(&user.full_name)
        .bind(&user.phone_number)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(user.is_staff)
        .bind(user.is_superuser)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;
        Ok(())
    }

    async fn user(&self, id: UserId) -> StoreResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("user", e))?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn insert_category(&self, category: Category) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO categories (id, name, slug, description, created_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(*category.id.as_uuid())
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.description)
        .bind(category.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_category", e))?;
        Ok(())
    }

    async fn category_by_slug(&self, slug: &str) -> StoreResult<Option<Category>> {
        let row = sqlx::query("SELECT * FROM categories WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("category_by_slug", e))?;
        row.as_ref().map(category_from_row).transpose()
    }

    async fn categories(&self) -> StoreResult<Vec<Category>> {
        let rows = sqlx::query("SELECT * FROM categories ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("categories", e))?;
        rows.iter().map(category_from_row).collect()
    }

    async fn insert_product(&self, product: Product) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, seller_id, category_id, name, description,
                                  price_cents, quantity, stock_status, approval_status,
                                  rating_centi, total_sells, is_featured,
                                  created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(*product.id.as_uuid())
        .bind(*product.seller.as_uuid())
        .bind(*product.category.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.cents() as i64)
        .bind(product.quantity as i64)
        .bind(product.stock_status.as_str())
        .bind(product.approval_status.as_str())
        .bind(product.rating as i32)
        .bind(product.total_sells as i64)
        .bind(product.is_featured)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;
        Ok(())
    }

    async fn product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        let row = sqlx::query("SELECT * FROM products WHERE id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("product", e))?;
        row.as_ref().map(product_from_row).transpose()
    }

    async fn update_product(&self, product: Product) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET category_id = $2, name = $3, description = $4, price_cents = $5,
                quantity = $6, stock_status = $7, approval_status = $8,
                rating_centi = $9, total_sells = $10, is_featured = $11,
                updated_at = $12
            WHERE id = $1
            "#,
        )
        .bind(*product.id.as_uuid())
        .bind(*product.category.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.cents() as i64)
        .bind(product.quantity as i64)
        .bind(product.stock_status.as_str())
        .bind(product.approval_status.as_str())
        .bind(product.rating as i32)
        .bind(product.total_sells as i64)
        .bind(product.is_featured)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_product", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        // Schema-level ON DELETE CASCADE removes cart lines, wishlist entries
        // and reviews; order items are deliberately unreferenced snapshots.
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn approved_products(
        &self,
        filter: &ProductFilter,
        page: Pagination,
    ) -> StoreResult<Page<Product>> {
        // Optional filters collapse to IS NULL checks so one parameterized
        // query covers every combination.
        let query = filter
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty());
        let category = filter.category.map(|c| *c.as_uuid());

        let conditions = r#"
            approval_status = 'approved'
            AND ($1::text IS NULL OR name ILIKE '%' || $1 || '%'
                                  OR description ILIKE '%' || $1 || '%')
            AND ($2::uuid IS NULL OR category_id = $2)
            AND (NOT $3 OR is_featured)
            AND (NOT $4 OR stock_status = 'in_stock')
        "#;

        let count_row = sqlx::query(&format!(
            "SELECT COUNT(*) AS total FROM products WHERE {conditions}"
        ))
        .bind(query)
        .bind(category)
        .bind(filter.featured_only)
        .bind(filter.in_stock_only)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("approved_products", e))?;
        let total: i64 = count_row
            .try_get("total")
            .map_err(|e| bad_row("count", e))?;

        let rows = sqlx::query(&format!(
            "SELECT * FROM products WHERE {conditions}
             ORDER BY created_at DESC, id DESC
             LIMIT $5 OFFSET $6"
        ))
        .bind(query)
        .bind(category)
        .bind(filter.featured_only)
        .bind(filter.in_stock_only)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("approved_products", e))?;

        let items = rows
            .iter()
            .map(product_from_row)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Page {
            items,
            total: total as u64,
            page: page.page,
            per_page: page.per_page,
        })
    }

    async fn products_by_seller(&self, seller: UserId) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query(
            "SELECT * FROM products WHERE seller_id = $1
             ORDER BY created_at DESC, id DESC",
        )
        .bind(*seller.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("products_by_seller", e))?;
        rows.iter().map(product_from_row).collect()
    }

    async fn pending_products(&self) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query(
            "SELECT * FROM products WHERE approval_status = 'pending'
             ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("pending_products", e))?;
        rows.iter().map(product_from_row).collect()
    }

    async fn add_to_cart(
        &self,
        user: UserId,
        product: ProductId,
        quantity: u32,
    ) -> StoreResult<CartLine> {
        let now = Utc::now();
        let row = sqlx::query(
            r#"
            INSERT INTO cart_lines (id, user_id, product_id, quantity, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET quantity = cart_lines.quantity + EXCLUDED.quantity,
                          updated_at = EXCLUDED.updated_at
            RETURNING *
            "#,
        )
        .bind(*CartLineId::new().as_uuid())
        .bind(*user.as_uuid())
        .bind(*product.as_uuid())
        .bind(quantity as i64)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("add_to_cart", e))?;
        cart_line_from_row(&row)
    }

    async fn cart_lines(&self, user: UserId) -> StoreResult<Vec<(CartLine, Product)>> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.user_id, c.product_id, c.quantity,
                   c.created_at, c.updated_at
            FROM cart_lines c
            WHERE c.user_id = $1
            ORDER BY c.created_at DESC
            "#,
        )
        .bind(*user.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("cart_lines", e))?;

        let mut joined = Vec::with_capacity(rows.len());
        for row in &rows {
            let line = cart_line_from_row(row)?;
            if let Some(product) = self.product(line.product).await? {
                joined.push((line, product));
            }
        }
        Ok(joined)
    }

    async fn cart_line(&self, id: CartLineId) -> StoreResult<Option<CartLine>> {
        let row = sqlx::query("SELECT * FROM cart_lines WHERE id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("cart_line", e))?;
        row.as_ref().map(cart_line_from_row).transpose()
    }

    async fn set_cart_quantity(&self, id: CartLineId, quantity: u32) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE cart_lines SET quantity = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(*id.as_uuid())
        .bind(quantity as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("set_cart_quantity", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_cart_line(&self, id: CartLineId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM cart_lines WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_cart_line", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn add_to_wishlist(&self, entry: WishlistEntry) -> StoreResult<bool> {
        let result = sqlx::query(
            "INSERT INTO wishlist (user_id, product_id, created_at)
             VALUES ($1, $2, $3)
             ON CONFLICT (user_id, product_id) DO NOTHING",
        )
        .bind(*entry.user.as_uuid())
        .bind(*entry.product.as_uuid())
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("add_to_wishlist", e))?;
        Ok(result.rows_affected() == 1)
    }

    async fn remove_from_wishlist(&self, user: UserId, product: ProductId) -> StoreResult<()> {
        let result = sqlx::query(
            "DELETE FROM wishlist WHERE user_id = $1 AND product_id = $2",
        )
        .bind(*user.as_uuid())
        .bind(*product.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("remove_from_wishlist", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn wishlist(&self, user: UserId) -> StoreResult<Vec<(WishlistEntry, Product)>> {
        let rows = sqlx::query(
            "SELECT user_id, product_id, created_at FROM wishlist
             WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(*user.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("wishlist", e))?;

        let mut joined = Vec::with_capacity(rows.len());
        for row in &rows {
            let entry = WishlistEntry {
                user: UserId::from_uuid(row.try_get("user_id").map_err(|e| bad_row("wishlist", e))?),
                product: ProductId::from_uuid(
                    row.try_get("product_id")
                        .map_err(|e| bad_row("wishlist", e))?,
                ),
                created_at: row
                    .try_get("created_at")
                    .map_err(|e| bad_row("wishlist", e))?,
            };
            if let Some(product) = self.product(entry.product).await? {
                joined.push((entry, product));
            }
        }
        Ok(joined)
    }

    async fn commit_checkout(&self, order: Order) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("commit_checkout", e))?;

        // 1. Conditionally decrement stock for every line. A line whose
        //    UPDATE matches no row is a shortage; collect them all before
        //    rolling back so the error names every offender.
        let mut shortages: Vec<StockShortage> = Vec::new();
        for item in &order.items {
            if !reserve_stock(&mut tx, item.product, item.quantity).await? {
                let available: i64 =
                    sqlx::query("SELECT quantity FROM products WHERE id = $1")
                        .bind(*item.product.as_uuid())
                        .fetch_optional(&mut *tx)
                        .await
                        .map_err(|e| map_sqlx_error("commit_checkout", e))?
                        .map(|row| row.try_get("quantity"))
                        .transpose()
                        .map_err(|e| bad_row("product", e))?
                        .unwrap_or(0);
                shortages.push(StockShortage {
                    product: item.product,
                    product_name: item.product_name.clone(),
                    requested: item.quantity,
                    available: available.max(0) as u32,
                });
            }
        }
        if !shortages.is_empty() {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("commit_checkout", e))?;
            return Err(StoreError::InsufficientStock(shortages));
        }

        // 2. Persist the order and its item snapshots. A duplicate order
        //    number surfaces as 23505 -> Conflict; the caller regenerates.
        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, order_number, address, pin_code,
                                payment_method, total_cents, status,
                                delivery_date, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(*order.id.as_uuid())
        .bind(*order.user.as_uuid())
        .bind(order.order_number.as_str())
        .bind(&order.address)
        .bind(&order.pin_code)
        .bind(order.payment_method.as_str())
        .bind(order.total_amount.cents() as i64)
        .bind(order.status.as_str())
        .bind(order.delivery_date)
        .bind(order.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("commit_checkout", e))?;

        for item in &order.items {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, product_name, quantity, price_cents)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(*order.id.as_uuid())
            .bind(*item.product.as_uuid())
            .bind(&item.product_name)
            .bind(item.quantity as i64)
            .bind(item.price.cents() as i64)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("commit_checkout", e))?;
        }

        // 3. Clear the buyer's cart in the same transaction.
        sqlx::query("DELETE FROM cart_lines WHERE user_id = $1")
            .bind(*order.user.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("commit_checkout", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_checkout", e))
    }

    async fn orders_for_user(&self, user: UserId) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query(
            "SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(*user.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("orders_for_user", e))?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in &rows {
            let id = OrderId::from_uuid(row.try_get("id").map_err(|e| bad_row("order", e))?);
            let items = self.order_items(id).await?;
            orders.push(order_from_row(row, items)?);
        }
        Ok(orders)
    }

    async fn order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        let row = sqlx::query("SELECT * FROM orders WHERE id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("order", e))?;
        match row {
            None => Ok(None),
            Some(row) => {
                let items = self.order_items(id).await?;
                Ok(Some(order_from_row(&row, items)?))
            }
        }
    }

    async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> StoreResult<()> {
        let result = sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(*id.as_uuid())
            .bind(status.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_order_status", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn upsert_review(&self, review: Review) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO reviews (id, user_id, product_id, rating, comment,
                                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET rating = EXCLUDED.rating,
                          comment = EXCLUDED.comment,
                          updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(*review.id.as_uuid())
        .bind(*review.user.as_uuid())
        .bind(*review.product.as_uuid())
        .bind(review.rating as i32)
        .bind(&review.comment)
        .bind(review.created_at)
        .bind(review.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("upsert_review", e))?;
        Ok(())
    }

    async fn review_by(&self, user: UserId, product: ProductId) -> StoreResult<Option<Review>> {
        let row = sqlx::query(
            "SELECT * FROM reviews WHERE user_id = $1 AND product_id = $2",
        )
        .bind(*user.as_uuid())
        .bind(*product.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("review_by", e))?;
        row.as_ref().map(review_from_row).transpose()
    }

    async fn reviews_for_product(&self, product: ProductId) -> StoreResult<Vec<Review>> {
        let rows = sqlx::query(
            "SELECT * FROM reviews WHERE product_id = $1 ORDER BY created_at DESC",
        )
        .bind(*product.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("reviews_for_product", e))?;
        rows.iter().map(review_from_row).collect()
    }

    async fn has_purchased(&self, user: UserId, product: ProductId) -> StoreResult<bool> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM orders o
                JOIN order_items i ON i.order_id = o.id
                WHERE o.user_id = $1
                  AND i.product_id = $2
                  AND o.status IN ('confirmed', 'shipped', 'delivered')
            ) AS purchased
            "#,
        )
        .bind(*user.as_uuid())
        .bind(*product.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("has_purchased", e))?;
        row.try_get("purchased").map_err(|e| bad_row("exists", e))
    }
}
