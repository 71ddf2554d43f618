//! Request bodies and JSON mapping helpers.
//!
//! Monetary amounts cross the wire as two-decimal strings (`"250.00"`) and
//! are parsed through `Money`'s `FromStr`, so clients never see floats.

use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use bazaar_cart::{CartLine, WishlistEntry};
use bazaar_catalog::{Category, Page, Product};
use bazaar_infra::{CartView, ProductDetail};
use bazaar_orders::Order;
use bazaar_reviews::Review;

#[derive(Debug, Deserialize)]
pub struct ProductRequest {
    pub name: String,
    pub description: String,
    /// Decimal string, e.g. `"35.00"`.
    pub price: String,
    pub quantity: u32,
    pub category: Uuid,
    #[serde(default)]
    pub is_featured: bool,
}

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product: Uuid,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub address: String,
    pub pin_code: String,
    /// Defaults to cash on delivery, the only supported method.
    #[serde(default)]
    pub payment_method: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

pub fn product_to_json(p: &Product) -> Value {
    json!({
        "id": p.id.to_string(),
        "seller": p.seller.to_string(),
        "category": p.category.to_string(),
        "name": p.name,
        "description": p.description,
        "price": p.price.to_string(),
        "quantity": p.quantity,
        "stock_status": p.stock_status.as_str(),
        "approval_status": p.approval_status.as_str(),
        "rating_centi": p.rating,
        "total_sells": p.total_sells,
        "is_featured": p.is_featured,
        "created_at": p.created_at,
        "updated_at": p.updated_at,
    })
}

pub fn product_page_to_json(page: &Page<Product>) -> Value {
    json!({
        "items": page.items.iter().map(product_to_json).collect::<Vec<_>>(),
        "total": page.total,
        "page": page.page,
        "per_page": page.per_page,
    })
}

pub fn product_detail_to_json(detail: &ProductDetail) -> Value {
    json!({
        "product": product_to_json(&detail.product),
        "reviews": detail.reviews.iter().map(review_to_json).collect::<Vec<_>>(),
        "viewer_can_review": detail.viewer_can_review,
    })
}

pub fn category_to_json(c: &Category) -> Value {
    json!({
        "id": c.id.to_string(),
        "name": c.name,
        "slug": c.slug,
        "description": c.description,
    })
}

pub fn cart_view_to_json(view: &CartView) -> Value {
    json!({
        "lines": view
            .lines
            .iter()
            .map(|(line, product)| cart_line_to_json(line, product))
            .collect::<Vec<_>>(),
        "total": view.total.to_string(),
    })
}

pub fn cart_line_to_json(line: &CartLine, product: &Product) -> Value {
    json!({
        "id": line.id.to_string(),
        "product": product_to_json(product),
        "quantity": line.quantity,
        "line_total": line
            .line_total(product.price)
            .map(|m| m.to_string())
            .unwrap_or_default(),
    })
}

pub fn wishlist_to_json(entries: &[(WishlistEntry, Product)]) -> Value {
    json!({
        "items": entries
            .iter()
            .map(|(entry, product)| json!({
                "product": product_to_json(product),
                "added_at": entry.created_at,
            }))
            .collect::<Vec<_>>(),
    })
}

pub fn order_to_json(o: &Order) -> Value {
    json!({
        "id": o.id.to_string(),
        "order_number": o.order_number.as_str(),
        "address": o.address,
        "pin_code": o.pin_code,
        "payment_method": o.payment_method.as_str(),
        "total_amount": o.total_amount.to_string(),
        "status": o.status.as_str(),
        "delivery_date": o.delivery_date,
        "created_at": o.created_at,
        "items": o
            .items
            .iter()
            .map(|item| json!({
                "product": item.product.to_string(),
                "product_name": item.product_name,
                "quantity": item.quantity,
                "price": item.price.to_string(),
            }))
            .collect::<Vec<_>>(),
    })
}

pub fn review_to_json(r: &Review) -> Value {
    json!({
        "id": r.id.to_string(),
        "user": r.user.to_string(),
        "rating": r.rating,
        "comment": r.comment,
        "created_at": r.created_at,
        "updated_at": r.updated_at,
    })
}
