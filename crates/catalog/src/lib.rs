//! `bazaar-catalog` — product listings, categories and the approval gate.

pub mod category;
pub mod filter;
pub mod product;

pub use category::{slugify, Category};
pub use filter::{Page, Pagination, ProductFilter};
pub use product::{ApprovalStatus, Product, ProductDraft, ProductEdit, StockStatus};
