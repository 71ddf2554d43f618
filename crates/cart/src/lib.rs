//! `bazaar-cart` — per-user cart lines and wishlist entries.

pub mod line;
pub mod wishlist;

pub use line::{cart_total, CartLine, UpdateOutcome};
pub use wishlist::WishlistEntry;
