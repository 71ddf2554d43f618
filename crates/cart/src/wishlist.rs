use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{ProductId, UserId};

/// Wishlist entry, unique per (user, product). Adding an existing entry is a
/// no-op rather than an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistEntry {
    pub user: UserId,
    pub product: ProductId,
    pub created_at: DateTime<Utc>,
}

impl WishlistEntry {
    pub fn new(user: UserId, product: ProductId, now: DateTime<Utc>) -> Self {
        Self {
            user,
            product,
            created_at: now,
        }
    }
}
