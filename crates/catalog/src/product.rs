use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{CategoryId, DomainError, DomainResult, Entity, Money, ProductId, UserId};

/// Gate controlling catalog visibility, independent of stock.
///
/// Transitions: `pending → approved`, `pending → rejected`,
/// `approved/rejected → pending` (seller edit). Nothing moves backwards
/// automatically; re-approval requires resubmission.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "pending" => Ok(ApprovalStatus::Pending),
            "approved" => Ok(ApprovalStatus::Approved),
            "rejected" => Ok(ApprovalStatus::Rejected),
            other => Err(DomainError::validation(format!(
                "unknown approval status: {other}"
            ))),
        }
    }
}

/// Derived purchasability flag, kept in sync with quantity on every write.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    OutOfStock,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::InStock => "in_stock",
            StockStatus::OutOfStock => "out_of_stock",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "in_stock" => Ok(StockStatus::InStock),
            "out_of_stock" => Ok(StockStatus::OutOfStock),
            other => Err(DomainError::validation(format!(
                "unknown stock status: {other}"
            ))),
        }
    }
}

/// Seller-submitted fields for a new listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: Money,
    pub quantity: u32,
    pub category: CategoryId,
    pub is_featured: bool,
}

/// Seller-submitted fields for editing an existing listing.
///
/// Applying an edit always resets the listing to `pending`; this is the
/// deliberate re-review gate.
pub type ProductEdit = ProductDraft;

/// Product listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub seller: UserId,
    pub category: CategoryId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub quantity: u32,
    pub stock_status: StockStatus,
    pub approval_status: ApprovalStatus,
    /// Average review rating in hundredths (0..=500).
    pub rating: u16,
    pub total_sells: u32,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Create a listing from a seller submission. New listings always start
    /// `pending`.
    pub fn submit(
        id: ProductId,
        seller: UserId,
        draft: ProductDraft,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        validate_draft(&draft)?;
        let stock_status = derive_stock_status(draft.quantity);
        Ok(Self {
            id,
            seller,
            category: draft.category,
            name: draft.name,
            description: draft.description,
            price: draft.price,
            quantity: draft.quantity,
            stock_status,
            approval_status: ApprovalStatus::Pending,
            rating: 0,
            total_sells: 0,
            is_featured: draft.is_featured,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a seller edit. Resets approval to `pending` regardless of the
    /// current status, hiding the listing until re-approved.
    pub fn apply_edit(&mut self, edit: ProductEdit, now: DateTime<Utc>) -> DomainResult<()> {
        validate_draft(&edit)?;
        self.name = edit.name;
        self.description = edit.description;
        self.price = edit.price;
        self.quantity = edit.quantity;
        self.category = edit.category;
        self.is_featured = edit.is_featured;
        self.stock_status = derive_stock_status(self.quantity);
        self.approval_status = ApprovalStatus::Pending;
        self.updated_at = now;
        Ok(())
    }

    /// Staff action: `pending`/`rejected` → `approved`.
    ///
    /// Repeated approval is a harmless overwrite, not an error.
    pub fn approve(&mut self, now: DateTime<Utc>) {
        self.approval_status = ApprovalStatus::Approved;
        self.updated_at = now;
    }

    /// Staff action: any status → `rejected`.
    pub fn reject(&mut self, now: DateTime<Utc>) {
        self.approval_status = ApprovalStatus::Rejected;
        self.updated_at = now;
    }

    pub fn is_approved(&self) -> bool {
        self.approval_status == ApprovalStatus::Approved
    }

    pub fn is_in_stock(&self) -> bool {
        self.stock_status == StockStatus::InStock
    }

    /// Catalog visibility: approved for everyone, any status for the owning
    /// seller.
    pub fn visible_to(&self, viewer: Option<UserId>) -> bool {
        self.is_approved() || viewer == Some(self.seller)
    }

    /// True when the requested quantity can currently be fulfilled.
    pub fn can_fulfill(&self, requested: u32) -> bool {
        self.is_in_stock() && self.quantity >= requested
    }

    /// Decrement stock for a sale of `requested` units and bump the sales
    /// counter. Fails without mutating when stock is insufficient.
    pub fn reserve(&mut self, requested: u32, now: DateTime<Utc>) -> DomainResult<()> {
        if requested == 0 {
            return Err(DomainError::validation("quantity must be at least 1"));
        }
        if !self.can_fulfill(requested) {
            return Err(DomainError::conflict(format!(
                "insufficient stock for {} (available: {})",
                self.name, self.quantity
            )));
        }
        self.quantity -= requested;
        self.total_sells = self.total_sells.saturating_add(requested);
        self.stock_status = derive_stock_status(self.quantity);
        self.updated_at = now;
        Ok(())
    }

    /// Overwrite the average review rating (hundredths, clamped to 0..=500).
    pub fn set_rating(&mut self, rating: u16, now: DateTime<Utc>) {
        self.rating = rating.min(500);
        self.updated_at = now;
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn derive_stock_status(quantity: u32) -> StockStatus {
    if quantity == 0 {
        StockStatus::OutOfStock
    } else {
        StockStatus::InStock
    }
}

fn validate_draft(draft: &ProductDraft) -> DomainResult<()> {
    if draft.name.trim().is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    if draft.description.trim().is_empty() {
        return Err(DomainError::validation("description cannot be empty"));
    }
    Ok(())
}
