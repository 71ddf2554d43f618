use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_catalog::Product;
use bazaar_core::{CartLineId, DomainError, DomainResult, Entity, Money, ProductId, UserId};

/// One (user, product) line in a cart. The pair is unique per user; adding
/// the same product again accumulates into the existing line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: CartLineId,
    pub user: UserId,
    pub product: ProductId,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of an update-quantity request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    /// Quantity was zero: the line is to be removed.
    Removed,
}

impl CartLine {
    pub fn new(
        id: CartLineId,
        user: UserId,
        product: ProductId,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be at least 1"));
        }
        Ok(Self {
            id,
            user,
            product,
            quantity,
            created_at: now,
            updated_at: now,
        })
    }

    /// Add-to-cart on an existing line accumulates.
    pub fn accumulate(&mut self, quantity: u32, now: DateTime<Utc>) -> DomainResult<()> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be at least 1"));
        }
        self.quantity = self
            .quantity
            .checked_add(quantity)
            .ok_or_else(|| DomainError::validation("quantity overflow"))?;
        self.updated_at = now;
        Ok(())
    }

    /// Explicit update overwrites (does not accumulate); zero removes.
    pub fn set_quantity(&mut self, quantity: u32, now: DateTime<Utc>) -> UpdateOutcome {
        if quantity == 0 {
            return UpdateOutcome::Removed;
        }
        self.quantity = quantity;
        self.updated_at = now;
        UpdateOutcome::Updated
    }

    pub fn line_total(&self, unit_price: Money) -> DomainResult<Money> {
        unit_price.checked_mul(self.quantity)
    }
}

impl Entity for CartLine {
    type Id = CartLineId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Cart total, computed fresh from current product prices — never cached,
/// since prices can change before checkout.
pub fn cart_total(lines: &[(CartLine, Product)]) -> DomainResult<Money> {
    Money::sum(
        lines
            .iter()
            .map(|(line, product)| line.line_total(product.price))
            .collect::<DomainResult<Vec<_>>>()?,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_catalog::{ProductDraft, StockStatus};
    use bazaar_core::CategoryId;

    fn line(quantity: u32) -> CartLine {
        CartLine::new(
            CartLineId::new(),
            UserId::new(),
            ProductId::new(),
            quantity,
            Utc::now(),
        )
        .unwrap()
    }

    fn product_priced(cents: u64) -> Product {
        Product::submit(
            ProductId::new(),
            UserId::new(),
            ProductDraft {
                name: "Desk lamp".to_string(),
                description: "Brass, dimmable".to_string(),
                price: Money::from_cents(cents),
                quantity: 10,
                category: CategoryId::new(),
                is_featured: false,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn zero_quantity_line_is_rejected() {
        assert!(CartLine::new(
            CartLineId::new(),
            UserId::new(),
            ProductId::new(),
            0,
            Utc::now()
        )
        .is_err());
    }

    #[test]
    fn accumulate_adds_and_set_overwrites() {
        let mut l = line(2);
        l.accumulate(3, Utc::now()).unwrap();
        assert_eq!(l.quantity, 5);

        assert_eq!(l.set_quantity(1, Utc::now()), UpdateOutcome::Updated);
        assert_eq!(l.quantity, 1);
    }

    #[test]
    fn zero_update_requests_removal() {
        let mut l = line(2);
        assert_eq!(l.set_quantity(0, Utc::now()), UpdateOutcome::Removed);
    }

    #[test]
    fn total_uses_current_prices() {
        let a = product_priced(10_000);
        let b = product_priced(5_000);

        let mut line_a = line(2);
        line_a.product = a.id;
        let mut line_b = line(1);
        line_b.product = b.id;

        let total = cart_total(&[(line_a, a.clone()), (line_b.clone(), b.clone())]).unwrap();
        assert_eq!(total, Money::from_cents(25_000));

        // A price change is reflected on the next read.
        let mut a_repriced = a;
        a_repriced.price = Money::from_cents(12_000);
        a_repriced.stock_status = StockStatus::InStock;
        let mut line_a2 = line(2);
        line_a2.product = a_repriced.id;
        let total = cart_total(&[(line_a2, a_repriced), (line_b, b)]).unwrap();
        assert_eq!(total, Money::from_cents(29_000));
    }
}
