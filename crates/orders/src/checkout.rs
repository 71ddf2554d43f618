//! Pure checkout validation.
//!
//! Given the buyer's cart lines joined with their current products, this
//! module either produces a priced [`Quote`] (the snapshot the order is
//! built from) or a structured [`CheckoutError`]. It performs no IO; the
//! atomic commit lives in the store layer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use bazaar_cart::CartLine;
use bazaar_catalog::Product;
use bazaar_core::{DomainError, Money, ProductId, UserId};

use crate::order::{OrderItem, PaymentMethod};

/// Buyer-supplied checkout fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutDraft {
    pub address: String,
    pub pin_code: String,
    pub payment_method: PaymentMethod,
}

/// One line priced at this instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    pub product: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl PricedLine {
    pub fn into_order_item(self) -> OrderItem {
        OrderItem {
            product: self.product,
            product_name: self.product_name,
            quantity: self.quantity,
            price: self.unit_price,
        }
    }
}

/// Validated, priced cart ready to be committed as an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub buyer: UserId,
    pub lines: Vec<PricedLine>,
    pub total: Money,
}

/// A product that cannot cover the requested quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockShortage {
    pub product: ProductId,
    pub product_name: String,
    pub requested: u32,
    pub available: u32,
}

impl core::fmt::Display for StockShortage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} (available: {})", self.product_name, self.available)
    }
}

/// Checkout failure taxonomy. All list-shaped variants name every offender,
/// not just the first.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("your cart is empty")]
    EmptyCart,

    #[error("you cannot buy your own products: {}", products.join(", "))]
    SelfPurchase { products: Vec<String> },

    #[error("insufficient stock for: {}", format_shortages(shortages))]
    InsufficientStock { shortages: Vec<StockShortage> },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

fn format_shortages(shortages: &[StockShortage]) -> String {
    shortages
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Validate a checkout attempt and price it.
///
/// Preconditions are checked in order, short-circuiting on the first
/// failing class: empty cart, then self-purchase, then stock, then input
/// shape. Self-purchase and stock errors collect every offending line.
pub fn prepare(
    buyer: UserId,
    draft: &CheckoutDraft,
    lines: &[(CartLine, Product)],
) -> Result<Quote, CheckoutError> {
    if lines.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let own: Vec<String> = lines
        .iter()
        .filter(|(_, product)| product.seller == buyer)
        .map(|(_, product)| product.name.clone())
        .collect();
    if !own.is_empty() {
        return Err(CheckoutError::SelfPurchase { products: own });
    }

    let shortages: Vec<StockShortage> = lines
        .iter()
        .filter(|(line, product)| !product.can_fulfill(line.quantity))
        .map(|(line, product)| StockShortage {
            product: product.id,
            product_name: product.name.clone(),
            requested: line.quantity,
            available: product.quantity,
        })
        .collect();
    if !shortages.is_empty() {
        return Err(CheckoutError::InsufficientStock { shortages });
    }

    if draft.address.trim().is_empty() {
        return Err(DomainError::validation("address is required").into());
    }
    if draft.pin_code.trim().is_empty() {
        return Err(DomainError::validation("pin code is required").into());
    }

    let priced: Vec<PricedLine> = lines
        .iter()
        .map(|(line, product)| PricedLine {
            product: product.id,
            product_name: product.name.clone(),
            quantity: line.quantity,
            unit_price: product.price,
        })
        .collect();

    let total = Money::sum(
        priced
            .iter()
            .map(|l| l.unit_price.checked_mul(l.quantity))
            .collect::<Result<Vec<_>, _>>()?,
    )?;

    Ok(Quote {
        buyer,
        lines: priced,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_catalog::{ApprovalStatus, ProductDraft};
    use bazaar_core::{CartLineId, CategoryId};
    use chrono::Utc;

    fn product(name: &str, price_major: u64, quantity: u32, seller: UserId) -> Product {
        let mut p = Product::submit(
            ProductId::new(),
            seller,
            ProductDraft {
                name: name.to_string(),
                description: "test listing".to_string(),
                price: Money::from_major(price_major),
                quantity,
                category: CategoryId::new(),
                is_featured: false,
            },
            Utc::now(),
        )
        .unwrap();
        p.approval_status = ApprovalStatus::Approved;
        p
    }

    fn line_for(buyer: UserId, product: &Product, quantity: u32) -> CartLine {
        CartLine::new(CartLineId::new(), buyer, product.id, quantity, Utc::now()).unwrap()
    }

    fn draft() -> CheckoutDraft {
        CheckoutDraft {
            address: "12 Canal Street".to_string(),
            pin_code: "560001".to_string(),
            payment_method: PaymentMethod::CashOnDelivery,
        }
    }

    #[test]
    fn empty_cart_short_circuits_everything_else() {
        let buyer = UserId::new();
        let bad_draft = CheckoutDraft {
            address: String::new(),
            ..draft()
        };
        assert_eq!(
            prepare(buyer, &bad_draft, &[]),
            Err(CheckoutError::EmptyCart)
        );
    }

    #[test]
    fn blank_address_or_pin_is_a_validation_error() {
        let buyer = UserId::new();
        let seller = UserId::new();
        let p = product("Teapot", 35, 5, seller);
        let lines = vec![(line_for(buyer, &p, 1), p)];

        let no_address = CheckoutDraft {
            address: "  ".to_string(),
            ..draft()
        };
        assert!(matches!(
            prepare(buyer, &no_address, &lines),
            Err(CheckoutError::Domain(DomainError::Validation(_)))
        ));
    }

    #[test]
    fn self_purchase_is_reported_before_address_validation() {
        // A seller checking out their own listing hears about the ownership
        // problem first, even when the shipping form is also blank.
        let seller = UserId::new();
        let own = product("Own teapot", 35, 5, seller);
        let lines = vec![(line_for(seller, &own, 1), own)];
        let blank = CheckoutDraft {
            address: String::new(),
            pin_code: String::new(),
            ..draft()
        };

        assert!(matches!(
            prepare(seller, &blank, &lines),
            Err(CheckoutError::SelfPurchase { .. })
        ));
    }

    #[test]
    fn stock_shortage_is_reported_before_address_validation() {
        let buyer = UserId::new();
        let short = product("Lamp", 10, 1, UserId::new());
        let lines = vec![(line_for(buyer, &short, 3), short)];
        let blank = CheckoutDraft {
            address: String::new(),
            ..draft()
        };

        assert!(matches!(
            prepare(buyer, &blank, &lines),
            Err(CheckoutError::InsufficientStock { .. })
        ));
    }

    #[test]
    fn seller_cannot_buy_their_own_product() {
        let seller = UserId::new();
        let own = product("Own teapot", 35, 5, seller);
        let other = product("Other teapot", 20, 5, UserId::new());
        let lines = vec![
            (line_for(seller, &own, 1), own),
            (line_for(seller, &other, 1), other),
        ];

        match prepare(seller, &draft(), &lines) {
            Err(CheckoutError::SelfPurchase { products }) => {
                assert_eq!(products, vec!["Own teapot".to_string()]);
            }
            other => panic!("expected SelfPurchase, got {other:?}"),
        }
    }

    #[test]
    fn stock_errors_name_every_offender_with_availability() {
        let buyer = UserId::new();
        let short_a = product("Lamp", 10, 1, UserId::new());
        let short_b = product("Rug", 50, 0, UserId::new());
        let fine = product("Vase", 15, 9, UserId::new());
        let lines = vec![
            (line_for(buyer, &short_a, 3), short_a.clone()),
            (line_for(buyer, &short_b, 1), short_b.clone()),
            (line_for(buyer, &fine, 2), fine),
        ];

        match prepare(buyer, &draft(), &lines) {
            Err(CheckoutError::InsufficientStock { shortages }) => {
                assert_eq!(shortages.len(), 2);
                assert_eq!(shortages[0].product, short_a.id);
                assert_eq!(shortages[0].available, 1);
                assert_eq!(shortages[1].product, short_b.id);
                assert_eq!(shortages[1].available, 0);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[test]
    fn out_of_stock_flag_blocks_even_with_quantity_on_hand() {
        let buyer = UserId::new();
        let mut p = product("Lamp", 10, 5, UserId::new());
        p.stock_status = bazaar_catalog::StockStatus::OutOfStock;
        let lines = vec![(line_for(buyer, &p, 1), p)];
        assert!(matches!(
            prepare(buyer, &draft(), &lines),
            Err(CheckoutError::InsufficientStock { .. })
        ));
    }

    #[test]
    fn quote_prices_the_worked_example() {
        // Cart: A (100.00, qty 5) x2, B (50.00, qty 3) x1 -> total 250.00.
        let buyer = UserId::new();
        let a = product("Product A", 100, 5, UserId::new());
        let b = product("Product B", 50, 3, UserId::new());
        let lines = vec![
            (line_for(buyer, &a, 2), a.clone()),
            (line_for(buyer, &b, 1), b.clone()),
        ];

        let quote = prepare(buyer, &draft(), &lines).unwrap();
        assert_eq!(quote.total, "250.00".parse().unwrap());
        assert_eq!(quote.lines.len(), 2);
        assert_eq!(quote.lines[0].unit_price, Money::from_major(100));
        assert_eq!(quote.lines[1].quantity, 1);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: a successful quote's total always equals the sum of
            /// line price x quantity.
            #[test]
            fn quote_total_matches_line_arithmetic(
                specs in proptest::collection::vec((1u64..10_000, 1u32..20, 1u32..20), 1..8)
            ) {
                let buyer = UserId::new();
                let lines: Vec<(CartLine, Product)> = specs
                    .iter()
                    .enumerate()
                    .map(|(i, (cents, stock, want))| {
                        let available = stock + want; // always fulfillable
                        let mut p = product(&format!("P{i}"), 0, available, UserId::new());
                        p.price = Money::from_cents(*cents);
                        (line_for(buyer, &p, *want), p)
                    })
                    .collect();

                let quote = prepare(buyer, &draft(), &lines).unwrap();
                let expected: u64 = specs
                    .iter()
                    .map(|(cents, _, want)| cents * u64::from(*want))
                    .sum();
                prop_assert_eq!(quote.total, Money::from_cents(expected));
            }
        }
    }
}
