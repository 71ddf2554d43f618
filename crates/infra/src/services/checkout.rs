//! Checkout orchestration.
//!
//! Pure validation and pricing live in `bazaar_orders::checkout`; this
//! service joins the cart, runs that validation and hands the resulting
//! order to the store's atomic commit. Stock is therefore checked twice:
//! once here for a friendly early error, and again inside the transaction
//! where it actually counts.

use chrono::Utc;

use bazaar_auth::Principal;
use bazaar_core::{DomainError, OrderId};
use bazaar_orders::{checkout, CheckoutDraft, Order, OrderNumber};

use super::{ServiceError, ServiceResult};
use crate::store::{Store, StoreError};

/// Order-number collisions are ~36^-10 per attempt; if this many in a row
/// conflict, something other than luck is wrong.
const MAX_NUMBER_ATTEMPTS: u32 = 5;

#[derive(Clone)]
pub struct CheckoutService<S> {
    store: S,
}

impl<S: Store> CheckoutService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Place an order for everything in the caller's cart.
    ///
    /// On success the order is committed as `confirmed`, stock is
    /// decremented and the cart is emptied, all atomically. On any failure
    /// nothing changes.
    pub async fn checkout(
        &self,
        principal: &Principal,
        draft: CheckoutDraft,
    ) -> ServiceResult<Order> {
        let lines = self.store.cart_lines(principal.user_id).await?;
        let quote = checkout::prepare(principal.user_id, &draft, &lines)?;

        let items: Vec<_> = quote
            .lines
            .into_iter()
            .map(|line| line.into_order_item())
            .collect();

        for _ in 0..MAX_NUMBER_ATTEMPTS {
            let order = Order::confirmed(
                OrderId::new(),
                principal.user_id,
                OrderNumber::generate(),
                draft.address.clone(),
                draft.pin_code.clone(),
                draft.payment_method,
                items.clone(),
                Utc::now(),
            )?;
            match self.store.commit_checkout(order.clone()).await {
                Ok(()) => {
                    tracing::info!(
                        order = %order.order_number,
                        buyer = %order.user,
                        total = %order.total_amount,
                        items = order.items.len(),
                        "order placed"
                    );
                    return Ok(order);
                }
                // Duplicate order number: regenerate and retry.
                Err(StoreError::Conflict(_)) => continue,
                Err(other) => return Err(other.into()),
            }
        }
        Err(ServiceError::Domain(DomainError::conflict(
            "could not allocate a unique order number",
        )))
    }
}
