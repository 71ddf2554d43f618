//! Order history and lifecycle transitions.

use bazaar_auth::Principal;
use bazaar_core::{DomainError, OrderId};
use bazaar_orders::{Order, OrderStatus};

use super::ServiceResult;
use crate::store::Store;

#[derive(Clone)]
pub struct OrderService<S> {
    store: S,
}

impl<S: Store> OrderService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The caller's orders, newest first.
    pub async fn my_orders(&self, principal: &Principal) -> ServiceResult<Vec<Order>> {
        Ok(self.store.orders_for_user(principal.user_id).await?)
    }

    /// One order, visible to its owner and to staff only. Others see
    /// `NotFound`, not `PermissionDenied`.
    pub async fn order_detail(&self, principal: &Principal, id: OrderId) -> ServiceResult<Order> {
        let order = self.store.order(id).await?.ok_or(DomainError::NotFound)?;
        if order.user != principal.user_id && !principal.is_admin() {
            return Err(DomainError::NotFound.into());
        }
        Ok(order)
    }

    /// Move an order along its lifecycle. Staff may take any legal edge;
    /// the owner may only cancel (and only while the order is cancellable).
    pub async fn update_status(
        &self,
        principal: &Principal,
        id: OrderId,
        next: OrderStatus,
    ) -> ServiceResult<Order> {
        let mut order = self.order_detail(principal, id).await?;
        if !principal.is_admin() && next != OrderStatus::Cancelled {
            return Err(DomainError::PermissionDenied.into());
        }
        order.transition_to(next)?;
        self.store.update_order_status(id, next).await?;
        tracing::info!(order = %order.order_number, status = next.as_str(), "order status updated");
        Ok(order)
    }
}
