use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{DomainError, DomainResult, Entity, Money, OrderId, ProductId, UserId};

use crate::number::OrderNumber;

/// Order lifecycle.
///
/// Legal transitions: `pending → confirmed → shipped → delivered`, and
/// `pending/confirmed → cancelled`. Checkout creates orders directly in
/// `confirmed` (cash-on-delivery needs no payment hold).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::validation(format!(
                "unknown order status: {other}"
            ))),
        }
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Confirmed, Shipped)
                | (Shipped, Delivered)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
        )
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CashOnDelivery,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CashOnDelivery => "cash_on_delivery",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "cash_on_delivery" => Ok(PaymentMethod::CashOnDelivery),
            other => Err(DomainError::validation(format!(
                "unknown payment method: {other}"
            ))),
        }
    }
}

/// Frozen (product, quantity, price) snapshot. The price is copied at
/// checkout time, so later catalog edits never affect historical orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub price: Money,
}

impl OrderItem {
    pub fn total(&self) -> DomainResult<Money> {
        self.price.checked_mul(self.quantity)
    }
}

/// Immutable order snapshot. Only `status` changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user: UserId,
    pub order_number: OrderNumber,
    pub address: String,
    pub pin_code: String,
    pub payment_method: PaymentMethod,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub delivery_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    /// Exclusively owned by this order; deleted with it.
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Number of days between order placement and the estimated delivery.
    pub const DELIVERY_LEAD_DAYS: i64 = 7;

    /// Assemble a confirmed order from priced items. The total must equal
    /// the sum of item totals; this is recomputed rather than trusted.
    pub fn confirmed(
        id: OrderId,
        user: UserId,
        order_number: OrderNumber,
        address: String,
        pin_code: String,
        payment_method: PaymentMethod,
        items: Vec<OrderItem>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if items.is_empty() {
            return Err(DomainError::validation("order must contain items"));
        }
        let total_amount = Money::sum(
            items
                .iter()
                .map(OrderItem::total)
                .collect::<DomainResult<Vec<_>>>()?,
        )?;
        let delivery_date = (now + chrono::Duration::days(Self::DELIVERY_LEAD_DAYS)).date_naive();
        Ok(Self {
            id,
            user,
            order_number,
            address,
            pin_code,
            payment_method,
            total_amount,
            status: OrderStatus::Confirmed,
            delivery_date,
            created_at: now,
            items,
        })
    }

    /// Move the order to `next`, rejecting illegal edges as conflicts.
    pub fn transition_to(&mut self, next: OrderStatus) -> DomainResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::conflict(format!(
                "cannot move order from {} to {}",
                self.status.as_str(),
                next.as_str()
            )));
        }
        self.status = next;
        Ok(())
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(cents: u64, quantity: u32) -> OrderItem {
        OrderItem {
            product: ProductId::new(),
            product_name: "Sample".to_string(),
            quantity,
            price: Money::from_cents(cents),
        }
    }

    fn order(items: Vec<OrderItem>) -> Order {
        Order::confirmed(
            OrderId::new(),
            UserId::new(),
            OrderNumber::generate(),
            "12 Canal Street".to_string(),
            "560001".to_string(),
            PaymentMethod::CashOnDelivery,
            items,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn total_is_recomputed_from_item_snapshots() {
        let o = order(vec![item(10_000, 2), item(5_000, 1)]);
        assert_eq!(o.total_amount, Money::from_cents(25_000));
        assert_eq!(o.status, OrderStatus::Confirmed);
    }

    #[test]
    fn empty_item_list_is_rejected() {
        let err = Order::confirmed(
            OrderId::new(),
            UserId::new(),
            OrderNumber::generate(),
            "addr".to_string(),
            "pin".to_string(),
            PaymentMethod::CashOnDelivery,
            vec![],
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn delivery_date_is_a_week_out() {
        let now = Utc::now();
        let o = order(vec![item(100, 1)]);
        assert_eq!(
            o.delivery_date,
            (now + chrono::Duration::days(7)).date_naive()
        );
    }

    #[test]
    fn lifecycle_edges_are_enforced() {
        let mut o = order(vec![item(100, 1)]);
        assert!(o.transition_to(OrderStatus::Shipped).is_ok());
        assert!(o.transition_to(OrderStatus::Delivered).is_ok());

        // Terminal state.
        assert!(o.transition_to(OrderStatus::Cancelled).is_err());
        assert!(o.transition_to(OrderStatus::Pending).is_err());
    }

    #[test]
    fn confirmed_orders_can_be_cancelled_but_shipped_cannot() {
        let mut o = order(vec![item(100, 1)]);
        assert!(o.transition_to(OrderStatus::Cancelled).is_ok());

        let mut o2 = order(vec![item(100, 1)]);
        o2.transition_to(OrderStatus::Shipped).unwrap();
        assert!(o2.transition_to(OrderStatus::Cancelled).is_err());
    }
}
