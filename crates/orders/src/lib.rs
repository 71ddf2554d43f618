//! `bazaar-orders` — order snapshots, order numbers and checkout validation.

pub mod checkout;
pub mod number;
pub mod order;

pub use checkout::{CheckoutDraft, CheckoutError, PricedLine, Quote, StockShortage};
pub use number::OrderNumber;
pub use order::{Order, OrderItem, OrderStatus, PaymentMethod};
