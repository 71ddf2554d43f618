//! `bazaar-infra` — persistence backends and application services.
//!
//! The [`store::Store`] trait is the unit-of-work boundary: every compound
//! mutation (checkout above all) is one atomic operation against a backend.
//! Services orchestrate pure domain logic against that boundary.

pub mod services;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use services::{
    ApprovalService, CartService, CartView, CatalogService, CheckoutService, OrderService,
    ProductDetail, ReviewService, ServiceError, ServiceResult, Services,
};
pub use store::{InMemoryStore, PostgresStore, Store, StoreError, StoreResult};
