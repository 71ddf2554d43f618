//! `bazaar-api` — HTTP surface over the marketplace services.

pub mod app;
pub mod context;
pub mod middleware;
