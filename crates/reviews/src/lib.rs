//! `bazaar-reviews` — purchase-gated product reviews.

pub mod review;

pub use review::{average_rating_centi, can_review, confers_eligibility, Review};
