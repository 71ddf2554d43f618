//! Order number generation.
//!
//! The format is externally visible and must be reproduced exactly:
//! `"ORD"` followed by 10 characters drawn from `[A-Z0-9]`. Collisions are
//! negligible in a 36^10 space but the caller retries on a unique-key
//! conflict anyway.

use core::str::FromStr;
use rand::Rng;
use serde::{Deserialize, Serialize};

use bazaar_core::DomainError;

const PREFIX: &str = "ORD";
const SUFFIX_LEN: usize = 10;
const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Unique, human-quotable order identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::thread_rng())
    }

    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut s = String::with_capacity(PREFIX.len() + SUFFIX_LEN);
        s.push_str(PREFIX);
        for _ in 0..SUFFIX_LEN {
            let idx = rng.gen_range(0..CHARSET.len());
            s.push(CHARSET[idx] as char);
        }
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_valid(s: &str) -> bool {
        s.len() == PREFIX.len() + SUFFIX_LEN
            && s.starts_with(PREFIX)
            && s[PREFIX.len()..]
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
    }
}

impl core::fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for OrderNumber {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if Self::is_valid(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(DomainError::invalid_id(format!("order number: {s:?}")))
        }
    }
}
