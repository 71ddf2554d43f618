//! `bazaar-auth` — pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage. Identity
//! issuance (signup, passwords, sessions) lives outside the service; this
//! crate models the decoded identity and the policy checks applied to it.

pub mod authorize;
pub mod claims;
pub mod principal;
pub mod roles;
pub mod user;

pub use authorize::{require_owner, require_seller, require_staff, AuthzError};
pub use claims::{
    validate_claims, Hs256JwtValidator, JwtClaims, JwtValidator, TokenValidationError,
};
pub use principal::Principal;
pub use roles::Role;
pub use user::User;
