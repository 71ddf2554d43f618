//! Pure authorization checks.
//!
//! Role-based dispatch lives here as explicit capability checks returning a
//! typed result, instead of being embedded in each handler.

use thiserror::Error;

use bazaar_core::UserId;

use crate::Principal;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("staff capability required")]
    StaffRequired,

    #[error("seller role required")]
    SellerRequired,

    #[error("not the owner of this resource")]
    NotOwner,
}

/// Gate for the approval workflow: `is_staff` or `is_superuser`.
pub fn require_staff(principal: &Principal) -> Result<(), AuthzError> {
    if principal.is_admin() {
        Ok(())
    } else {
        Err(AuthzError::StaffRequired)
    }
}

/// Gate for listing management (create/edit/delete products, categories).
pub fn require_seller(principal: &Principal) -> Result<(), AuthzError> {
    if principal.is_seller() {
        Ok(())
    } else {
        Err(AuthzError::SellerRequired)
    }
}

/// Ownership gate: the principal must be the referenced user.
pub fn require_owner(principal: &Principal, owner: UserId) -> Result<(), AuthzError> {
    if principal.user_id == owner {
        Ok(())
    } else {
        Err(AuthzError::NotOwner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    #[test]
    fn staff_gate_accepts_staff_and_superuser_only() {
        let buyer = Principal::new(UserId::new(), Role::Buyer);
        assert_eq!(require_staff(&buyer), Err(AuthzError::StaffRequired));

        let staff = Principal::staff(UserId::new(), Role::Buyer);
        assert_eq!(require_staff(&staff), Ok(()));

        let mut root = Principal::new(UserId::new(), Role::Seller);
        root.is_superuser = true;
        assert_eq!(require_staff(&root), Ok(()));
    }

    #[test]
    fn seller_gate_rejects_buyers() {
        let buyer = Principal::new(UserId::new(), Role::Buyer);
        assert_eq!(require_seller(&buyer), Err(AuthzError::SellerRequired));

        let seller = Principal::new(UserId::new(), Role::Seller);
        assert_eq!(require_seller(&seller), Ok(()));
    }

    #[test]
    fn ownership_gate_compares_user_ids() {
        let id = UserId::new();
        let principal = Principal::new(id, Role::Seller);
        assert_eq!(require_owner(&principal, id), Ok(()));
        assert_eq!(
            require_owner(&principal, UserId::new()),
            Err(AuthzError::NotOwner)
        );
    }
}
