use serde::{Deserialize, Serialize};

use bazaar_core::UserId;

use crate::Role;

/// A fully resolved actor for authorization decisions.
///
/// Construction is decoupled from storage and transport: the API layer
/// derives this from verified token claims; tests build it directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl Principal {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self {
            user_id,
            role,
            is_staff: false,
            is_superuser: false,
        }
    }

    pub fn staff(user_id: UserId, role: Role) -> Self {
        Self {
            user_id,
            role,
            is_staff: true,
            is_superuser: false,
        }
    }

    /// Admin capability gate used by the approval workflow.
    pub fn is_admin(&self) -> bool {
        self.is_staff || self.is_superuser
    }

    pub fn is_seller(&self) -> bool {
        self.role == Role::Seller
    }
}
