use bazaar_auth::Principal;

/// Authenticated caller, inserted by the auth middleware as a request
/// extension. Handlers that allow anonymous access extract it as `Option`.
#[derive(Debug, Clone)]
pub struct CurrentUser(Principal);

impl CurrentUser {
    pub fn new(principal: Principal) -> Self {
        Self(principal)
    }

    pub fn principal(&self) -> &Principal {
        &self.0
    }
}
