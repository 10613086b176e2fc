//! Session-related types for admin authentication.

use aitoonic_core::UserId;
use aitoonic_core::store::{AccessToken, Session};
use serde::{Deserialize, Serialize};

/// Session-stored admin identity.
///
/// Holds the store access token so every data call runs as this admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAdmin {
    pub user_id: UserId,
    pub email: String,
    pub access_token: AccessToken,
}

impl From<Session> for CurrentAdmin {
    fn from(session: Session) -> Self {
        Self {
            user_id: session.user_id,
            email: session.email,
            access_token: session.access_token,
        }
    }
}

/// Session keys for admin state.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// Key for the persisted dashboard state (tab, search, draft).
    pub const DASHBOARD: &str = "dashboard";

    /// Key for notifications waiting to be shown on the next render.
    pub const FLASH: &str = "flash";
}
