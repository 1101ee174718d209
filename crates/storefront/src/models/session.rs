//! Session-related types.
//!
//! Types stored in the session for authentication and basket state.

use serde::{Deserialize, Serialize};

use booktime_core::{Email, StaffRole, UserId};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Back-office role, if the user is staff.
    pub role: Option<StaffRole>,
}

/// Session keys.
pub mod session_keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the id of the basket the session is shopping with.
    pub const BASKET_ID: &str = "basket_id";
}
