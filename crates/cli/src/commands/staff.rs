//! Staff account management.
//!
//! # Usage
//!
//! ```bash
//! bt-cli staff create -e owner@booktime.domain -p 'long password' -r owner
//! ```
//!
//! Roles: `owner`, `central_office`, `dispatcher`.

use booktime_core::StaffRole;
use booktime_storefront::db::PgStore;
use booktime_storefront::models::User;
use booktime_storefront::services::auth::{AuthService, Registration};

use super::{CommandError, connect};

/// Create a staff account with `role`.
///
/// # Errors
///
/// Returns `CommandError::Auth` for an invalid email, a weak password or an
/// email that is already registered.
pub async fn create(email: &str, password: &str, role: StaffRole) -> Result<User, CommandError> {
    let store = PgStore::new(connect().await?);

    let registration = Registration {
        email: email.to_owned(),
        password: password.to_owned(),
        first_name: String::new(),
        last_name: String::new(),
    };
    let user = AuthService::new(&store)
        .register(&registration, Some(role))
        .await?;

    tracing::info!(user_id = %user.id, email = %user.email, role = %role, "Staff account created");
    Ok(user)
}
