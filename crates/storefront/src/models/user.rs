//! User accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use booktime_core::{Email, StaffRole, UserId};

/// A shop user. Staff accounts carry a back-office role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub role: Option<StaffRole>,
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// Name used to greet the user, falling back to the email address.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.email.to_string()
        } else {
            full.to_owned()
        }
    }
}

/// A user together with their stored password hash.
///
/// Only the auth service reads this; it is never serialized.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

/// Values for a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Option<StaffRole>,
}

/// Back-office changes to an account. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: Option<bool>,
    #[serde(default, with = "double_option")]
    pub role: Option<Option<StaffRole>>,
}

/// Distinguishes an absent `role` key from an explicit `null`.
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_update_role_null_vs_absent() {
        let absent: UserUpdate = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.role, None);

        let cleared: UserUpdate = serde_json::from_str(r#"{"role": null}"#).unwrap();
        assert_eq!(cleared.role, Some(None));

        let set: UserUpdate = serde_json::from_str(r#"{"role": "dispatcher"}"#).unwrap();
        assert_eq!(set.role, Some(Some(StaffRole::Dispatcher)));
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let user = User {
            id: UserId::new(1),
            email: Email::parse("reader@booktime.domain").unwrap(),
            first_name: String::new(),
            last_name: String::new(),
            is_active: true,
            role: None,
            date_joined: Utc::now(),
        };
        assert_eq!(user.display_name(), "reader@booktime.domain");
    }
}
