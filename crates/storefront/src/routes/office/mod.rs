//! Back-office route handlers.
//!
//! Every staff role shares these endpoints. The field policy in
//! [`booktime_core::access`] decides per role which resources are reachable,
//! which keys are stripped from responses and which keys a write may carry.
//! Writes are checked key by key before the body is deserialized, so a
//! request touching a single read-only field is refused as a whole.

pub mod catalog;
pub mod orders;
pub mod reports;
pub mod users;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use booktime_core::StaffRole;
use booktime_core::access::{Resource, can_view, field_access};

use crate::error::AppError;
use crate::middleware::Staff;
use crate::models::OrderScope;

/// Refuse the request unless the role may see `resource` at all.
pub(crate) fn ensure_visible(staff: &Staff, resource: Resource) -> Result<(), AppError> {
    if can_view(staff.role, resource) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "Role '{}' has no access here",
            staff.role
        )))
    }
}

/// Orders a role may look at: dispatchers only work on paid ones.
pub(crate) const fn order_scope(role: StaffRole) -> OrderScope {
    match role {
        StaffRole::Dispatcher => OrderScope::Paid,
        StaffRole::Owner | StaffRole::CentralOffice => OrderScope::All,
    }
}

/// Serialize `value` and drop every key hidden from the role.
pub(crate) fn redact<T: Serialize>(
    role: StaffRole,
    resource: Resource,
    value: &T,
) -> Result<Value, AppError> {
    let mut value = serde_json::to_value(value).map_err(|e| AppError::Internal(e.to_string()))?;
    if let Value::Object(map) = &mut value {
        for field in resource.fields() {
            if !field_access(role, resource, field).is_visible() {
                map.remove(field.key());
            }
        }
    }
    Ok(value)
}

pub(crate) fn redact_all<T: Serialize>(
    role: StaffRole,
    resource: Resource,
    values: &[T],
) -> Result<Vec<Value>, AppError> {
    values
        .iter()
        .map(|value| redact(role, resource, value))
        .collect()
}

/// Keys a write touches. Nested objects (order address snapshots) are
/// flattened to `{outer}_{inner}`.
fn written_keys(body: &Map<String, Value>) -> Vec<String> {
    body.iter()
        .flat_map(|(key, value)| match value {
            Value::Object(inner) => inner.keys().map(|k| format!("{key}_{k}")).collect(),
            _ => vec![key.clone()],
        })
        .collect()
}

/// Check every key of a write against the policy, then deserialize it.
///
/// Unknown keys are a bad request; known keys the role may not edit are
/// forbidden.
pub(crate) fn checked_write<T: DeserializeOwned>(
    staff: &Staff,
    resource: Resource,
    body: Value,
) -> Result<T, AppError> {
    let Value::Object(map) = &body else {
        return Err(AppError::BadRequest("Expected a JSON object".to_string()));
    };

    let fields = resource.fields();
    for key in written_keys(map) {
        let field = fields
            .iter()
            .copied()
            .find(|field| field.key() == key)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown field '{key}'")))?;
        if !field_access(staff.role, resource, field).is_editable() {
            return Err(AppError::Forbidden(format!("Field '{key}' is read-only")));
        }
    }

    serde_json::from_value(body).map_err(|e| AppError::BadRequest(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::{ProductUpdate, User};
    use booktime_core::{Email, UserId};
    use chrono::Utc;
    use serde_json::json;

    fn staff(role: StaffRole) -> Staff {
        Staff {
            user: User {
                id: UserId::new(1),
                email: Email::parse("staff@booktime.domain").unwrap(),
                first_name: String::new(),
                last_name: String::new(),
                is_active: true,
                role: Some(role),
                date_joined: Utc::now(),
            },
            role,
        }
    }

    #[test]
    fn test_written_keys_flatten_snapshots() {
        let body = json!({"status": "paid", "billing": {"city": "Leeds"}});
        let Value::Object(map) = body else {
            unreachable!()
        };
        let mut keys = written_keys(&map);
        keys.sort();
        assert_eq!(keys, ["billing_city", "status"]);
    }

    #[test]
    fn test_central_office_cannot_rename_product() {
        let result = checked_write::<ProductUpdate>(
            &staff(StaffRole::CentralOffice),
            Resource::Product,
            json!({"name": "New name"}),
        );
        assert!(matches!(result, Err(AppError::Forbidden(_))));

        let update = checked_write::<ProductUpdate>(
            &staff(StaffRole::CentralOffice),
            Resource::Product,
            json!({"in_stock": false}),
        )
        .unwrap();
        assert_eq!(update.in_stock, Some(false));
    }

    #[test]
    fn test_unknown_key_is_bad_request() {
        let result = checked_write::<ProductUpdate>(
            &staff(StaffRole::Owner),
            Resource::Product,
            json!({"colour": "red"}),
        );
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_dispatcher_sees_no_billing() {
        let order = json!({
            "id": 1,
            "status": "paid",
            "billing_name": "Ada",
            "shipping_name": "Ada",
        });
        let value = redact(StaffRole::Dispatcher, Resource::Order, &order).unwrap();
        assert!(value.get("billing_name").is_none());
        assert_eq!(value["shipping_name"], "Ada");

        let value = redact(StaffRole::Owner, Resource::Order, &order).unwrap();
        assert_eq!(value["billing_name"], "Ada");
    }
}
