//! Basket merge on login.

use thiserror::Error;
use tracing::instrument;

use booktime_core::merge::{MergeConflict, MergePlan, SessionBasket, plan_merge};
use booktime_core::{BasketId, UserId};

use crate::db::{RepositoryError, Store};

/// Errors from the login merge.
#[derive(Debug, Error)]
pub enum MergeError {
    /// The user's baskets violate the one-open-basket rule.
    #[error(transparent)]
    Conflict(#[from] MergeConflict),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Reconcile the session basket with the user's open basket.
///
/// Returns the basket the session should use from now on, or `None` when the
/// session basket id should be left as it is. The check for an existing open
/// basket and the write that follows are not guarded against a concurrent
/// login of the same user.
///
/// # Errors
///
/// `MergeError::Conflict` when the user already owns several open baskets.
#[instrument(skip(store))]
pub async fn merge_on_login(
    store: &dyn Store,
    session_basket: Option<BasketId>,
    user: UserId,
) -> Result<Option<BasketId>, MergeError> {
    let session = match session_basket {
        Some(id) => store
            .get_basket(id)
            .await?
            .filter(|basket| basket.is_open())
            .map(|basket| SessionBasket {
                id: basket.id,
                user: basket.user_id,
            }),
        None => None,
    };

    if session.is_none() {
        return Ok(None);
    }

    let open = store.open_baskets_for_user(user).await?;
    let plan = plan_merge(session, user, &open)?;

    match plan {
        MergePlan::Nothing => {}
        MergePlan::AssignUser { basket, user } => {
            store.assign_user(basket, user).await?;
            tracing::info!(basket_id = %basket, "Anonymous basket assigned to user");
        }
        MergePlan::MoveLines { from, into } => {
            store.move_lines_and_delete(from, into).await?;
            tracing::info!(from = %from, into = %into, "Session basket merged into open basket");
        }
    }

    Ok(plan.active_basket())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::{BasketStore, MemoryStore, UserStore};
    use crate::models::NewUser;
    use booktime_core::Email;

    async fn user(store: &MemoryStore) -> UserId {
        store
            .create_user(&NewUser {
                email: Email::parse("ada@booktime.domain").unwrap(),
                password_hash: "x".to_owned(),
                first_name: String::new(),
                last_name: String::new(),
                role: None,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_no_session_basket_is_noop() {
        let store = MemoryStore::new();
        let user = user(&store).await;
        assert_eq!(merge_on_login(&store, None, user).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_anonymous_basket_assigned() {
        let store = MemoryStore::new();
        let user = user(&store).await;
        let anonymous = store.create_basket(None).await.unwrap();

        let active = merge_on_login(&store, Some(anonymous.id), user).await.unwrap();

        assert_eq!(active, Some(anonymous.id));
        let basket = store.get_basket(anonymous.id).await.unwrap().unwrap();
        assert_eq!(basket.user_id, Some(user));
    }

    #[tokio::test]
    async fn test_multiple_open_baskets_reported() {
        let store = MemoryStore::new();
        let user = user(&store).await;
        store.create_basket(Some(user)).await.unwrap();
        store.create_basket(Some(user)).await.unwrap();
        let anonymous = store.create_basket(None).await.unwrap();

        assert!(matches!(
            merge_on_login(&store, Some(anonymous.id), user).await,
            Err(MergeError::Conflict(MergeConflict::MultipleOpenBaskets { count: 2, .. }))
        ));
    }
}
