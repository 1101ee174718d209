//! Login-time basket merge planning.
//!
//! When a shopper authenticates, the basket held in their session is
//! reconciled with any basket they already left open. This module decides
//! what to do; the store carries it out.
//!
//! Lines are re-parented as they are, so two rows for the same product can
//! end up in one basket. Quantities are never coalesced.

use thiserror::Error;

use crate::types::{BasketId, UserId};

/// The basket referenced by the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionBasket {
    pub id: BasketId,
    pub user: Option<UserId>,
}

/// What the merge should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePlan {
    /// Leave everything as it is.
    Nothing,
    /// Give the anonymous session basket to the user; it stays active.
    AssignUser { basket: BasketId, user: UserId },
    /// Move all lines from the session basket into the user's open basket,
    /// delete the session basket and make `into` the active basket.
    MoveLines { from: BasketId, into: BasketId },
}

impl MergePlan {
    /// The basket the session should point at once the plan has run.
    #[must_use]
    pub const fn active_basket(&self) -> Option<BasketId> {
        match self {
            Self::Nothing => None,
            Self::AssignUser { basket, .. } => Some(*basket),
            Self::MoveLines { into, .. } => Some(*into),
        }
    }
}

/// The user's baskets are in a state the merge cannot reconcile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeConflict {
    /// A user may own at most one open basket.
    #[error("user {user} has {count} open baskets")]
    MultipleOpenBaskets { user: UserId, count: usize },
}

/// Decide how to reconcile the session basket with the user's open basket.
///
/// `open_baskets` lists every OPEN basket owned by `user`. A session basket
/// already owned by someone else is left alone.
///
/// # Errors
///
/// [`MergeConflict::MultipleOpenBaskets`] when the user owns more than one
/// open basket. The fault is reported, not repaired.
pub fn plan_merge(
    session: Option<SessionBasket>,
    user: UserId,
    open_baskets: &[BasketId],
) -> Result<MergePlan, MergeConflict> {
    let Some(session) = session else {
        return Ok(MergePlan::Nothing);
    };

    if session.user.is_some_and(|owner| owner != user) {
        return Ok(MergePlan::Nothing);
    }

    match open_baskets {
        [] => Ok(MergePlan::AssignUser {
            basket: session.id,
            user,
        }),
        [existing] if *existing == session.id => Ok(MergePlan::Nothing),
        [existing] => Ok(MergePlan::MoveLines {
            from: session.id,
            into: *existing,
        }),
        many => Err(MergeConflict::MultipleOpenBaskets {
            user,
            count: many.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER: UserId = UserId::new(1);

    fn anonymous(id: i32) -> Option<SessionBasket> {
        Some(SessionBasket {
            id: BasketId::new(id),
            user: None,
        })
    }

    #[test]
    fn test_no_session_basket_is_noop() {
        assert_eq!(plan_merge(None, USER, &[BasketId::new(3)]), Ok(MergePlan::Nothing));
    }

    #[test]
    fn test_existing_open_basket_absorbs_session_basket() {
        let plan = plan_merge(anonymous(2), USER, &[BasketId::new(1)]).unwrap_or(MergePlan::Nothing);
        assert_eq!(
            plan,
            MergePlan::MoveLines {
                from: BasketId::new(2),
                into: BasketId::new(1)
            }
        );
        assert_eq!(plan.active_basket(), Some(BasketId::new(1)));
    }

    #[test]
    fn test_no_open_basket_assigns_user() {
        let plan = plan_merge(anonymous(2), USER, &[]).unwrap_or(MergePlan::Nothing);
        assert_eq!(
            plan,
            MergePlan::AssignUser {
                basket: BasketId::new(2),
                user: USER
            }
        );
        assert_eq!(plan.active_basket(), Some(BasketId::new(2)));
    }

    #[test]
    fn test_session_basket_already_users_own() {
        let session = Some(SessionBasket {
            id: BasketId::new(5),
            user: Some(USER),
        });
        assert_eq!(
            plan_merge(session, USER, &[BasketId::new(5)]),
            Ok(MergePlan::Nothing)
        );
    }

    #[test]
    fn test_someone_elses_basket_is_left_alone() {
        let session = Some(SessionBasket {
            id: BasketId::new(5),
            user: Some(UserId::new(9)),
        });
        assert_eq!(plan_merge(session, USER, &[]), Ok(MergePlan::Nothing));
    }

    #[test]
    fn test_multiple_open_baskets_is_an_error() {
        let result = plan_merge(anonymous(3), USER, &[BasketId::new(1), BasketId::new(2)]);
        assert_eq!(
            result,
            Err(MergeConflict::MultipleOpenBaskets { user: USER, count: 2 })
        );
    }
}
