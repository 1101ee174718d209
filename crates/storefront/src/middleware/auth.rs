//! Authentication extractors.
//!
//! Shop and back-office routes authenticate through the session; the
//! fulfillment API uses HTTP Basic credentials on every request.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::json;
use tower_sessions::Session;

use booktime_core::{BasketId, StaffRole};

use crate::models::{CurrentUser, User, session_keys};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Why an authenticated extractor refused the request.
#[derive(Debug)]
pub enum AuthRejection {
    /// No valid login.
    Unauthorized,
    /// Logged in, but without the required role.
    Forbidden,
    /// The store could not be reached while checking the user.
    Unavailable,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "Login required"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "Staff access required"),
            Self::Unavailable => (StatusCode::SERVICE_UNAVAILABLE, "Service unavailable"),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

async fn session_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

/// Extractor that requires a logged-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn account(RequireUser(user): RequireUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireUser(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session_user(parts)
            .await
            .map(Self)
            .ok_or(AuthRejection::Unauthorized)
    }
}

/// Extractor that optionally gets the current user.
pub struct OptionalUser(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_user(parts).await))
    }
}

/// A staff member with the role they hold right now.
#[derive(Debug, Clone)]
pub struct Staff {
    pub user: User,
    pub role: StaffRole,
}

impl Staff {
    fn from_user(user: User) -> Result<Self, AuthRejection> {
        if !user.is_active {
            return Err(AuthRejection::Unauthorized);
        }
        let role = user.role.ok_or(AuthRejection::Forbidden)?;
        Ok(Self { user, role })
    }
}

/// Extractor for back-office routes: a logged-in, active staff account.
///
/// The role is re-read from the store on each request, so a demotion takes
/// effect without waiting for the session to end.
pub struct RequireStaff(pub Staff);

impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let current = session_user(parts)
            .await
            .ok_or(AuthRejection::Unauthorized)?;

        let user = state
            .store()
            .get_user(current.id)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to load staff user");
                AuthRejection::Unavailable
            })?
            .ok_or(AuthRejection::Unauthorized)?;

        Staff::from_user(user).map(Self)
    }
}

/// Extractor for the fulfillment API: HTTP Basic credentials of a staff account.
pub struct ApiStaff(pub Staff);

/// Split an `Authorization: Basic ...` header into email and password.
fn basic_credentials(parts: &Parts) -> Option<(String, String)> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = String::from_utf8(STANDARD.decode(encoded.trim()).ok()?).ok()?;
    let (email, password) = decoded.split_once(':')?;
    Some((email.to_owned(), password.to_owned()))
}

impl FromRequestParts<AppState> for ApiStaff {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let challenge = || {
            let mut response = AuthRejection::Unauthorized.into_response();
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                header::HeaderValue::from_static("Basic realm=\"booktime\""),
            );
            response
        };

        let (email, password) = basic_credentials(parts).ok_or_else(challenge)?;
        let user = AuthService::new(state.store())
            .login(&email, &password)
            .await
            .map_err(|_| challenge())?;

        Staff::from_user(user)
            .map(Self)
            .map_err(IntoResponse::into_response)
    }
}

/// Store the logged-in user in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

/// The basket id the session is shopping with.
///
/// # Errors
///
/// Returns an error if the session cannot be read.
pub async fn session_basket_id(
    session: &Session,
) -> Result<Option<BasketId>, tower_sessions::session::Error> {
    session.get(session_keys::BASKET_ID).await
}

/// Point the session at `basket`, or forget the basket with `None`.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_session_basket(
    session: &Session,
    basket: Option<BasketId>,
) -> Result<(), tower_sessions::session::Error> {
    match basket {
        Some(id) => session.insert(session_keys::BASKET_ID, id).await,
        None => session
            .remove::<BasketId>(session_keys::BASKET_ID)
            .await
            .map(|_| ()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_auth(value: &str) -> Parts {
        let request = Request::builder()
            .header(header::AUTHORIZATION, value)
            .body(())
            .unwrap();
        request.into_parts().0
    }

    #[test]
    fn test_basic_credentials_decoded() {
        let encoded = STANDARD.encode("dispatch@booktime.domain:secret:with:colons");
        let parts = parts_with_auth(&format!("Basic {encoded}"));
        assert_eq!(
            basic_credentials(&parts),
            Some((
                "dispatch@booktime.domain".to_owned(),
                "secret:with:colons".to_owned()
            ))
        );
    }

    #[test]
    fn test_non_basic_scheme_ignored() {
        let parts = parts_with_auth("Bearer token");
        assert_eq!(basic_credentials(&parts), None);
    }
}
