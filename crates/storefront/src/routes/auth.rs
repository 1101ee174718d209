//! Authentication route handlers.
//!
//! Signup and login both end with the session logged in and the basket
//! merge applied, so a shopper keeps what they put in the basket before
//! logging in.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::middleware::{session_basket_id, set_current_user, set_session_basket};
use crate::models::{CurrentUser, User};
use crate::services::auth::{AuthService, Registration};
use crate::services::basket::resolve_basket;
use crate::services::email::welcome_email;
use crate::services::merge::merge_on_login;
use crate::state::AppState;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Put `user` in a fresh session and reconcile the session basket.
async fn start_session(state: &AppState, session: &Session, user: &User) -> Result<(), AppError> {
    let basket = session_basket_id(session).await?;

    // New id on privilege change; the data (basket id included) carries over.
    session.cycle_id().await?;
    set_current_user(
        session,
        &CurrentUser {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
        },
    )
    .await?;

    // A basket the merge left alone stays only if this user may shop with it.
    let active = match merge_on_login(state.store(), basket, user.id).await? {
        Some(active) => Some(active),
        None => resolve_basket(state.store(), basket, Some(user.id))
            .await?
            .map(|kept| kept.id),
    };
    set_session_basket(session, active).await?;

    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

/// Create an account, send the welcome email and log the user in.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<Registration>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = AuthService::new(state.store())
        .register(&form, None)
        .await?;

    state.mailer().send(welcome_email(user.email.as_str()));
    start_session(&state, &session, &user).await?;

    tracing::info!(user_id = %user.id, "User signed up");
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<LoginForm>,
) -> Result<Json<User>, AppError> {
    let user = AuthService::new(state.store())
        .login(&form.email, &form.password)
        .await?;

    start_session(&state, &session, &user).await?;

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(Json(user))
}

/// End the session. The basket id goes with it.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode, AppError> {
    session.flush().await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}
