//! Contact form route handler.
//!
//! Messages are forwarded to customer service by email.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use crate::error::AppError;
use crate::services::email::{CONTACT_MESSAGE_MAX, CONTACT_NAME_MAX, contact_email};
use crate::state::AppState;

/// Contact form data.
#[derive(Debug, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub message: String,
}

/// Submit a message to customer service.
///
/// POST /contact
#[instrument(skip(state, form))]
pub async fn submit(
    State(state): State<AppState>,
    Json(form): Json<ContactForm>,
) -> Result<StatusCode, AppError> {
    let email = contact_email(state.customer_service_address(), &form.name, &form.message)
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "Name (up to {CONTACT_NAME_MAX} characters) and message (up to {CONTACT_MESSAGE_MAX} characters) are required"
            ))
        })?;

    state.mailer().send(email);
    Ok(StatusCode::ACCEPTED)
}
