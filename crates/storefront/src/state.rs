//! Application state shared across handlers.

use std::sync::Arc;

use crate::db::Store;
use crate::services::email::Mailer;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the store, the mailer and the customer-service address.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn Store>,
    mailer: Mailer,
    customer_service_address: String,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, mailer: Mailer, customer_service_address: String) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                store,
                mailer,
                customer_service_address,
            }),
        }
    }

    /// The persistence backend.
    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    #[must_use]
    pub fn mailer(&self) -> &Mailer {
        &self.inner.mailer
    }

    /// Recipient of contact-form messages.
    #[must_use]
    pub fn customer_service_address(&self) -> &str {
        &self.inner.customer_service_address
    }
}
