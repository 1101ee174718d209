//! Integration tests for BookTime.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p booktime-integration-tests
//! ```
//!
//! The tests drive the full storefront router in process with
//! `tower::ServiceExt::oneshot`. Data lives in the in-memory store and
//! sessions in the in-memory session store, so no database is needed.
//!
//! # Test Categories
//!
//! - `shop_basket` - Basket, merge on login and checkout
//! - `fulfillment` - Order-line status updates and the partner API
//! - `office_roles` - Back-office field policy per staff role
//! - `accounts` - Signup, login, address book, contact form

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::{Arc, Mutex};

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::Value;
use tower::ServiceExt;

use booktime_core::{AddressFields, CountryCode, Email, Price, Slug, StaffRole};
use booktime_storefront::AppOptions;
use booktime_storefront::db::{CatalogStore, MemoryStore};
use booktime_storefront::models::{NewProduct, Product, User};
use booktime_storefront::services::auth::{AuthService, Registration};
use booktime_storefront::services::email::{Mailer, OutgoingEmail};
use booktime_storefront::state::AppState;

/// Address of customer service used by the test app.
pub const CUSTOMER_SERVICE: &str = "customerservice@booktime.domain";

/// Password given to every seeded account.
pub const PASSWORD: &str = "correct horse battery";

/// The storefront wired to in-memory stores.
pub struct TestApp {
    router: Router,
    pub store: Arc<MemoryStore>,
    pub outbox: Arc<Mutex<Vec<OutgoingEmail>>>,
}

impl TestApp {
    /// Insecure cookies and no rate limits.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(AppOptions::default())
    }

    #[must_use]
    pub fn with_options(options: AppOptions) -> Self {
        let store = Arc::new(MemoryStore::new());
        let (mailer, outbox) = Mailer::outbox();
        let state = AppState::new(store.clone(), mailer, CUSTOMER_SERVICE.to_owned());
        let router =
            booktime_storefront::app(state, tower_sessions::MemoryStore::default(), options);

        Self {
            router,
            store,
            outbox,
        }
    }

    /// A client with its own cookie jar.
    #[must_use]
    pub fn client(&self) -> TestClient {
        TestClient {
            router: self.router.clone(),
            cookie: None,
            authorization: None,
        }
    }

    /// A client sending HTTP Basic credentials on every request.
    #[must_use]
    pub fn basic_client(&self, email: &str, password: &str) -> TestClient {
        let token = STANDARD.encode(format!("{email}:{password}"));
        TestClient {
            router: self.router.clone(),
            cookie: None,
            authorization: Some(format!("Basic {token}")),
        }
    }

    /// The router, for requests built by hand.
    #[must_use]
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Messages sent so far.
    #[must_use]
    pub fn sent_emails(&self) -> Vec<OutgoingEmail> {
        self.outbox.lock().unwrap().clone()
    }

    /// Create an account with [`PASSWORD`].
    pub async fn seed_user(&self, email: &str, role: Option<StaffRole>) -> User {
        let registration = Registration {
            email: email.to_owned(),
            password: PASSWORD.to_owned(),
            first_name: String::new(),
            last_name: String::new(),
        };
        AuthService::new(self.store.as_ref())
            .register(&registration, role)
            .await
            .unwrap()
    }

    /// Create an active product priced at `cents`.
    pub async fn seed_product(&self, name: &str, cents: i64) -> Product {
        let product = NewProduct {
            name: name.to_owned(),
            slug: None,
            description: String::new(),
            price: Price::from_cents(cents).unwrap(),
            active: true,
            in_stock: true,
            tags: Vec::new(),
        };
        self.store
            .create_product(&product, &Slug::from_name(name))
            .await
            .unwrap()
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Address fields for a test address.
#[must_use]
pub fn address(name: &str) -> AddressFields {
    AddressFields {
        name: name.to_owned(),
        address1: "1 High Street".to_owned(),
        address2: String::new(),
        zip_code: "LS1 1AA".to_owned(),
        city: "Leeds".to_owned(),
        country: CountryCode::Uk,
    }
}

/// Parse an email known to be valid.
#[must_use]
pub fn email(value: &str) -> Email {
    Email::parse(value).unwrap()
}

/// Drives the router like a browser: keeps the session cookie between calls.
pub struct TestClient {
    router: Router,
    cookie: Option<String>,
    authorization: Option<String>,
}

/// Status, headers and JSON body (or `Null`) of a response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestClient {
    pub async fn request(&mut self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        if let Some(authorization) = &self.authorization {
            builder = builder.header(header::AUTHORIZATION, authorization);
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_owned());
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&mut self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&mut self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn patch(&mut self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::PATCH, uri, Some(body)).await
    }

    pub async fn delete(&mut self, uri: &str) -> TestResponse {
        self.request(Method::DELETE, uri, None).await
    }

    /// Log in through `/auth/login`.
    pub async fn login(&mut self, email: &str) -> TestResponse {
        let response = self
            .post(
                "/auth/login",
                serde_json::json!({"email": email, "password": PASSWORD}),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        response
    }
}
