//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Health check
//! GET  /health/ready           - Readiness check (store reachable)
//!
//! # Catalog
//! GET  /products               - Active products (?tag=slug)
//! GET  /products/{slug}        - Product detail
//! GET  /tags                   - Active tags
//!
//! # Basket (session)
//! GET    /basket               - Basket lines and item count
//! POST   /basket/add           - Add one unit of a product
//! PATCH  /basket/lines/{id}    - Change a line's quantity
//! DELETE /basket/lines/{id}    - Remove a line
//! POST   /checkout             - Convert the basket into an order (login)
//!
//! # Auth
//! POST /auth/signup            - Create an account and log in
//! POST /auth/login             - Log in, merging the session basket
//! POST /auth/logout            - Log out
//!
//! # Contact
//! POST /contact                - Message customer service
//!
//! # Account (login)
//! GET  /account/addresses      - Address book
//! POST /account/addresses      - Add an address
//! GET|PUT|DELETE /account/addresses/{id}
//! GET  /account/orders         - Order history
//! GET  /account/orders/{id}    - Order detail
//!
//! # Back office (staff session, per-role field policy)
//! GET|POST /office/products, GET|PATCH|DELETE /office/products/{id}
//! GET  /office/products/{id}/images
//! GET|POST /office/tags, GET|PATCH|DELETE /office/tags/{id}
//! GET  /office/users, GET|PATCH /office/users/{id}
//! GET  /office/addresses
//! GET  /office/baskets         - ?status=open|submitted
//! GET  /office/orders          - ?status=
//! GET|PATCH /office/orders/{id}
//! PUT  /office/orders/{id}/status
//! GET  /office/orderlines      - ?order=&status=
//! PATCH /office/orderlines/{id}
//! GET  /office/reports/orders-per-day   - ?period=30|60|90
//! GET  /office/reports/top-products     - ?period=30|60|90
//!
//! # Fulfillment API (HTTP Basic, paid orders only)
//! GET  /api/orderlines         - ?order=&status=
//! GET|PUT|PATCH /api/orderlines/{id}
//! GET  /api/orders
//! GET  /api/orders/{id}
//! ```

pub mod account;
pub mod api;
pub mod auth;
pub mod basket;
pub mod catalog;
pub mod contact;
pub mod office;

use axum::{
    Router,
    routing::{get, patch, post, put},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the basket routes router.
pub fn basket_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(basket::show))
        .route("/add", post(basket::add))
        .route(
            "/lines/{id}",
            patch(basket::update).delete(basket::remove),
        )
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/addresses",
            get(account::addresses).post(account::create_address),
        )
        .route(
            "/addresses/{id}",
            get(account::show_address)
                .put(account::update_address)
                .delete(account::delete_address),
        )
        .route("/orders", get(account::orders))
        .route("/orders/{id}", get(account::order))
}

/// Create the back-office routes router.
pub fn office_routes() -> Router<AppState> {
    use office::{catalog, orders, reports, users};

    Router::new()
        // Catalog
        .route(
            "/products",
            get(catalog::products).post(catalog::create_product),
        )
        .route(
            "/products/{id}",
            get(catalog::product)
                .patch(catalog::update_product)
                .delete(catalog::delete_product),
        )
        .route("/products/{id}/images", get(catalog::product_images))
        .route("/tags", get(catalog::tags).post(catalog::create_tag))
        .route(
            "/tags/{id}",
            get(catalog::tag)
                .patch(catalog::update_tag)
                .delete(catalog::delete_tag),
        )
        // Accounts
        .route("/users", get(users::users))
        .route("/users/{id}", get(users::user).patch(users::update_user))
        .route("/addresses", get(users::addresses))
        // Orders
        .route("/baskets", get(orders::baskets))
        .route("/orders", get(orders::orders))
        .route(
            "/orders/{id}",
            get(orders::order).patch(orders::update_order),
        )
        .route("/orders/{id}/status", put(orders::set_order_status))
        .route("/orderlines", get(orders::order_lines))
        .route("/orderlines/{id}", patch(orders::set_line_status))
        // Reports
        .route("/reports/orders-per-day", get(reports::orders_per_day))
        .route("/reports/top-products", get(reports::top_products))
}

/// Create the fulfillment API router.
pub fn api_routes() -> Router<AppState> {
    use api::orders;

    Router::new()
        .route("/orderlines", get(orders::order_lines))
        .route(
            "/orderlines/{id}",
            get(orders::order_line)
                .put(orders::update_order_line)
                .patch(orders::update_order_line),
        )
        .route("/orders", get(orders::orders))
        .route("/orders/{id}", get(orders::order))
}

/// Create all routes for the storefront.
///
/// With `rate_limit` set, `/auth` and `/api` are throttled per client IP.
pub fn routes(rate_limit: bool) -> Router<AppState> {
    let mut auth = auth_routes();
    let mut api = api_routes();
    if rate_limit {
        auth = auth.layer(auth_rate_limiter());
        api = api.layer(api_rate_limiter());
    }

    Router::new()
        // Catalog
        .route("/products", get(catalog::index))
        .route("/products/{slug}", get(catalog::show))
        .route("/tags", get(catalog::tags))
        // Basket and checkout
        .nest("/basket", basket_routes())
        .route("/checkout", post(basket::checkout))
        // Account routes
        .nest("/account", account_routes())
        // Auth routes
        .nest("/auth", auth)
        .route("/contact", post(contact::submit))
        // Back office
        .nest("/office", office_routes())
        // Fulfillment API
        .nest("/api", api)
}
