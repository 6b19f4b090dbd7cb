//! # storefront-api: REST API Server for Kirana
//!
//! The HTTP application tier. Business rules live in kirana-core and
//! persistence in kirana-db; this crate wires them to the outside world.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Storefront API                              │
//! │                                                                 │
//! │  HTTP request                                                   │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  axum Router ──► TraceLayer / CorsLayer                         │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  AuthUser / AdminUser extractor (JWT)                           │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  handler ──► kirana-core (rules) ──► kirana-db (repositories)   │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  {"success", "message"?, "data"?} envelope                      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Environment-driven configuration
//! - [`auth`] - JWT issuance/validation, password hashing, extractors
//! - [`handlers`] - Request handlers per surface
//! - [`response`] - The uniform response envelope
//! - [`error`] - ApiError and the central error mapping

use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use kirana_db::Database;

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod response;

#[cfg(test)]
pub mod test_support;

use crate::auth::JwtManager;
use crate::config::ApiConfig;

/// Shared application state, injected into handlers through axum.
///
/// The database handle is constructed once by the entry point and passed
/// in here; nothing in the request path reaches for a global.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<JwtManager>,
}

impl AppState {
    pub fn new(db: Database, config: &ApiConfig) -> Self {
        AppState {
            db,
            jwt: Arc::new(JwtManager::new(
                config.jwt_secret.clone(),
                config.jwt_access_lifetime_secs,
            )),
        }
    }
}

/// Builds the application router with every route mounted.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        // Accounts
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/me", get(handlers::auth::me))
        // Public catalog
        .route("/api/products", get(handlers::catalog::list_products))
        .route("/api/products/search", get(handlers::catalog::search_products))
        .route("/api/products/:id", get(handlers::catalog::get_product))
        .route("/api/categories", get(handlers::catalog::list_categories))
        .route("/api/categories/:id", get(handlers::catalog::get_category))
        // Cart
        .route(
            "/api/cart",
            get(handlers::cart::get_cart).delete(handlers::cart::clear_cart),
        )
        .route("/api/cart/items", post(handlers::cart::add_item))
        .route(
            "/api/cart/items/:item_id",
            put(handlers::cart::update_item).delete(handlers::cart::remove_item),
        )
        // Orders
        .route(
            "/api/orders",
            post(handlers::orders::create_order).get(handlers::orders::list_my_orders),
        )
        .route("/api/orders/summary", get(handlers::orders::order_summary))
        .route("/api/orders/:id", get(handlers::orders::get_order))
        .route("/api/orders/:id/cancel", put(handlers::orders::cancel_order))
        // Invoices (admin)
        .route(
            "/api/invoices/:order_id",
            post(handlers::invoices::create_invoice).get(handlers::invoices::get_invoice),
        )
        // Bulk order requests
        .route(
            "/api/bulk-orders",
            post(handlers::bulk_orders::create_bulk_order)
                .get(handlers::bulk_orders::list_bulk_orders),
        )
        .route(
            "/api/bulk-orders/:id",
            put(handlers::bulk_orders::update_bulk_order)
                .delete(handlers::bulk_orders::delete_bulk_order),
        )
        // Admin: catalog
        .route(
            "/api/admin/products",
            post(handlers::admin::create_product).get(handlers::admin::list_products),
        )
        .route(
            "/api/admin/products/:id",
            put(handlers::admin::update_product).delete(handlers::admin::delete_product),
        )
        .route("/api/admin/categories", post(handlers::admin::create_category))
        .route(
            "/api/admin/categories/:id",
            put(handlers::admin::update_category).delete(handlers::admin::delete_category),
        )
        // Admin: orders
        .route("/api/admin/orders", get(handlers::admin::list_orders))
        .route("/api/admin/orders/:id/status", put(handlers::admin::set_order_status))
        .route("/api/admin/orders/:id", delete(handlers::admin::delete_order))
        // Admin: users
        .route(
            "/api/admin/users",
            post(handlers::admin::create_user).get(handlers::admin::list_users),
        )
        .route(
            "/api/admin/users/:id",
            put(handlers::admin::update_user).delete(handlers::admin::delete_user),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
