//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! Handler
//!   Result<Reply, ApiError>
//!        │
//!        ├── CoreError  ── business rule violation ──┐
//!        ├── DbError    ── persistence failure ──────┤
//!        └── direct ApiError (auth, validation) ─────┤
//!                                                    ▼
//!                              ApiError { code, message }
//!                                                    │
//!                                                    ▼
//!              IntoResponse: status code + {"success": false, "message"}
//! ```
//!
//! Internal failures are logged with their detail and surfaced to the
//! client as a generic message; validation and business errors carry
//! their own safe text.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use kirana_core::{CoreError, ValidationError};
use kirana_db::DbError;

use crate::response::ApiResponse;

/// API error returned from handlers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling.
    pub code: ErrorCode,

    /// Human-readable error message for display.
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Missing or invalid credentials (401)
    Unauthorized,

    /// Authenticated but not allowed (403)
    Forbidden,

    /// Input validation or business-rule failure (400)
    ValidationError,

    /// Cart mutation exceeds current stock (400)
    InsufficientStock,

    /// Stock ran out before the order could be placed (400)
    OutOfStock,

    /// Order creation against an empty cart (400)
    EmptyCart,

    /// Illegal order status change (400)
    InvalidTransition,

    /// Uniqueness violation, e.g. duplicate invoice (400)
    AlreadyExists,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found", resource))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    /// Creates a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Forbidden, message)
    }

    /// Creates an already-exists error.
    pub fn already_exists(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::AlreadyExists, message)
    }

    /// Creates an internal error with a safe client-facing message.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    /// HTTP status code for this error.
    pub fn status(&self) -> StatusCode {
        match self.code {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::ValidationError
            | ErrorCode::InsufficientStock
            | ErrorCode::OutOfStock
            | ErrorCode::EmptyCart
            | ErrorCode::InvalidTransition
            | ErrorCode::AlreadyExists => StatusCode::BAD_REQUEST,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse {
            success: false,
            message: Some(self.message.clone()),
            data: None,
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, .. } => ApiError::not_found(&entity),
            DbError::UniqueViolation { field } => {
                ApiError::already_exists(format!("{} already exists", field))
            }
            DbError::StockConflict { .. } => ApiError::new(
                ErrorCode::OutOfStock,
                "Product is out of stock or has insufficient quantity",
            ),
            DbError::Conflict { message } => {
                ApiError::new(ErrorCode::InvalidTransition, message)
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(_) => ApiError::not_found("Product"),
            CoreError::OrderNotFound(_) => ApiError::not_found("Order"),
            CoreError::CartItemNotFound(_) => ApiError::not_found("Cart item"),
            CoreError::ProductUnavailable(_) => {
                ApiError::validation("Product is not available")
            }
            CoreError::InsufficientStock {
                available, ..
            } => ApiError::new(
                ErrorCode::InsufficientStock,
                format!("Only {} items available in stock", available),
            ),
            CoreError::OutOfStock { name } => ApiError::new(
                ErrorCode::OutOfStock,
                format!("Product {} is out of stock or insufficient quantity", name),
            ),
            CoreError::EmptyCart => ApiError::new(ErrorCode::EmptyCart, "Cart is empty"),
            CoreError::CartTooLarge { max } => ApiError::validation(format!(
                "Cart cannot have more than {} items",
                max
            )),
            CoreError::QuantityTooLarge { requested, max } => ApiError::validation(format!(
                "Quantity {} exceeds maximum allowed ({})",
                requested, max
            )),
            CoreError::InvalidTransition { current_status } => ApiError::new(
                ErrorCode::InvalidTransition,
                format!("Order cannot be cancelled. Current status: {}", current_status),
            ),
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
