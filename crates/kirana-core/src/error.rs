//! # Error Types
//!
//! Domain-specific error types for kirana-core.
//!
//! ## Error Hierarchy
//! ```text
//! kirana-core errors (this file)
//! ├── CoreError        - Business rule violations
//! └── ValidationError  - Input validation failures
//!
//! kirana-db errors (separate crate)
//! └── DbError          - Database operation failures
//!
//! API errors (in app)
//! └── ApiError         - What HTTP clients see (status + envelope)
//!
//! Flow: ValidationError → CoreError → DbError → ApiError → client
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These represent business rule violations detected before or during a
/// workflow. They are translated to HTTP status codes at the API layer.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found (missing or soft-deleted).
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Product exists but is not purchasable (soft-deleted / deactivated).
    #[error("Product is not available: {0}")]
    ProductUnavailable(String),

    /// A cart mutation would exceed the product's current stock.
    #[error("Only {available} of {name} available in stock, requested {requested}")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// Stock ran out between cart time and order time.
    #[error("Product {name} is out of stock or has insufficient quantity")]
    OutOfStock { name: String },

    /// Order creation attempted against an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// The referenced cart line does not exist.
    #[error("Cart item not found: {0}")]
    CartItemNotFound(String),

    /// Cart has exceeded maximum allowed distinct lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds the per-item maximum.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Order not found.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Illegal order status change (e.g. cancelling a delivered order).
    #[error("Order cannot be cancelled. Current status: {current_status}")]
    InvalidTransition { current_status: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when user input doesn't meet requirements. Used for early
/// validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be at least 1")]
    MustBePositive { field: String },

    /// Invalid format (e.g. malformed email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
