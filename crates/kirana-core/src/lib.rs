//! # kirana-core: Pure Business Logic for Kirana
//!
//! The heart of the Kirana e-commerce backend: all business rules as
//! pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Kirana Architecture                        │
//! │                                                                 │
//! │  HTTP client ──► apps/storefront-api (axum handlers)            │
//! │                           │                                     │
//! │  ┌────────────────────────▼────────────────────────────────┐    │
//! │  │              ★ kirana-core (THIS CRATE) ★               │    │
//! │  │                                                         │    │
//! │  │   ┌────────┐ ┌────────┐ ┌────────┐ ┌─────────────────┐  │    │
//! │  │   │ types  │ │ money  │ │  cart  │ │ pricing/validate│  │    │
//! │  │   │ Order  │ │ Money  │ │  Cart  │ │ OrderPricing    │  │    │
//! │  │   │Invoice │ │TaxRate │ │CartItem│ │ field checks    │  │    │
//! │  │   └────────┘ └────────┘ └────────┘ └─────────────────┘  │    │
//! │  │                                                         │    │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS    │    │
//! │  └────────────────────────┬────────────────────────────────┘    │
//! │                           │                                     │
//! │              kirana-db (SQLite repositories)                    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Order, Invoice, BulkOrder, …)
//! - [`money`] - Integer-cents money type (no floating point)
//! - [`cart`] - The cart aggregate and its totals
//! - [`pricing`] - Checkout price breakdown (shipping rule + GST)
//! - [`validation`] - Business rule validation
//! - [`error`] - Domain error types

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartItem};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, TaxRate};
pub use pricing::OrderPricing;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// GST rate applied to every order's items total (1800 bps = 18%).
pub const GST_RATE_BPS: u32 = 1800;

/// Items totals strictly above this ship free (Rs 1000.00 in cents).
pub const FREE_SHIPPING_THRESHOLD_CENTS: i64 = 100_000;

/// Flat shipping fee below the free-shipping threshold (Rs 50.00).
pub const FLAT_SHIPPING_FEE_CENTS: i64 = 5_000;

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line in a cart.
pub const MAX_ITEM_QUANTITY: i64 = 999;
