//! # Domain Types
//!
//! Core domain types for the Kirana backend.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                            │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐        │
//! │  │   Product    │   │    Order     │   │   Invoice    │        │
//! │  │  ──────────  │   │  ──────────  │   │  ──────────  │        │
//! │  │  id (UUID)   │   │  id (UUID)   │   │  id (UUID)   │        │
//! │  │  price_cents │   │  order items │   │  order (1:1) │        │
//! │  │  stock       │   │  status      │   │  priced copy │        │
//! │  │  is_active   │   │  priced once │   │  of order    │        │
//! │  └──────────────┘   └──────────────┘   └──────────────┘        │
//! │                                                                 │
//! │  Order and Invoice lines are SNAPSHOTS: product name/price/     │
//! │  image are frozen at creation and never re-read from catalog.   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Product & Category
// =============================================================================

/// An uploaded product image: public URL plus the storage provider's id
/// (needed to delete the asset later). The upload transport itself lives
/// outside this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    pub url: String,
    pub public_id: String,
}

/// A product available for sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown in the storefront.
    pub name: String,

    pub description: String,

    /// Current selling price in cents.
    pub price_cents: i64,

    /// Pre-discount price in cents, when the product is on offer.
    pub original_price_cents: Option<i64>,

    /// Category this product belongs to.
    pub category_id: String,

    pub subcategory: Option<String>,

    pub brand: Option<String>,

    /// Ordered image list; the first entry is the storefront thumbnail.
    pub images: Vec<ProductImage>,

    /// Current stock level. Never negative.
    pub stock: i64,

    /// Optional business identifier.
    pub sku: Option<String>,

    pub rating: f64,

    pub num_reviews: i64,

    /// Whether product is visible and purchasable (soft delete).
    pub is_active: bool,

    /// Highlighted on the storefront landing page.
    pub featured: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks whether the requested quantity can currently be fulfilled.
    pub fn can_fulfill(&self, quantity: i64) -> bool {
        self.is_active && self.stock >= quantity
    }

    /// URL of the first image, or empty when the product has none.
    /// Used when freezing order-item snapshots.
    pub fn first_image_url(&self) -> String {
        self.images
            .first()
            .map(|img| img.url.clone())
            .unwrap_or_default()
    }
}

/// A product category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Derives a URL slug from a category name.
    pub fn slug_from(name: &str) -> String {
        name.trim().to_lowercase().replace(' ', "-")
    }
}

// =============================================================================
// Users
// =============================================================================

/// Account role. Admin unlocks the `/api/admin` surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(()),
        }
    }
}

/// A user profile. The password hash never leaves the database layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Orders
// =============================================================================

/// How the buyer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CashOnDelivery,
    Khalti,
    Esewa,
    Bank,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::CashOnDelivery
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

/// Order fulfilment status.
///
/// Forward path: pending → processing → shipped → delivered.
/// Any non-terminal status may move to cancelled. Delivered and
/// cancelled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal statuses admit no further owner-side transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// An order can be cancelled from any non-terminal status.
    pub fn can_cancel(&self) -> bool {
        !self.is_terminal()
    }
}

/// Shipping destination captured at checkout. Stored on the order as a
/// snapshot: later address-book edits never touch placed orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    pub full_name: String,
    pub phone: String,
    pub email: String,
    pub address: Option<String>,
    pub district: String,
    pub city: String,
    pub landmark: String,
}

/// A line item in an order.
/// Snapshot pattern: name, price and image are frozen at order time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: String,
    pub product_id: String,
    /// Product name at order time (frozen).
    pub name: String,
    pub quantity: i64,
    /// Unit price in cents at order time (frozen).
    pub price_cents: i64,
    /// First product image at order time (frozen).
    pub image_url: String,
}

impl OrderItem {
    /// Line total (unit price × quantity).
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.price_cents).multiply_quantity(self.quantity)
    }
}

/// A placed order. Immutable once created apart from status fields;
/// priced fields are computed exactly once at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub items: Vec<OrderItem>,
    pub shipping_info: ShippingInfo,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub items_price_cents: i64,
    pub shipping_price_cents: i64,
    pub tax_price_cents: i64,
    pub total_price_cents: i64,
    pub order_status: OrderStatus,
    pub tracking_number: Option<String>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Invoices
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Paid,
    Unpaid,
    Refunded,
}

/// Flat billing contact, copied from the order's shipping info.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceCustomer {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: Option<String>,
}

/// A priced invoice line derived from an order item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLine {
    pub name: String,
    pub price_cents: i64,
    pub quantity: i64,
    pub total_cents: i64,
}

/// A billing document derived from a finalized order.
///
/// At most one invoice exists per order (UNIQUE order_id in storage).
/// All amounts mirror the order verbatim; nothing here is recomputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    pub order_id: String,
    pub invoice_number: String,
    pub customer: InvoiceCustomer,
    pub items: Vec<InvoiceLine>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub shipping_cents: i64,
    pub grand_total_cents: i64,
    pub status: InvoiceStatus,
    pub issued_at: DateTime<Utc>,
}

impl Invoice {
    /// Derives an invoice from an order.
    ///
    /// `grand_total_cents` mirrors the order's total verbatim — any drift
    /// between the two is a data-integrity bug, so it is copied, never
    /// recomputed.
    pub fn from_order(
        id: String,
        invoice_number: String,
        order: &Order,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Invoice {
            id,
            order_id: order.id.clone(),
            invoice_number,
            customer: InvoiceCustomer {
                name: order.shipping_info.full_name.clone(),
                email: order.shipping_info.email.clone(),
                phone: order.shipping_info.phone.clone(),
                address: order.shipping_info.address.clone(),
            },
            items: order
                .items
                .iter()
                .map(|item| InvoiceLine {
                    name: item.name.clone(),
                    price_cents: item.price_cents,
                    quantity: item.quantity,
                    total_cents: item.line_total().cents(),
                })
                .collect(),
            subtotal_cents: order.items_price_cents,
            tax_cents: order.tax_price_cents,
            shipping_cents: order.shipping_price_cents,
            grand_total_cents: order.total_price_cents,
            status: if order.payment_status == PaymentStatus::Completed {
                InvoiceStatus::Paid
            } else {
                InvoiceStatus::Unpaid
            },
            issued_at,
        }
    }
}

// =============================================================================
// Bulk Order Requests
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum BulkOrderStatus {
    Pending,
    Contacted,
    Quoted,
    Completed,
}

impl Default for BulkOrderStatus {
    fn default() -> Self {
        BulkOrderStatus::Pending
    }
}

/// A product/quantity pair on a bulk order request. `product_name` is
/// joined in for admin listings; it is not stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOrderItem {
    pub product_id: String,
    pub quantity: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
}

/// A wholesale enquiry submitted from the storefront contact form.
/// Unauthenticated on submission; triaged by admins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOrder {
    pub id: String,
    pub customer_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub company: Option<String>,
    pub message: Option<String>,
    pub items: Vec<BulkOrderItem>,
    pub status: BulkOrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
