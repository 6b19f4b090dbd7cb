//! # Order Pricing
//!
//! The checkout price breakdown. These are fixed business constants, not
//! configurable inputs:
//!
//! - Shipping: free when the items total is strictly above Rs 1000,
//!   otherwise a flat Rs 50.
//! - Tax: 18% GST on the items total, rounded half up.
//! - Total: items + shipping + tax, computed exactly once at order
//!   creation and never recomputed afterwards.

use serde::{Deserialize, Serialize};

use crate::money::{Money, TaxRate};
use crate::{FLAT_SHIPPING_FEE_CENTS, FREE_SHIPPING_THRESHOLD_CENTS, GST_RATE_BPS};

/// The priced breakdown of an order, derived from the cart total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPricing {
    pub items_price_cents: i64,
    pub shipping_price_cents: i64,
    pub tax_price_cents: i64,
    pub total_price_cents: i64,
}

impl OrderPricing {
    /// Prices an order from its items total.
    pub fn quote(items_price: Money) -> Self {
        let shipping = if items_price.cents() > FREE_SHIPPING_THRESHOLD_CENTS {
            Money::zero()
        } else {
            Money::from_cents(FLAT_SHIPPING_FEE_CENTS)
        };

        let tax = items_price.calculate_tax(TaxRate::from_bps(GST_RATE_BPS));
        let total = items_price + shipping + tax;

        OrderPricing {
            items_price_cents: items_price.cents(),
            shipping_price_cents: shipping.cents(),
            tax_price_cents: tax.cents(),
            total_price_cents: total.cents(),
        }
    }
}
