//! # Cart Aggregate
//!
//! Pure cart logic: line upserts with stock checks, quantity updates,
//! idempotent removal, and total calculations. Persistence lives in
//! kirana-db; this module never touches I/O.
//!
//! ## Invariants
//! - One line per product (adding the same product merges quantities)
//! - Line quantity never exceeds the product's stock at mutation time
//! - Line price is re-pinned to the product's current price on every add
//! - Totals are recomputed on every read, never cached

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::Product;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// A line in the shopping cart.
///
/// `price_cents` is the unit price as of the most recent add of this
/// product. If an admin edits the catalog price between adds, the next
/// add moves the line to the new price.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Line identifier (UUID v4), addressable via the item routes.
    pub id: String,
    pub product_id: String,
    pub quantity: i64,
    pub price_cents: i64,
}

impl CartItem {
    /// Line total (unit price × quantity).
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.price_cents).multiply_quantity(self.quantity)
    }
}

/// A user's shopping cart.
///
/// Exactly one cart exists per user (unique ownership in storage),
/// created lazily on first use and drained — never deleted — when an
/// order is placed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: String,
    pub user_id: String,
    pub items: Vec<CartItem>,
}

impl Cart {
    pub fn new(id: String, user_id: String) -> Self {
        Cart {
            id,
            user_id,
            items: Vec::new(),
        }
    }

    /// Adds a product to the cart, merging with an existing line.
    ///
    /// Fails when the product is inactive, when the merged quantity would
    /// exceed current stock, or when a cart cap is hit. On success the
    /// line's price is pinned to the product's current price.
    pub fn add_item(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        if quantity < 1 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }

        if !product.is_active {
            return Err(CoreError::ProductUnavailable(product.name.clone()));
        }

        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product.id) {
            let new_quantity = item.quantity + quantity;

            if new_quantity > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_quantity,
                    max: MAX_ITEM_QUANTITY,
                });
            }

            if new_quantity > product.stock {
                return Err(CoreError::InsufficientStock {
                    name: product.name.clone(),
                    available: product.stock,
                    requested: new_quantity,
                });
            }

            item.quantity = new_quantity;
            // Re-price on every add, not locked at first add.
            item.price_cents = product.price_cents;
            return Ok(());
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }

        if quantity > product.stock {
            return Err(CoreError::InsufficientStock {
                name: product.name.clone(),
                available: product.stock,
                requested: quantity,
            });
        }

        self.items.push(CartItem {
            id: Uuid::new_v4().to_string(),
            product_id: product.id.clone(),
            quantity,
            price_cents: product.price_cents,
        });

        Ok(())
    }

    /// Sets the quantity of an existing line.
    ///
    /// `product` must be the line's product (callers resolve it); the new
    /// quantity is checked against its current stock. The line price is
    /// left as pinned by the last add.
    pub fn update_quantity(
        &mut self,
        item_id: &str,
        quantity: i64,
        product: &Product,
    ) -> CoreResult<()> {
        if quantity < 1 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }

        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }

        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| CoreError::CartItemNotFound(item_id.to_string()))?;

        if quantity > product.stock {
            return Err(CoreError::InsufficientStock {
                name: product.name.clone(),
                available: product.stock,
                requested: quantity,
            });
        }

        item.quantity = quantity;
        Ok(())
    }

    /// Removes a line by id. Removing an absent line is not an error —
    /// the cart is simply left unchanged.
    pub fn remove_item(&mut self, item_id: &str) {
        self.items.retain(|i| i.id != item_id);
    }

    /// Finds a line by id.
    pub fn find_item(&self, item_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    /// Clears all lines in place.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Cart total: Σ(price × quantity). Recomputed on every call.
    pub fn total(&self) -> Money {
        self.items
            .iter()
            .fold(Money::zero(), |acc, item| acc + item.line_total())
    }

    /// Total quantity across all lines: Σ(quantity).
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
