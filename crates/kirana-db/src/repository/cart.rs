//! # Cart Repository
//!
//! Persistence for the per-user cart.
//!
//! ## Storage Model
//! ```text
//! carts       (id, user_id UNIQUE, timestamps)   ← one row per user, kept forever
//! cart_items  (id, cart_id, product_id, qty, price_cents)
//!             UNIQUE(cart_id, product_id)        ← no duplicate product lines
//! ```
//!
//! Mutations load the cart, apply the pure logic in `kirana_core::cart`,
//! then persist the whole item list in one transaction (document-style
//! save). The per-cart transaction also serializes concurrent writes from
//! the same user.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use kirana_core::{Cart, CartItem, ProductImage};

/// Live product data joined onto a cart line for display and stock
/// checks. Unlike order items this is NOT a snapshot - it reflects the
/// catalog at read time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineProduct {
    pub item_id: String,
    pub product_id: String,
    pub name: String,
    pub image_url: String,
    pub stock: i64,
    /// The product's current catalog price; the line's pinned price may
    /// lag behind it until the next add.
    pub current_price_cents: i64,
    pub is_active: bool,
}

#[derive(Debug, sqlx::FromRow)]
struct CartLineProductRow {
    item_id: String,
    product_id: String,
    name: String,
    images_json: String,
    stock: i64,
    current_price_cents: i64,
    is_active: bool,
}

impl From<CartLineProductRow> for CartLineProduct {
    fn from(row: CartLineProductRow) -> Self {
        let images: Vec<ProductImage> =
            serde_json::from_str(&row.images_json).unwrap_or_default();
        CartLineProduct {
            item_id: row.item_id,
            product_id: row.product_id,
            name: row.name,
            image_url: images.first().map(|i| i.url.clone()).unwrap_or_default(),
            stock: row.stock,
            current_price_cents: row.current_price_cents,
            is_active: row.is_active,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: String,
    user_id: String,
    #[allow(dead_code)]
    created_at: DateTime<Utc>,
}

/// Repository for cart database operations.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Gets the user's cart with items, without creating one.
    pub async fn get(&self, user_id: &str) -> DbResult<Option<Cart>> {
        let row = sqlx::query_as::<_, CartRow>(
            "SELECT id, user_id, created_at FROM carts WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = self.load_items(&row.id).await?;
        Ok(Some(Cart {
            id: row.id,
            user_id: row.user_id,
            items,
        }))
    }

    /// Gets the user's cart, creating an empty one on first use.
    pub async fn get_or_create(&self, user_id: &str) -> DbResult<Cart> {
        if let Some(cart) = self.get(user_id).await? {
            return Ok(cart);
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(user_id = %user_id, cart_id = %id, "Creating cart");

        // A concurrent first-add can race here; the UNIQUE(user_id) index
        // makes the second insert fail, so fall back to reading.
        let inserted = sqlx::query(
            "INSERT INTO carts (id, user_id, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => Ok(Cart::new(id, user_id.to_string())),
            Err(_) => self
                .get(user_id)
                .await?
                .ok_or_else(|| crate::error::DbError::not_found("Cart", user_id)),
        }
    }

    /// Persists the cart's entire item list (document-style save).
    ///
    /// Runs in one transaction: clears the existing lines and rewrites
    /// them, keeping line ids stable across saves.
    pub async fn replace_items(&self, cart: &Cart) -> DbResult<()> {
        debug!(cart_id = %cart.id, items = cart.items.len(), "Saving cart items");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM cart_items WHERE cart_id = ?1")
            .bind(&cart.id)
            .execute(&mut *tx)
            .await?;

        for item in &cart.items {
            sqlx::query(
                r#"
                INSERT INTO cart_items (id, cart_id, product_id, quantity, price_cents)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(&item.id)
            .bind(&cart.id)
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(item.price_cents)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("UPDATE carts SET updated_at = ?2 WHERE id = ?1")
            .bind(&cart.id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Loads live product data for each line of a cart (name, first
    /// image, stock, current price) for display alongside the items.
    pub async fn line_products(&self, cart_id: &str) -> DbResult<Vec<CartLineProduct>> {
        let rows = sqlx::query_as::<_, CartLineProductRow>(
            r#"
            SELECT
                ci.id AS item_id,
                p.id AS product_id,
                p.name AS name,
                p.images_json AS images_json,
                p.stock AS stock,
                p.price_cents AS current_price_cents,
                p.is_active AS is_active
            FROM cart_items ci
            INNER JOIN products p ON p.id = ci.product_id
            WHERE ci.cart_id = ?1
            "#,
        )
        .bind(cart_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CartLineProduct::from).collect())
    }

    async fn load_items(&self, cart_id: &str) -> DbResult<Vec<CartItem>> {
        let items = sqlx::query_as::<_, CartItem>(
            "SELECT id, product_id, quantity, price_cents FROM cart_items WHERE cart_id = ?1",
        )
        .bind(cart_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }
}
