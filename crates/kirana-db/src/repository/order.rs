//! # Order Repository
//!
//! Database operations for orders and order items.
//!
//! ## Order Lifecycle
//! ```text
//! 1. CREATE (one transaction)
//!    └── conditional stock debit per line (stock >= qty or abort)
//!    └── insert order + item snapshots
//!    └── drain the cart
//!
//! 2. PROGRESS (admin)
//!    └── set_status() → processing / shipped / delivered / ...
//!
//! 3. CANCEL (one transaction)
//!    └── status flip guarded on non-terminal status
//!    └── stock restore per line (exact inverse of the debit)
//! ```
//!
//! Stock debit and order persistence succeed or fail together; the
//! cancellation's stock restore and status transition succeed or fail
//! together. Two concurrent orders racing for the last unit cannot both
//! commit: the conditional `stock >= quantity` UPDATE matches no row for
//! the loser and its whole transaction rolls back.

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use kirana_core::{
    Order, OrderItem, OrderStatus, PaymentMethod, PaymentStatus, ShippingInfo,
};

const ORDER_COLUMNS: &str = "id, user_id, shipping_full_name, shipping_phone, shipping_email, \
     shipping_address, shipping_district, shipping_city, shipping_landmark, \
     payment_method, payment_status, items_price_cents, shipping_price_cents, \
     tax_price_cents, total_price_cents, order_status, tracking_number, \
     delivered_at, cancelled_at, cancellation_reason, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    user_id: String,
    shipping_full_name: String,
    shipping_phone: String,
    shipping_email: String,
    shipping_address: Option<String>,
    shipping_district: String,
    shipping_city: String,
    shipping_landmark: String,
    payment_method: PaymentMethod,
    payment_status: PaymentStatus,
    items_price_cents: i64,
    shipping_price_cents: i64,
    tax_price_cents: i64,
    total_price_cents: i64,
    order_status: OrderStatus,
    tracking_number: Option<String>,
    delivered_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    cancellation_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Order {
        Order {
            id: self.id,
            user_id: self.user_id,
            items,
            shipping_info: ShippingInfo {
                full_name: self.shipping_full_name,
                phone: self.shipping_phone,
                email: self.shipping_email,
                address: self.shipping_address,
                district: self.shipping_district,
                city: self.shipping_city,
                landmark: self.shipping_landmark,
            },
            payment_method: self.payment_method,
            payment_status: self.payment_status,
            items_price_cents: self.items_price_cents,
            shipping_price_cents: self.shipping_price_cents,
            tax_price_cents: self.tax_price_cents,
            total_price_cents: self.total_price_cents,
            order_status: self.order_status,
            tracking_number: self.tracking_number,
            delivered_at: self.delivered_at,
            cancelled_at: self.cancelled_at,
            cancellation_reason: self.cancellation_reason,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: String,
    product_id: String,
    name: String,
    quantity: i64,
    price_cents: i64,
    image_url: String,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            id: row.id,
            product_id: row.product_id,
            name: row.name,
            quantity: row.quantity,
            price_cents: row.price_cents,
            image_url: row.image_url,
        }
    }
}

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Persists a new order in a single transaction.
    ///
    /// Per line item, debits stock with a conditional update
    /// (`stock = stock - qty` only where `stock >= qty`); a line whose
    /// product no longer has enough stock aborts the whole transaction
    /// with [`DbError::StockConflict`] and nothing is written. On success
    /// the order row and its item snapshots are inserted and the source
    /// cart is drained, all before the commit.
    pub async fn create(&self, order: &Order, cart_id: &str) -> DbResult<()> {
        debug!(order_id = %order.id, items = order.items.len(), "Creating order");

        let mut tx = self.pool.begin().await?;

        for item in &order.items {
            let result = sqlx::query(
                r#"
                UPDATE products
                SET stock = stock - ?1, updated_at = ?2
                WHERE id = ?3 AND stock >= ?1
                "#,
            )
            .bind(item.quantity)
            .bind(order.created_at)
            .bind(&item.product_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                // Dropping the transaction rolls back earlier debits.
                return Err(DbError::StockConflict {
                    product_id: item.product_id.clone(),
                });
            }
        }

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, user_id, shipping_full_name, shipping_phone, shipping_email,
                shipping_address, shipping_district, shipping_city, shipping_landmark,
                payment_method, payment_status, items_price_cents, shipping_price_cents,
                tax_price_cents, total_price_cents, order_status, tracking_number,
                delivered_at, cancelled_at, cancellation_reason, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9,
                ?10, ?11, ?12, ?13,
                ?14, ?15, ?16, ?17,
                ?18, ?19, ?20, ?21, ?22
            )
            "#,
        )
        .bind(&order.id)
        .bind(&order.user_id)
        .bind(&order.shipping_info.full_name)
        .bind(&order.shipping_info.phone)
        .bind(&order.shipping_info.email)
        .bind(&order.shipping_info.address)
        .bind(&order.shipping_info.district)
        .bind(&order.shipping_info.city)
        .bind(&order.shipping_info.landmark)
        .bind(order.payment_method)
        .bind(order.payment_status)
        .bind(order.items_price_cents)
        .bind(order.shipping_price_cents)
        .bind(order.tax_price_cents)
        .bind(order.total_price_cents)
        .bind(order.order_status)
        .bind(&order.tracking_number)
        .bind(order.delivered_at)
        .bind(order.cancelled_at)
        .bind(&order.cancellation_reason)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in &order.items {
            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, product_id, name, quantity, price_cents, image_url)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&item.id)
            .bind(&order.id)
            .bind(&item.product_id)
            .bind(&item.name)
            .bind(item.quantity)
            .bind(item.price_cents)
            .bind(&item.image_url)
            .execute(&mut *tx)
            .await?;
        }

        // Drain the cart inside the same transaction: a committed order
        // always leaves an empty cart behind.
        sqlx::query("DELETE FROM cart_items WHERE cart_id = ?1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(order_id = %order.id, total_cents = order.total_price_cents, "Order created");
        Ok(())
    }

    /// Gets an order with its items.
    pub async fn get(&self, id: &str) -> DbResult<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1");
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = self.load_items(id).await?;
        Ok(Some(row.into_order(items)))
    }

    /// Lists a user's orders, newest first.
    pub async fn list_by_user(&self, user_id: &str) -> DbResult<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ?1 ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        self.attach_items(rows).await
    }

    /// Lists every order (admin view), newest first.
    pub async fn list_all(&self) -> DbResult<Vec<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC");
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        self.attach_items(rows).await
    }

    /// Cancels an order and restores stock, atomically.
    ///
    /// The status flip is guarded on a non-terminal current status so a
    /// raced double-cancel (or a cancel racing a delivery) cannot restore
    /// stock twice; the loser gets [`DbError::Conflict`].
    pub async fn cancel(
        &self,
        order_id: &str,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(order_id = %order_id, "Cancelling order");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET order_status = 'cancelled',
                cancelled_at = ?2,
                cancellation_reason = COALESCE(?3, cancellation_reason),
                updated_at = ?2
            WHERE id = ?1 AND order_status IN ('pending', 'processing', 'shipped')
            "#,
        )
        .bind(order_id)
        .bind(now)
        .bind(reason)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::conflict(format!(
                "Order {} is not in a cancellable status",
                order_id
            )));
        }

        Self::restore_stock(&mut tx, order_id, now).await?;

        tx.commit().await?;

        info!(order_id = %order_id, "Order cancelled, stock restored");
        Ok(())
    }

    /// Admin status override.
    ///
    /// Deliberately permissive about the target status (no forward-only
    /// validation), but the side effects stay consistent:
    /// - `delivered` sets `delivered_at` and forces payment completed
    /// - entering `cancelled` from a non-cancelled status restores stock
    ///   exactly once, in the same transaction
    pub async fn set_status(
        &self,
        order_id: &str,
        status: OrderStatus,
        tracking_number: Option<&str>,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(order_id = %order_id, status = status.as_str(), "Setting order status");

        let mut tx = self.pool.begin().await?;

        let current: Option<OrderStatus> =
            sqlx::query_scalar("SELECT order_status FROM orders WHERE id = ?1")
                .bind(order_id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(current) = current else {
            return Err(DbError::not_found("Order", order_id));
        };

        sqlx::query(
            r#"
            UPDATE orders
            SET order_status = ?2,
                tracking_number = COALESCE(?3, tracking_number),
                updated_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(order_id)
        .bind(status)
        .bind(tracking_number)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if status == OrderStatus::Delivered {
            sqlx::query(
                r#"
                UPDATE orders
                SET delivered_at = ?2, payment_status = 'completed'
                WHERE id = ?1
                "#,
            )
            .bind(order_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        if status == OrderStatus::Cancelled && current != OrderStatus::Cancelled {
            sqlx::query("UPDATE orders SET cancelled_at = ?2 WHERE id = ?1")
                .bind(order_id)
                .bind(now)
                .execute(&mut *tx)
                .await?;
            Self::restore_stock(&mut tx, order_id, now).await?;
        }

        tx.commit().await?;

        info!(order_id = %order_id, status = status.as_str(), "Order status updated");
        Ok(())
    }

    /// Hard-deletes an order and its items. Stock is not touched.
    pub async fn delete(&self, order_id: &str) -> DbResult<()> {
        debug!(order_id = %order_id, "Deleting order");

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM order_items WHERE order_id = ?1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM orders WHERE id = ?1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", order_id));
        }

        tx.commit().await?;
        Ok(())
    }

    /// Increments stock back for every item of an order — the exact
    /// inverse of the creation-time debit.
    async fn restore_stock(
        tx: &mut Transaction<'_, Sqlite>,
        order_id: &str,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        let items = sqlx::query_as::<_, OrderItemRow>(
            "SELECT id, product_id, name, quantity, price_cents, image_url \
             FROM order_items WHERE order_id = ?1",
        )
        .bind(order_id)
        .fetch_all(&mut **tx)
        .await?;

        for item in &items {
            sqlx::query(
                "UPDATE products SET stock = stock + ?1, updated_at = ?2 WHERE id = ?3",
            )
            .bind(item.quantity)
            .bind(now)
            .bind(&item.product_id)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }

    async fn load_items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let rows = sqlx::query_as::<_, OrderItemRow>(
            "SELECT id, product_id, name, quantity, price_cents, image_url \
             FROM order_items WHERE order_id = ?1",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(OrderItem::from).collect())
    }

    async fn attach_items(&self, rows: Vec<OrderRow>) -> DbResult<Vec<Order>> {
        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.load_items(&row.id).await?;
            orders.push(row.into_order(items));
        }
        Ok(orders)
    }
}

/// Helper to generate a new order ID.
pub fn generate_order_id() -> String {
    Uuid::new_v4().to_string()
}

/// Helper to generate a new order item ID.
pub fn generate_order_item_id() -> String {
    Uuid::new_v4().to_string()
}
