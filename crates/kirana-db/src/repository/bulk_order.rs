//! # Bulk Order Repository
//!
//! Persistence for wholesale enquiries submitted from the storefront.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use kirana_core::{BulkOrder, BulkOrderItem, BulkOrderStatus};

#[derive(Debug, sqlx::FromRow)]
struct BulkOrderRow {
    id: String,
    customer_name: String,
    phone: String,
    email: Option<String>,
    company: Option<String>,
    message: Option<String>,
    status: BulkOrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BulkOrderRow {
    fn into_bulk_order(self, items: Vec<BulkOrderItem>) -> BulkOrder {
        BulkOrder {
            id: self.id,
            customer_name: self.customer_name,
            phone: self.phone,
            email: self.email,
            company: self.company,
            message: self.message,
            items,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Item rows joined with the product name for admin triage.
#[derive(Debug, sqlx::FromRow)]
struct BulkOrderItemRow {
    product_id: String,
    quantity: i64,
    product_name: Option<String>,
}

impl From<BulkOrderItemRow> for BulkOrderItem {
    fn from(row: BulkOrderItemRow) -> Self {
        BulkOrderItem {
            product_id: row.product_id,
            quantity: row.quantity,
            product_name: row.product_name,
        }
    }
}

/// Repository for bulk order database operations.
#[derive(Debug, Clone)]
pub struct BulkOrderRepository {
    pool: SqlitePool,
}

impl BulkOrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BulkOrderRepository { pool }
    }

    /// Inserts a bulk order request with its product lines.
    pub async fn insert(&self, bulk_order: &BulkOrder) -> DbResult<()> {
        debug!(id = %bulk_order.id, customer = %bulk_order.customer_name, "Inserting bulk order");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO bulk_orders (
                id, customer_name, phone, email, company, message, status,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&bulk_order.id)
        .bind(&bulk_order.customer_name)
        .bind(&bulk_order.phone)
        .bind(&bulk_order.email)
        .bind(&bulk_order.company)
        .bind(&bulk_order.message)
        .bind(bulk_order.status)
        .bind(bulk_order.created_at)
        .bind(bulk_order.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in &bulk_order.items {
            sqlx::query(
                r#"
                INSERT INTO bulk_order_items (id, bulk_order_id, product_id, quantity)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&bulk_order.id)
            .bind(&item.product_id)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Gets a bulk order by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<BulkOrder>> {
        let row = sqlx::query_as::<_, BulkOrderRow>(
            "SELECT id, customer_name, phone, email, company, message, status, \
             created_at, updated_at FROM bulk_orders WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = self.load_items(id).await?;
        Ok(Some(row.into_bulk_order(items)))
    }

    /// Lists all bulk orders (admin view), newest first.
    pub async fn list_all(&self) -> DbResult<Vec<BulkOrder>> {
        let rows = sqlx::query_as::<_, BulkOrderRow>(
            "SELECT id, customer_name, phone, email, company, message, status, \
             created_at, updated_at FROM bulk_orders ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut result = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.load_items(&row.id).await?;
            result.push(row.into_bulk_order(items));
        }
        Ok(result)
    }

    /// Updates the triage status.
    pub async fn set_status(&self, id: &str, status: BulkOrderStatus) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE bulk_orders SET status = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(status)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Bulk order", id));
        }

        Ok(())
    }

    /// Hard-deletes a bulk order request.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM bulk_order_items WHERE bulk_order_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM bulk_orders WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Bulk order", id));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn load_items(&self, bulk_order_id: &str) -> DbResult<Vec<BulkOrderItem>> {
        let rows = sqlx::query_as::<_, BulkOrderItemRow>(
            r#"
            SELECT boi.product_id AS product_id,
                   boi.quantity AS quantity,
                   p.name AS product_name
            FROM bulk_order_items boi
            LEFT JOIN products p ON p.id = boi.product_id
            WHERE boi.bulk_order_id = ?1
            "#,
        )
        .bind(bulk_order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(BulkOrderItem::from).collect())
    }
}

/// Helper to generate a new bulk order ID.
pub fn generate_bulk_order_id() -> String {
    Uuid::new_v4().to_string()
}
