//! # Invoice Repository
//!
//! Persistence for billing documents. The UNIQUE(order_id) index is the
//! one-invoice-per-order invariant: concurrent creation attempts for the
//! same order cannot both commit, whatever the application layer checked
//! beforehand.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use kirana_core::{Invoice, InvoiceCustomer, InvoiceLine, InvoiceStatus};

#[derive(Debug, sqlx::FromRow)]
struct InvoiceRow {
    id: String,
    order_id: String,
    invoice_number: String,
    customer_name: String,
    customer_email: String,
    customer_phone: String,
    customer_address: Option<String>,
    subtotal_cents: i64,
    tax_cents: i64,
    shipping_cents: i64,
    grand_total_cents: i64,
    status: InvoiceStatus,
    issued_at: DateTime<Utc>,
}

impl InvoiceRow {
    fn into_invoice(self, items: Vec<InvoiceLine>) -> Invoice {
        Invoice {
            id: self.id,
            order_id: self.order_id,
            invoice_number: self.invoice_number,
            customer: InvoiceCustomer {
                name: self.customer_name,
                email: self.customer_email,
                phone: self.customer_phone,
                address: self.customer_address,
            },
            items,
            subtotal_cents: self.subtotal_cents,
            tax_cents: self.tax_cents,
            shipping_cents: self.shipping_cents,
            grand_total_cents: self.grand_total_cents,
            status: self.status,
            issued_at: self.issued_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct InvoiceLineRow {
    name: String,
    price_cents: i64,
    quantity: i64,
    total_cents: i64,
}

/// Repository for invoice database operations.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Inserts an invoice with its lines in one transaction.
    ///
    /// A second invoice for the same order fails with UniqueViolation
    /// from the order_id index.
    pub async fn insert(&self, invoice: &Invoice) -> DbResult<()> {
        debug!(order_id = %invoice.order_id, number = %invoice.invoice_number, "Inserting invoice");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, order_id, invoice_number, customer_name, customer_email,
                customer_phone, customer_address, subtotal_cents, tax_cents,
                shipping_cents, grand_total_cents, status, issued_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&invoice.id)
        .bind(&invoice.order_id)
        .bind(&invoice.invoice_number)
        .bind(&invoice.customer.name)
        .bind(&invoice.customer.email)
        .bind(&invoice.customer.phone)
        .bind(&invoice.customer.address)
        .bind(invoice.subtotal_cents)
        .bind(invoice.tax_cents)
        .bind(invoice.shipping_cents)
        .bind(invoice.grand_total_cents)
        .bind(invoice.status)
        .bind(invoice.issued_at)
        .execute(&mut *tx)
        .await?;

        for line in &invoice.items {
            sqlx::query(
                r#"
                INSERT INTO invoice_items (id, invoice_id, name, price_cents, quantity, total_cents)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&invoice.id)
            .bind(&line.name)
            .bind(line.price_cents)
            .bind(line.quantity)
            .bind(line.total_cents)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Gets the invoice for an order, if one exists.
    pub async fn get_by_order(&self, order_id: &str) -> DbResult<Option<Invoice>> {
        let row = sqlx::query_as::<_, InvoiceRow>(
            r#"
            SELECT id, order_id, invoice_number, customer_name, customer_email,
                   customer_phone, customer_address, subtotal_cents, tax_cents,
                   shipping_cents, grand_total_cents, status, issued_at
            FROM invoices
            WHERE order_id = ?1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let lines = sqlx::query_as::<_, InvoiceLineRow>(
            "SELECT name, price_cents, quantity, total_cents FROM invoice_items WHERE invoice_id = ?1",
        )
        .bind(&row.id)
        .fetch_all(&self.pool)
        .await?;

        let items = lines
            .into_iter()
            .map(|l| InvoiceLine {
                name: l.name,
                price_cents: l.price_cents,
                quantity: l.quantity,
                total_cents: l.total_cents,
            })
            .collect();

        Ok(Some(row.into_invoice(items)))
    }
}

/// Helper to generate a new invoice ID.
pub fn generate_invoice_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates an invoice number from the issue timestamp (`INV-<millis>`).
pub fn generate_invoice_number(issued_at: DateTime<Utc>) -> String {
    format!("INV-{}", issued_at.timestamp_millis())
}
