//! # kirana-db: Database Layer for Kirana
//!
//! SQLite persistence for the Kirana backend, built on sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Kirana Data Flow                           │
//! │                                                                 │
//! │  Axum handler (create_order)                                    │
//! │       │                                                         │
//! │  ┌────▼────────────────────────────────────────────────────┐    │
//! │  │                 kirana-db (THIS CRATE)                  │    │
//! │  │                                                         │    │
//! │  │   ┌────────────┐   ┌──────────────┐   ┌─────────────┐   │    │
//! │  │   │  Database  │   │ Repositories │   │ Migrations  │   │    │
//! │  │   │  (pool.rs) │◄──│ product/cart │   │ (embedded)  │   │    │
//! │  │   │            │   │ order/...    │   │             │   │    │
//! │  │   └────────────┘   └──────────────┘   └─────────────┘   │    │
//! │  └────────────────────────┬────────────────────────────────┘    │
//! │                           │                                     │
//! │                     SQLite (WAL)                                │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Transactions
//!
//! The two stock-moving workflows are atomic by construction:
//! order creation (conditional debit × N + order insert + cart drain)
//! and cancellation (guarded status flip + stock restore × N) each run
//! in a single transaction owned by [`repository::order::OrderRepository`].

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::bulk_order::BulkOrderRepository;
pub use repository::cart::{CartLineProduct, CartRepository};
pub use repository::category::CategoryRepository;
pub use repository::invoice::InvoiceRepository;
pub use repository::order::OrderRepository;
pub use repository::product::{ProductFilter, ProductPage, ProductRepository, ProductSort};
pub use repository::user::UserRepository;

// =============================================================================
// Workflow Tests
// =============================================================================
// Exercise the stock-moving transactions end to end against an in-memory
// database: debit on order creation, restore on cancellation, and the
// conditional-update guard under concurrency.

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use kirana_core::{
        Category, Invoice, Order, OrderItem, OrderPricing, OrderStatus, PaymentMethod,
        PaymentStatus, Product, Role, ShippingInfo, User,
    };
    use uuid::Uuid;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn test_shipping() -> ShippingInfo {
        ShippingInfo {
            full_name: "Sita Sharma".to_string(),
            phone: "9800000000".to_string(),
            email: "sita@example.com".to_string(),
            address: Some("Ward 4".to_string()),
            district: "Kathmandu".to_string(),
            city: "Kathmandu".to_string(),
            landmark: "Near the temple".to_string(),
        }
    }

    async fn seed_user(db: &Database, email: &str) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            email: email.to_string(),
            role: Role::User,
            phone: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.users().insert(&user, "argon2-hash").await.unwrap();
        user
    }

    async fn seed_category(db: &Database) -> Category {
        let now = Utc::now();
        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: format!("Groceries {}", Uuid::new_v4()),
            slug: format!("groceries-{}", Uuid::new_v4()),
            description: None,
            image_url: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.categories().insert(&category).await.unwrap();
        category
    }

    async fn seed_product(db: &Database, category_id: &str, price_cents: i64, stock: i64) -> Product {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: format!("Product {}", Uuid::new_v4()),
            description: "test".to_string(),
            price_cents,
            original_price_cents: None,
            category_id: category_id.to_string(),
            subcategory: None,
            brand: None,
            images: Vec::new(),
            stock,
            sku: None,
            rating: 0.0,
            num_reviews: 0,
            is_active: true,
            featured: false,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await.unwrap();
        product
    }

    fn build_order(user_id: &str, lines: &[(&Product, i64)]) -> Order {
        let now = Utc::now();
        let items: Vec<OrderItem> = lines
            .iter()
            .map(|(product, qty)| OrderItem {
                id: Uuid::new_v4().to_string(),
                product_id: product.id.clone(),
                name: product.name.clone(),
                quantity: *qty,
                price_cents: product.price_cents,
                image_url: product.first_image_url(),
            })
            .collect();

        let items_total: i64 = items.iter().map(|i| i.price_cents * i.quantity).sum();
        let pricing = OrderPricing::quote(kirana_core::Money::from_cents(items_total));

        Order {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            items,
            shipping_info: test_shipping(),
            payment_method: PaymentMethod::CashOnDelivery,
            payment_status: PaymentStatus::Pending,
            items_price_cents: pricing.items_price_cents,
            shipping_price_cents: pricing.shipping_price_cents,
            tax_price_cents: pricing.tax_price_cents,
            total_price_cents: pricing.total_price_cents,
            order_status: OrderStatus::Pending,
            tracking_number: None,
            delivered_at: None,
            cancelled_at: None,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_order_creation_debits_stock_and_drains_cart() {
        let db = test_db().await;
        let user = seed_user(&db, "a@example.com").await;
        let category = seed_category(&db).await;
        let product = seed_product(&db, &category.id, 40_000, 10).await;

        let mut cart = db.carts().get_or_create(&user.id).await.unwrap();
        cart.add_item(&product, 3).unwrap();
        db.carts().replace_items(&cart).await.unwrap();

        let order = build_order(&user.id, &[(&product, 3)]);
        db.orders().create(&order, &cart.id).await.unwrap();

        let product_after = db.products().get(&product.id).await.unwrap().unwrap();
        assert_eq!(product_after.stock, 7);

        let cart_after = db.carts().get(&user.id).await.unwrap().unwrap();
        assert!(cart_after.is_empty());

        let stored = db.orders().get(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.order_status, OrderStatus::Pending);
        assert_eq!(stored.items.len(), 1);
        assert_eq!(stored.items[0].quantity, 3);
        assert_eq!(stored.total_price_cents, order.total_price_cents);
    }

    #[tokio::test]
    async fn test_stock_conflict_rolls_back_everything() {
        let db = test_db().await;
        let user = seed_user(&db, "a@example.com").await;
        let category = seed_category(&db).await;
        let plentiful = seed_product(&db, &category.id, 10_000, 50).await;
        let scarce = seed_product(&db, &category.id, 10_000, 1).await;

        let mut cart = db.carts().get_or_create(&user.id).await.unwrap();
        cart.add_item(&plentiful, 2).unwrap();
        db.carts().replace_items(&cart).await.unwrap();

        // Second line asks for more than is available.
        let order = build_order(&user.id, &[(&plentiful, 2), (&scarce, 3)]);
        let err = db.orders().create(&order, &cart.id).await.unwrap_err();
        assert!(matches!(err, DbError::StockConflict { .. }));

        // The first line's debit must have rolled back too.
        let plentiful_after = db.products().get(&plentiful.id).await.unwrap().unwrap();
        assert_eq!(plentiful_after.stock, 50);
        let scarce_after = db.products().get(&scarce.id).await.unwrap().unwrap();
        assert_eq!(scarce_after.stock, 1);

        // Cart untouched, order not persisted.
        let cart_after = db.carts().get(&user.id).await.unwrap().unwrap();
        assert_eq!(cart_after.items.len(), 1);
        assert!(db.orders().get(&order.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cancel_restores_stock_exactly() {
        let db = test_db().await;
        let user = seed_user(&db, "a@example.com").await;
        let category = seed_category(&db).await;
        let product = seed_product(&db, &category.id, 40_000, 10).await;

        let cart = db.carts().get_or_create(&user.id).await.unwrap();
        let order = build_order(&user.id, &[(&product, 3)]);
        db.orders().create(&order, &cart.id).await.unwrap();

        assert_eq!(db.products().get(&product.id).await.unwrap().unwrap().stock, 7);

        db.orders().cancel(&order.id, Some("changed my mind"), Utc::now()).await.unwrap();

        let product_after = db.products().get(&product.id).await.unwrap().unwrap();
        assert_eq!(product_after.stock, 10);

        let cancelled = db.orders().get(&order.id).await.unwrap().unwrap();
        assert_eq!(cancelled.order_status, OrderStatus::Cancelled);
        assert!(cancelled.cancelled_at.is_some());
        assert_eq!(cancelled.cancellation_reason.as_deref(), Some("changed my mind"));
    }

    #[tokio::test]
    async fn test_double_cancel_rejected_and_stock_restored_once() {
        let db = test_db().await;
        let user = seed_user(&db, "a@example.com").await;
        let category = seed_category(&db).await;
        let product = seed_product(&db, &category.id, 40_000, 10).await;

        let cart = db.carts().get_or_create(&user.id).await.unwrap();
        let order = build_order(&user.id, &[(&product, 3)]);
        db.orders().create(&order, &cart.id).await.unwrap();

        db.orders().cancel(&order.id, None, Utc::now()).await.unwrap();
        let err = db.orders().cancel(&order.id, None, Utc::now()).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));

        // Restored once, not twice.
        assert_eq!(db.products().get(&product.id).await.unwrap().unwrap().stock, 10);
    }

    #[tokio::test]
    async fn test_cancel_delivered_order_rejected() {
        let db = test_db().await;
        let user = seed_user(&db, "a@example.com").await;
        let category = seed_category(&db).await;
        let product = seed_product(&db, &category.id, 40_000, 10).await;

        let cart = db.carts().get_or_create(&user.id).await.unwrap();
        let order = build_order(&user.id, &[(&product, 2)]);
        db.orders().create(&order, &cart.id).await.unwrap();

        db.orders()
            .set_status(&order.id, OrderStatus::Delivered, None, Utc::now())
            .await
            .unwrap();

        let delivered = db.orders().get(&order.id).await.unwrap().unwrap();
        assert_eq!(delivered.order_status, OrderStatus::Delivered);
        assert!(delivered.delivered_at.is_some());
        assert_eq!(delivered.payment_status, PaymentStatus::Completed);

        let err = db.orders().cancel(&order.id, None, Utc::now()).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));
        assert_eq!(db.products().get(&product.id).await.unwrap().unwrap().stock, 8);
    }

    #[tokio::test]
    async fn test_admin_cancel_via_set_status_restores_stock() {
        let db = test_db().await;
        let user = seed_user(&db, "a@example.com").await;
        let category = seed_category(&db).await;
        let product = seed_product(&db, &category.id, 40_000, 10).await;

        let cart = db.carts().get_or_create(&user.id).await.unwrap();
        let order = build_order(&user.id, &[(&product, 4)]);
        db.orders().create(&order, &cart.id).await.unwrap();
        assert_eq!(db.products().get(&product.id).await.unwrap().unwrap().stock, 6);

        db.orders()
            .set_status(&order.id, OrderStatus::Cancelled, None, Utc::now())
            .await
            .unwrap();
        assert_eq!(db.products().get(&product.id).await.unwrap().unwrap().stock, 10);

        // Setting cancelled again must not restore again.
        db.orders()
            .set_status(&order.id, OrderStatus::Cancelled, None, Utc::now())
            .await
            .unwrap();
        assert_eq!(db.products().get(&product.id).await.unwrap().unwrap().stock, 10);
    }

    #[tokio::test]
    async fn test_concurrent_last_unit_one_winner() {
        let db = test_db().await;
        let user_a = seed_user(&db, "a@example.com").await;
        let user_b = seed_user(&db, "b@example.com").await;
        let category = seed_category(&db).await;
        let product = seed_product(&db, &category.id, 40_000, 1).await;

        let cart_a = db.carts().get_or_create(&user_a.id).await.unwrap();
        let cart_b = db.carts().get_or_create(&user_b.id).await.unwrap();

        let order_a = build_order(&user_a.id, &[(&product, 1)]);
        let order_b = build_order(&user_b.id, &[(&product, 1)]);

        let orders = db.orders();
        let (res_a, res_b) = tokio::join!(
            orders.create(&order_a, &cart_a.id),
            orders.create(&order_b, &cart_b.id),
        );

        // Exactly one order wins the last unit.
        assert!(res_a.is_ok() != res_b.is_ok());
        let loser = if res_a.is_err() { res_a } else { res_b };
        assert!(matches!(loser.unwrap_err(), DbError::StockConflict { .. }));

        let product_after = db.products().get(&product.id).await.unwrap().unwrap();
        assert_eq!(product_after.stock, 0);
    }

    #[tokio::test]
    async fn test_invoice_unique_per_order() {
        let db = test_db().await;
        let user = seed_user(&db, "a@example.com").await;
        let category = seed_category(&db).await;
        let product = seed_product(&db, &category.id, 120_000, 5).await;

        let cart = db.carts().get_or_create(&user.id).await.unwrap();
        let order = build_order(&user.id, &[(&product, 1)]);
        db.orders().create(&order, &cart.id).await.unwrap();

        let issued_at = Utc::now();
        let invoice = Invoice::from_order(
            repository::invoice::generate_invoice_id(),
            repository::invoice::generate_invoice_number(issued_at),
            &order,
            issued_at,
        );
        db.invoices().insert(&invoice).await.unwrap();

        let fetched = db.invoices().get_by_order(&order.id).await.unwrap().unwrap();
        assert_eq!(fetched.grand_total_cents, order.total_price_cents);
        assert_eq!(fetched.items.len(), 1);

        // Second invoice for the same order must hit the unique index.
        let duplicate = Invoice::from_order(
            repository::invoice::generate_invoice_id(),
            "INV-DUP".to_string(),
            &order,
            Utc::now(),
        );
        let err = db.invoices().insert(&duplicate).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = test_db().await;
        seed_user(&db, "dup@example.com").await;

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            first_name: "Other".to_string(),
            last_name: "User".to_string(),
            email: "dup@example.com".to_string(),
            role: Role::User,
            phone: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let err = db.users().insert(&user, "hash").await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_soft_deleted_product_hidden_from_active_reads() {
        let db = test_db().await;
        let category = seed_category(&db).await;
        let product = seed_product(&db, &category.id, 10_000, 5).await;

        assert!(db.products().get_active(&product.id).await.unwrap().is_some());

        db.products().soft_delete(&product.id).await.unwrap();

        assert!(db.products().get_active(&product.id).await.unwrap().is_none());
        // Still readable for history.
        assert!(db.products().get(&product.id).await.unwrap().is_some());

        let page = db
            .products()
            .list(&ProductFilter::default(), ProductSort::Newest, 1, 20)
            .await
            .unwrap();
        assert!(page.products.iter().all(|p| p.id != product.id));
    }

    #[tokio::test]
    async fn test_cart_persistence_roundtrip() {
        let db = test_db().await;
        let user = seed_user(&db, "a@example.com").await;
        let category = seed_category(&db).await;
        let product = seed_product(&db, &category.id, 25_000, 8).await;

        let mut cart = db.carts().get_or_create(&user.id).await.unwrap();
        cart.add_item(&product, 2).unwrap();
        db.carts().replace_items(&cart).await.unwrap();

        let reloaded = db.carts().get(&user.id).await.unwrap().unwrap();
        assert_eq!(reloaded.id, cart.id);
        assert_eq!(reloaded.items.len(), 1);
        assert_eq!(reloaded.items[0].quantity, 2);
        assert_eq!(reloaded.items[0].price_cents, 25_000);

        let lines = db.carts().line_products(&cart.id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].product_id, product.id);
        assert_eq!(lines[0].stock, 8);

        // get_or_create must reuse the same cart row.
        let again = db.carts().get_or_create(&user.id).await.unwrap();
        assert_eq!(again.id, cart.id);
    }
}
