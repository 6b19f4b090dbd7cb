//! # Product Repository
//!
//! Database operations for products: storefront listing with filters and
//! pagination, CRUD, and soft deletion. Stock movements happen inside the
//! order repository's transactions, not here.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use kirana_core::{Product, ProductImage};

/// Column list shared by every product SELECT.
const PRODUCT_COLUMNS: &str = "id, name, description, price_cents, original_price_cents, \
     category_id, subcategory, brand, images_json, stock, sku, rating, \
     num_reviews, is_active, featured, created_at, updated_at";

/// Raw product row; `images_json` is decoded into typed images when
/// converting to the domain type.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    description: String,
    price_cents: i64,
    original_price_cents: Option<i64>,
    category_id: String,
    subcategory: Option<String>,
    brand: Option<String>,
    images_json: String,
    stock: i64,
    sku: Option<String>,
    rating: f64,
    num_reviews: i64,
    is_active: bool,
    featured: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        let images: Vec<ProductImage> =
            serde_json::from_str(&row.images_json).unwrap_or_default();
        Product {
            id: row.id,
            name: row.name,
            description: row.description,
            price_cents: row.price_cents,
            original_price_cents: row.original_price_cents,
            category_id: row.category_id,
            subcategory: row.subcategory,
            brand: row.brand,
            images,
            stock: row.stock,
            sku: row.sku,
            rating: row.rating,
            num_reviews: row.num_reviews,
            is_active: row.is_active,
            featured: row.featured,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Sort orders accepted by the storefront listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductSort {
    Newest,
    PriceLow,
    PriceHigh,
    Rating,
}

impl ProductSort {
    /// Parses the `sort` query key; unknown values fall back to newest.
    pub fn from_key(key: Option<&str>) -> Self {
        match key {
            Some("price_low") => ProductSort::PriceLow,
            Some("price_high") => ProductSort::PriceHigh,
            Some("rating") => ProductSort::Rating,
            _ => ProductSort::Newest,
        }
    }

    fn order_clause(&self) -> &'static str {
        match self {
            ProductSort::Newest => "created_at DESC",
            ProductSort::PriceLow => "price_cents ASC",
            ProductSort::PriceHigh => "price_cents DESC",
            ProductSort::Rating => "rating DESC",
        }
    }
}

/// Storefront listing filter. Only active products are ever returned.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category_id: Option<String>,
    pub subcategory: Option<String>,
    pub brand: Option<String>,
    pub min_price_cents: Option<i64>,
    pub max_price_cents: Option<i64>,
    pub featured_only: bool,
    /// Substring match over name and description.
    pub search: Option<String>,
}

/// A page of products plus the unpaginated match count.
#[derive(Debug)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total: i64,
}

// Shared WHERE clause for list() and its count query. Numbered
// placeholders so the search term can be referenced twice.
const LIST_WHERE: &str = "is_active = 1 \
     AND (?1 IS NULL OR category_id = ?1) \
     AND (?2 IS NULL OR subcategory = ?2) \
     AND (?3 IS NULL OR LOWER(brand) LIKE '%' || LOWER(?3) || '%') \
     AND (?4 IS NULL OR price_cents >= ?4) \
     AND (?5 IS NULL OR price_cents <= ?5) \
     AND (?6 = 0 OR featured = 1) \
     AND (?7 IS NULL OR LOWER(name) LIKE '%' || LOWER(?7) || '%' \
          OR LOWER(description) LIKE '%' || LOWER(?7) || '%')";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists active products matching the filter, with pagination.
    ///
    /// ## Arguments
    /// * `filter` - Catalog filter (category, price band, search, ...)
    /// * `sort` - Sort order
    /// * `page` - 1-based page number
    /// * `limit` - Page size
    pub async fn list(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
        page: u32,
        limit: u32,
    ) -> DbResult<ProductPage> {
        let page = page.max(1);
        let offset = ((page - 1) * limit) as i64;

        debug!(?filter, ?sort, page, limit, "Listing products");

        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE {LIST_WHERE} \
             ORDER BY {} LIMIT ?8 OFFSET ?9",
            sort.order_clause()
        );

        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(&filter.category_id)
            .bind(&filter.subcategory)
            .bind(&filter.brand)
            .bind(filter.min_price_cents)
            .bind(filter.max_price_cents)
            .bind(filter.featured_only as i64)
            .bind(&filter.search)
            .bind(limit as i64)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let count_sql = format!("SELECT COUNT(*) FROM products WHERE {LIST_WHERE}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(&filter.category_id)
            .bind(&filter.subcategory)
            .bind(&filter.brand)
            .bind(filter.min_price_cents)
            .bind(filter.max_price_cents)
            .bind(filter.featured_only as i64)
            .bind(&filter.search)
            .fetch_one(&self.pool)
            .await?;

        Ok(ProductPage {
            products: rows.into_iter().map(Product::from).collect(),
            total,
        })
    }

    /// Gets a product by ID regardless of its active flag.
    pub async fn get(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Product::from))
    }

    /// Gets an active product by ID. Soft-deleted products read as absent.
    pub async fn get_active(&self, id: &str) -> DbResult<Option<Product>> {
        let sql =
            format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1 AND is_active = 1");
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Product::from))
    }

    /// Inserts a new product.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        let images_json = encode_images(&product.images)?;

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, description, price_cents, original_price_cents,
                category_id, subcategory, brand, images_json, stock, sku,
                rating, num_reviews, is_active, featured, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9, ?10, ?11,
                ?12, ?13, ?14, ?15, ?16, ?17
            )
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.original_price_cents)
        .bind(&product.category_id)
        .bind(&product.subcategory)
        .bind(&product.brand)
        .bind(&images_json)
        .bind(product.stock)
        .bind(&product.sku)
        .bind(product.rating)
        .bind(product.num_reviews)
        .bind(product.is_active)
        .bind(product.featured)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an existing product (full field overwrite).
    ///
    /// Catalog edits never touch order snapshots; placed orders keep the
    /// name/price/image they were created with.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let images_json = encode_images(&product.images)?;
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                description = ?3,
                price_cents = ?4,
                original_price_cents = ?5,
                category_id = ?6,
                subcategory = ?7,
                brand = ?8,
                images_json = ?9,
                stock = ?10,
                sku = ?11,
                rating = ?12,
                num_reviews = ?13,
                featured = ?14,
                updated_at = ?15
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.original_price_cents)
        .bind(&product.category_id)
        .bind(&product.subcategory)
        .bind(&product.brand)
        .bind(&images_json)
        .bind(product.stock)
        .bind(&product.sku)
        .bind(product.rating)
        .bind(product.num_reviews)
        .bind(product.featured)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Soft-deletes a product by setting is_active = false.
    /// Historical order items keep referencing the row.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1 AND is_active = 1",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

fn encode_images(images: &[ProductImage]) -> DbResult<String> {
    serde_json::to_string(images).map_err(|e| DbError::Internal(e.to_string()))
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}
