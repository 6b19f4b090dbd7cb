//! Admin handlers: catalog management, order oversight, user accounts.
//!
//! Everything here sits behind the [`AdminUser`] extractor. Catalog
//! edits overwrite live product fields directly and never touch the
//! snapshots inside placed orders. Products, categories and users are
//! soft-deleted (`is_active = false`); orders are the one hard delete.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use kirana_core::{
    validation, Category, OrderStatus, Product, ProductImage, Role, User,
};
use kirana_db::repository::category::generate_category_id;
use kirana_db::repository::product::generate_product_id;
use kirana_db::repository::user::generate_user_id;
use kirana_db::{ProductFilter, ProductSort};

use crate::auth::{hash_password, AdminUser};
use crate::error::ApiError;
use crate::response::{created, message_only, ok, ok_message, Reply};
use crate::AppState;

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub original_price_cents: Option<i64>,
    pub category_id: String,
    pub subcategory: Option<String>,
    pub brand: Option<String>,
    pub images: Option<Vec<ProductImage>>,
    pub stock: Option<i64>,
    pub sku: Option<String>,
    pub featured: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub original_price_cents: Option<i64>,
    pub category_id: Option<String>,
    pub subcategory: Option<String>,
    pub brand: Option<String>,
    /// Full replacement of the image list (used to prune stale uploads).
    pub images: Option<Vec<ProductImage>>,
    pub stock: Option<i64>,
    pub sku: Option<String>,
    pub featured: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// `POST /api/admin/products`
pub async fn create_product(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(req): Json<CreateProductRequest>,
) -> Result<Reply, ApiError> {
    validation::validate_name(&req.name)?;
    validation::validate_price_cents(req.price_cents)?;
    let stock = req.stock.unwrap_or(0);
    validation::validate_stock(stock)?;

    state
        .db
        .categories()
        .get(&req.category_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Category"))?;

    let now = Utc::now();
    let product = Product {
        id: generate_product_id(),
        name: req.name.trim().to_string(),
        description: req.description.unwrap_or_default(),
        price_cents: req.price_cents,
        original_price_cents: req.original_price_cents,
        category_id: req.category_id,
        subcategory: req.subcategory,
        brand: req.brand,
        images: req.images.unwrap_or_default(),
        stock,
        sku: req.sku,
        rating: 0.0,
        num_reviews: 0,
        is_active: true,
        featured: req.featured.unwrap_or(false),
        created_at: now,
        updated_at: now,
    };

    state.db.products().insert(&product).await?;

    info!(product_id = %product.id, admin_id = %admin.id, "Product created");
    Ok(created("Product created", json!({ "product": product })))
}

/// `GET /api/admin/products`
pub async fn list_products(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<PageQuery>,
) -> Result<Reply, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let result = state
        .db
        .products()
        .list(&ProductFilter::default(), ProductSort::Newest, page, limit)
        .await?;

    Ok(ok(json!({
        "products": result.products,
        "pagination": { "total": result.total, "page": page, "limit": limit },
    })))
}

/// `PUT /api/admin/products/:id` - field-wise partial overwrite.
pub async fn update_product(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Reply, ApiError> {
    let mut product = state
        .db
        .products()
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product"))?;

    if let Some(name) = req.name {
        validation::validate_name(&name)?;
        product.name = name.trim().to_string();
    }
    if let Some(description) = req.description {
        product.description = description;
    }
    if let Some(price_cents) = req.price_cents {
        validation::validate_price_cents(price_cents)?;
        product.price_cents = price_cents;
    }
    if let Some(original) = req.original_price_cents {
        validation::validate_price_cents(original)?;
        product.original_price_cents = Some(original);
    }
    if let Some(category_id) = req.category_id {
        state
            .db
            .categories()
            .get(&category_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Category"))?;
        product.category_id = category_id;
    }
    if let Some(subcategory) = req.subcategory {
        product.subcategory = Some(subcategory);
    }
    if let Some(brand) = req.brand {
        product.brand = Some(brand);
    }
    if let Some(images) = req.images {
        product.images = images;
    }
    if let Some(stock) = req.stock {
        validation::validate_stock(stock)?;
        product.stock = stock;
    }
    if let Some(sku) = req.sku {
        product.sku = Some(sku);
    }
    if let Some(featured) = req.featured {
        product.featured = featured;
    }

    state.db.products().update(&product).await?;

    info!(product_id = %id, admin_id = %admin.id, "Product updated");
    Ok(ok_message("Product updated", json!({ "product": product })))
}

/// `DELETE /api/admin/products/:id` - soft delete.
pub async fn delete_product(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Reply, ApiError> {
    state.db.products().soft_delete(&id).await?;

    info!(product_id = %id, admin_id = %admin.id, "Product deactivated");
    Ok(message_only("Product deleted"))
}

// =============================================================================
// Categories
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// `POST /api/admin/categories`
pub async fn create_category(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<Reply, ApiError> {
    validation::validate_name(&req.name)?;

    let now = Utc::now();
    let name = req.name.trim().to_string();
    let category = Category {
        id: generate_category_id(),
        slug: Category::slug_from(&name),
        name,
        description: req.description,
        image_url: req.image_url,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    state.db.categories().insert(&category).await?;

    info!(category_id = %category.id, admin_id = %admin.id, "Category created");
    Ok(created("Category created", json!({ "category": category })))
}

/// `PUT /api/admin/categories/:id`
pub async fn update_category(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateCategoryRequest>,
) -> Result<Reply, ApiError> {
    let mut category = state
        .db
        .categories()
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Category"))?;

    if let Some(name) = req.name {
        validation::validate_name(&name)?;
        category.name = name.trim().to_string();
        category.slug = Category::slug_from(&category.name);
    }
    if let Some(description) = req.description {
        category.description = Some(description);
    }
    if let Some(image_url) = req.image_url {
        category.image_url = Some(image_url);
    }

    state.db.categories().update(&category).await?;

    info!(category_id = %id, admin_id = %admin.id, "Category updated");
    Ok(ok_message("Category updated", json!({ "category": category })))
}

/// `DELETE /api/admin/categories/:id` - soft delete.
pub async fn delete_category(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Reply, ApiError> {
    state.db.categories().soft_delete(&id).await?;

    info!(category_id = %id, admin_id = %admin.id, "Category deactivated");
    Ok(message_only("Category deleted"))
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetOrderStatusRequest {
    pub order_status: OrderStatus,
    pub tracking_number: Option<String>,
}

/// `GET /api/admin/orders` - every order, newest first.
pub async fn list_orders(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Reply, ApiError> {
    let orders = state.db.orders().list_all().await?;
    Ok(ok(json!({ "orders": orders })))
}

/// `PUT /api/admin/orders/:id/status` - status override.
///
/// Deliberately permissive: any target status is accepted regardless of
/// the current one. Side effects stay consistent - `delivered` stamps
/// `deliveredAt` and completes payment, entering `cancelled` restores
/// stock exactly once.
pub async fn set_order_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    Json(req): Json<SetOrderStatusRequest>,
) -> Result<Reply, ApiError> {
    state
        .db
        .orders()
        .set_status(&id, req.order_status, req.tracking_number.as_deref(), Utc::now())
        .await?;

    let order = state
        .db
        .orders()
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order"))?;

    info!(
        order_id = %id,
        status = req.order_status.as_str(),
        admin_id = %admin.id,
        "Order status overridden"
    );
    Ok(ok_message("Order status updated", json!({ "order": order })))
}

/// `DELETE /api/admin/orders/:id` - hard delete; stock is not touched.
pub async fn delete_order(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Reply, ApiError> {
    state.db.orders().delete(&id).await?;

    info!(order_id = %id, admin_id = %admin.id, "Order deleted");
    Ok(message_only("Order deleted"))
}

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
    pub phone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub phone: Option<String>,
}

/// `POST /api/admin/users`
pub async fn create_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(req): Json<CreateUserRequest>,
) -> Result<Reply, ApiError> {
    validation::validate_required("firstName", &req.first_name)?;
    validation::validate_required("lastName", &req.last_name)?;
    validation::validate_email(&req.email)?;
    if req.password.len() < 8 {
        return Err(ApiError::validation("Password must be at least 8 characters"));
    }

    let password_hash = hash_password(&req.password)?;
    let now = Utc::now();
    let user = User {
        id: generate_user_id(),
        first_name: req.first_name.trim().to_string(),
        last_name: req.last_name.trim().to_string(),
        email: req.email.trim().to_lowercase(),
        role: req.role.unwrap_or(Role::User),
        phone: req.phone,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    state.db.users().insert(&user, &password_hash).await?;

    info!(user_id = %user.id, admin_id = %admin.id, "User created by admin");
    Ok(created("User created", json!({ "user": user })))
}

/// `GET /api/admin/users`
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Reply, ApiError> {
    let users = state.db.users().list_all().await?;
    Ok(ok(json!({ "users": users })))
}

/// `PUT /api/admin/users/:id` - profile fields only; the password is
/// never changed through this path.
pub async fn update_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Reply, ApiError> {
    let mut user = state
        .db
        .users()
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    if let Some(first_name) = req.first_name {
        validation::validate_required("firstName", &first_name)?;
        user.first_name = first_name.trim().to_string();
    }
    if let Some(last_name) = req.last_name {
        validation::validate_required("lastName", &last_name)?;
        user.last_name = last_name.trim().to_string();
    }
    if let Some(email) = req.email {
        validation::validate_email(&email)?;
        user.email = email.trim().to_lowercase();
    }
    if let Some(role) = req.role {
        user.role = role;
    }
    if let Some(phone) = req.phone {
        user.phone = Some(phone);
    }

    state.db.users().update(&user).await?;

    info!(user_id = %id, admin_id = %admin.id, "User updated by admin");
    Ok(ok_message("User updated", json!({ "user": user })))
}

/// `DELETE /api/admin/users/:id` - soft delete (deactivation).
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Reply, ApiError> {
    state.db.users().soft_delete(&id).await?;

    info!(user_id = %id, admin_id = %admin.id, "User deactivated");
    Ok(message_only("User deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthUser;
    use crate::error::ErrorCode;
    use crate::handlers::cart::{add_item, AddItemRequest};
    use crate::handlers::orders::{create_order, CreateOrderRequest};
    use crate::test_support::{seed_category, seed_product, seed_user, test_shipping, test_state};
    use kirana_core::Role;

    fn admin() -> AdminUser {
        AdminUser(AuthUser {
            id: "admin-1".to_string(),
            role: Role::Admin,
        })
    }

    #[tokio::test]
    async fn test_product_lifecycle() {
        let state = test_state().await;
        let category = seed_category(&state).await;

        let (_, body) = create_product(
            State(state.clone()),
            admin(),
            Json(CreateProductRequest {
                name: "Basmati Rice 5kg".to_string(),
                description: Some("Long grain".to_string()),
                price_cents: 120_000,
                original_price_cents: None,
                category_id: category.id.clone(),
                subcategory: None,
                brand: Some("Himal".to_string()),
                images: None,
                stock: Some(40),
                sku: Some("RICE-5KG".to_string()),
                featured: Some(true),
            }),
        )
        .await
        .unwrap();
        let product_id = body.0.data.unwrap()["product"]["id"]
            .as_str()
            .unwrap()
            .to_string();

        // Partial update: only the price changes.
        let (_, body) = update_product(
            State(state.clone()),
            admin(),
            Path(product_id.clone()),
            Json(UpdateProductRequest {
                price_cents: Some(110_000),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        let product = &body.0.data.unwrap()["product"];
        assert_eq!(product["priceCents"], 110_000);
        assert_eq!(product["name"], "Basmati Rice 5kg");
        assert_eq!(product["stock"], 40);

        delete_product(State(state.clone()), admin(), Path(product_id.clone()))
            .await
            .unwrap();
        let stored = state.db.products().get(&product_id).await.unwrap().unwrap();
        assert!(!stored.is_active);
    }

    #[tokio::test]
    async fn test_create_product_requires_existing_category() {
        let state = test_state().await;

        let err = create_product(
            State(state),
            admin(),
            Json(CreateProductRequest {
                name: "Orphan".to_string(),
                description: None,
                price_cents: 1_000,
                original_price_cents: None,
                category_id: "no-such-category".to_string(),
                subcategory: None,
                brand: None,
                images: None,
                stock: None,
                sku: None,
                featured: None,
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_admin_cancel_override_restores_stock() {
        let state = test_state().await;
        let user = seed_user(&state, "a@example.com", Role::User).await;
        let category = seed_category(&state).await;
        let product = seed_product(&state, &category.id, 40_000, 10).await;

        add_item(
            State(state.clone()),
            user.clone(),
            Json(AddItemRequest {
                product_id: product.id.clone(),
                quantity: 4,
            }),
        )
        .await
        .unwrap();
        let (_, body) = create_order(
            State(state.clone()),
            user,
            Json(CreateOrderRequest {
                shipping_info: test_shipping(),
                payment_method: None,
            }),
        )
        .await
        .unwrap();
        let order_id = body.0.data.unwrap()["order"]["id"]
            .as_str()
            .unwrap()
            .to_string();
        assert_eq!(
            state.db.products().get(&product.id).await.unwrap().unwrap().stock,
            6
        );

        let (_, body) = set_order_status(
            State(state.clone()),
            admin(),
            Path(order_id.clone()),
            Json(SetOrderStatusRequest {
                order_status: OrderStatus::Cancelled,
                tracking_number: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(body.0.data.unwrap()["order"]["orderStatus"], "cancelled");
        assert_eq!(
            state.db.products().get(&product.id).await.unwrap().unwrap().stock,
            10
        );
    }

    #[tokio::test]
    async fn test_delivered_override_completes_payment() {
        let state = test_state().await;
        let user = seed_user(&state, "a@example.com", Role::User).await;
        let category = seed_category(&state).await;
        let product = seed_product(&state, &category.id, 40_000, 10).await;

        add_item(
            State(state.clone()),
            user.clone(),
            Json(AddItemRequest {
                product_id: product.id.clone(),
                quantity: 1,
            }),
        )
        .await
        .unwrap();
        let (_, body) = create_order(
            State(state.clone()),
            user,
            Json(CreateOrderRequest {
                shipping_info: test_shipping(),
                payment_method: None,
            }),
        )
        .await
        .unwrap();
        let order_id = body.0.data.unwrap()["order"]["id"]
            .as_str()
            .unwrap()
            .to_string();

        let (_, body) = set_order_status(
            State(state),
            admin(),
            Path(order_id),
            Json(SetOrderStatusRequest {
                order_status: OrderStatus::Delivered,
                tracking_number: Some("TRK-123".to_string()),
            }),
        )
        .await
        .unwrap();

        let order = &body.0.data.unwrap()["order"];
        assert_eq!(order["orderStatus"], "delivered");
        assert_eq!(order["paymentStatus"], "completed");
        assert_eq!(order["trackingNumber"], "TRK-123");
        assert!(!order["deliveredAt"].is_null());
    }

    #[tokio::test]
    async fn test_user_soft_delete_blocks_login_but_keeps_row() {
        let state = test_state().await;

        let (_, body) = create_user(
            State(state.clone()),
            admin(),
            Json(CreateUserRequest {
                first_name: "Hari".to_string(),
                last_name: "Thapa".to_string(),
                email: "hari@example.com".to_string(),
                password: "long enough".to_string(),
                role: None,
                phone: None,
            }),
        )
        .await
        .unwrap();
        let user_id = body.0.data.unwrap()["user"]["id"]
            .as_str()
            .unwrap()
            .to_string();

        delete_user(State(state.clone()), admin(), Path(user_id.clone()))
            .await
            .unwrap();

        let stored = state.db.users().get(&user_id).await.unwrap().unwrap();
        assert!(!stored.is_active);

        let err = crate::handlers::auth::login(
            State(state),
            Json(crate::handlers::auth::LoginRequest {
                email: "hari@example.com".to_string(),
                password: "long enough".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
    }
}
