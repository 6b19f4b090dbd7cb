//! Shared fixtures for handler tests: an in-memory database wrapped in
//! [`AppState`] plus seed helpers for users, categories and products.

use chrono::Utc;
use uuid::Uuid;

use kirana_core::{Category, Product, Role, ShippingInfo, User};
use kirana_db::{Database, DbConfig};

use crate::auth::AuthUser;
use crate::config::ApiConfig;
use crate::AppState;

/// Builds an AppState over a fresh in-memory database.
pub async fn test_state() -> AppState {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let config = ApiConfig {
        port: 0,
        database_path: ":memory:".to_string(),
        jwt_secret: "test-secret".to_string(),
        jwt_access_lifetime_secs: 3600,
    };
    AppState::new(db, &config)
}

/// Inserts a user and returns its authenticated identity.
pub async fn seed_user(state: &AppState, email: &str, role: Role) -> AuthUser {
    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        email: email.to_string(),
        role,
        phone: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    state.db.users().insert(&user, "argon2-hash").await.unwrap();

    AuthUser {
        id: user.id,
        role,
    }
}

pub async fn seed_category(state: &AppState) -> Category {
    let now = Utc::now();
    let name = format!("Groceries {}", Uuid::new_v4());
    let category = Category {
        id: Uuid::new_v4().to_string(),
        slug: Category::slug_from(&name),
        name,
        description: None,
        image_url: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    state.db.categories().insert(&category).await.unwrap();
    category
}

pub async fn seed_product(
    state: &AppState,
    category_id: &str,
    price_cents: i64,
    stock: i64,
) -> Product {
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
    state.db.products().insert(&product).await.unwrap();
    product
}

pub fn test_shipping() -> ShippingInfo {
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
