//! Cart handlers.
//!
//! Each mutation loads the cart, applies the pure logic in
//! `kirana_core::cart`, and persists the whole item list back. Totals
//! are recomputed on every read and never stored. Responses join live
//! product data (name, image, current stock) onto each line.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use kirana_core::{validation, Cart};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::response::{ok, ok_message, Reply};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    pub quantity: i64,
}

/// A cart line decorated with live product data for display.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CartLineView {
    id: String,
    product_id: String,
    name: String,
    image_url: String,
    quantity: i64,
    /// Unit price pinned at the last add of this product.
    price_cents: i64,
    line_total_cents: i64,
    /// Live catalog data, not part of the cart document.
    stock: i64,
    current_price_cents: i64,
    is_active: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CartView {
    id: String,
    items: Vec<CartLineView>,
    total_cents: i64,
    item_count: i64,
}

async fn cart_view(state: &AppState, cart: &Cart) -> Result<CartView, ApiError> {
    let products = state.db.carts().line_products(&cart.id).await?;

    let items = cart
        .items
        .iter()
        .map(|item| {
            let live = products.iter().find(|p| p.item_id == item.id);
            CartLineView {
                id: item.id.clone(),
                product_id: item.product_id.clone(),
                name: live.map(|p| p.name.clone()).unwrap_or_default(),
                image_url: live.map(|p| p.image_url.clone()).unwrap_or_default(),
                quantity: item.quantity,
                price_cents: item.price_cents,
                line_total_cents: item.line_total().cents(),
                stock: live.map(|p| p.stock).unwrap_or(0),
                current_price_cents: live
                    .map(|p| p.current_price_cents)
                    .unwrap_or(item.price_cents),
                is_active: live.map(|p| p.is_active).unwrap_or(false),
            }
        })
        .collect();

    Ok(CartView {
        id: cart.id.clone(),
        items,
        total_cents: cart.total().cents(),
        item_count: cart.item_count(),
    })
}

/// `GET /api/cart` - lazily creates the cart on first access.
pub async fn get_cart(State(state): State<AppState>, user: AuthUser) -> Result<Reply, ApiError> {
    let cart = state.db.carts().get_or_create(&user.id).await?;
    let view = cart_view(&state, &cart).await?;

    Ok(ok(json!({ "cart": view })))
}

/// `POST /api/cart/items` - upserts a line, re-pinning its price to the
/// product's current price.
pub async fn add_item(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<AddItemRequest>,
) -> Result<Reply, ApiError> {
    validation::validate_quantity(req.quantity)?;

    let product = state
        .db
        .products()
        .get(&req.product_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product"))?;

    let mut cart = state.db.carts().get_or_create(&user.id).await?;
    cart.add_item(&product, req.quantity)?;
    state.db.carts().replace_items(&cart).await?;

    info!(user_id = %user.id, product_id = %product.id, quantity = req.quantity, "Item added to cart");

    let view = cart_view(&state, &cart).await?;
    Ok(ok_message("Item added to cart", json!({ "cart": view })))
}

/// `PUT /api/cart/items/:item_id` - sets a line's quantity, checked
/// against the product's current stock.
pub async fn update_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(item_id): Path<String>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Reply, ApiError> {
    let mut cart = state
        .db
        .carts()
        .get(&user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Cart"))?;

    let product_id = cart
        .find_item(&item_id)
        .map(|item| item.product_id.clone())
        .ok_or_else(|| ApiError::not_found("Cart item"))?;

    let product = state
        .db
        .products()
        .get(&product_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product"))?;

    cart.update_quantity(&item_id, req.quantity, &product)?;
    state.db.carts().replace_items(&cart).await?;

    let view = cart_view(&state, &cart).await?;
    Ok(ok_message("Cart updated", json!({ "cart": view })))
}

/// `DELETE /api/cart/items/:item_id` - idempotent; removing an absent
/// item still succeeds.
pub async fn remove_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(item_id): Path<String>,
) -> Result<Reply, ApiError> {
    let mut cart = state.db.carts().get_or_create(&user.id).await?;

    cart.remove_item(&item_id);
    state.db.carts().replace_items(&cart).await?;

    let view = cart_view(&state, &cart).await?;
    Ok(ok_message("Item removed from cart", json!({ "cart": view })))
}

/// `DELETE /api/cart` - empties the item list in place. 404 only when
/// the cart row has never been created.
pub async fn clear_cart(State(state): State<AppState>, user: AuthUser) -> Result<Reply, ApiError> {
    let mut cart = state
        .db
        .carts()
        .get(&user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Cart"))?;

    cart.clear();
    state.db.carts().replace_items(&cart).await?;

    let view = cart_view(&state, &cart).await?;
    Ok(ok_message("Cart cleared", json!({ "cart": view })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::test_support::{seed_category, seed_product, seed_user, test_state};
    use kirana_core::Role;

    #[tokio::test]
    async fn test_add_item_reports_totals() {
        let state = test_state().await;
        let user = seed_user(&state, "a@example.com", Role::User).await;
        let category = seed_category(&state).await;
        let p1 = seed_product(&state, &category.id, 40_000, 10).await;
        let p2 = seed_product(&state, &category.id, 20_000, 10).await;

        add_item(
            State(state.clone()),
            user.clone(),
            Json(AddItemRequest {
                product_id: p1.id.clone(),
                quantity: 2,
            }),
        )
        .await
        .unwrap();

        let (_, body) = add_item(
            State(state),
            user,
            Json(AddItemRequest {
                product_id: p2.id.clone(),
                quantity: 3,
            }),
        )
        .await
        .unwrap();

        let cart = &body.0.data.unwrap()["cart"];
        assert_eq!(cart["items"].as_array().unwrap().len(), 2);
        assert_eq!(cart["totalCents"], 2 * 40_000 + 3 * 20_000);
        assert_eq!(cart["itemCount"], 5);
    }

    #[tokio::test]
    async fn test_add_missing_product_404() {
        let state = test_state().await;
        let user = seed_user(&state, "a@example.com", Role::User).await;

        let err = add_item(
            State(state),
            user,
            Json(AddItemRequest {
                product_id: "no-such-product".to_string(),
                quantity: 1,
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_add_beyond_stock_rejected() {
        let state = test_state().await;
        let user = seed_user(&state, "a@example.com", Role::User).await;
        let category = seed_category(&state).await;
        let product = seed_product(&state, &category.id, 10_000, 3).await;

        let err = add_item(
            State(state),
            user,
            Json(AddItemRequest {
                product_id: product.id,
                quantity: 5,
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::InsufficientStock);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let state = test_state().await;
        let user = seed_user(&state, "a@example.com", Role::User).await;
        let category = seed_category(&state).await;
        let product = seed_product(&state, &category.id, 10_000, 5).await;

        let (_, body) = add_item(
            State(state.clone()),
            user.clone(),
            Json(AddItemRequest {
                product_id: product.id,
                quantity: 1,
            }),
        )
        .await
        .unwrap();
        let item_id = body.0.data.unwrap()["cart"]["items"][0]["id"]
            .as_str()
            .unwrap()
            .to_string();

        let (_, body) = remove_item(State(state.clone()), user.clone(), Path(item_id.clone()))
            .await
            .unwrap();
        assert!(body.0.success);

        // Removing again, and removing garbage, still succeeds.
        let (_, body) = remove_item(State(state.clone()), user.clone(), Path(item_id))
            .await
            .unwrap();
        assert!(body.0.success);

        let (_, body) = remove_item(State(state), user, Path("garbage".to_string()))
            .await
            .unwrap();
        assert_eq!(body.0.data.unwrap()["cart"]["itemCount"], 0);
    }

    #[tokio::test]
    async fn test_update_quantity_checks_stock() {
        let state = test_state().await;
        let user = seed_user(&state, "a@example.com", Role::User).await;
        let category = seed_category(&state).await;
        let product = seed_product(&state, &category.id, 10_000, 5).await;

        let (_, body) = add_item(
            State(state.clone()),
            user.clone(),
            Json(AddItemRequest {
                product_id: product.id,
                quantity: 1,
            }),
        )
        .await
        .unwrap();
        let item_id = body.0.data.unwrap()["cart"]["items"][0]["id"]
            .as_str()
            .unwrap()
            .to_string();

        let (_, body) = update_item(
            State(state.clone()),
            user.clone(),
            Path(item_id.clone()),
            Json(UpdateItemRequest { quantity: 5 }),
        )
        .await
        .unwrap();
        assert_eq!(body.0.data.unwrap()["cart"]["itemCount"], 5);

        let err = update_item(
            State(state.clone()),
            user.clone(),
            Path(item_id),
            Json(UpdateItemRequest { quantity: 6 }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);

        let err = update_item(
            State(state),
            user,
            Path("missing-item".to_string()),
            Json(UpdateItemRequest { quantity: 1 }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_clear_without_cart_404() {
        let state = test_state().await;
        let user = seed_user(&state, "a@example.com", Role::User).await;

        let err = clear_cart(State(state), user).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
