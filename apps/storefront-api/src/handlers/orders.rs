//! Order handlers: checkout, listing, and cancellation.
//!
//! ## Checkout Sequence
//! ```text
//! 1. Load the cart                 → EmptyCart when absent or drained
//! 2. Re-validate stock per line    → OutOfStock naming the product
//! 3. Price (items/shipping/GST)    → computed once, stored forever
//! 4. Snapshot line items           → name/price/image frozen
//! 5. OrderRepository::create       → debit + insert + drain, one
//!                                    transaction; a raced last unit
//!                                    rolls the whole thing back
//! ```
//!
//! Step 2 runs against live stock because quantities were only checked
//! at add-to-cart time; step 5's conditional debit is what actually
//! guarantees no oversell under concurrency.

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use kirana_core::{
    validation, CoreError, Order, OrderItem, OrderPricing, PaymentMethod, PaymentStatus, Product,
    ShippingInfo,
};
use kirana_db::repository::order::{generate_order_id, generate_order_item_id};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::response::{created, ok, ok_message, Reply};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub shipping_info: ShippingInfo,
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOrderRequest {
    pub cancellation_reason: Option<String>,
}

fn validate_shipping(info: &ShippingInfo) -> Result<(), ApiError> {
    validation::validate_required("fullName", &info.full_name)?;
    validation::validate_required("phone", &info.phone)?;
    validation::validate_email(&info.email)?;
    validation::validate_required("district", &info.district)?;
    validation::validate_required("city", &info.city)?;
    validation::validate_required("landmark", &info.landmark)?;
    Ok(())
}

/// Re-reads every cart line's product and rejects the checkout when any
/// line can no longer be fulfilled. Returns the products keyed by id for
/// the snapshot step.
async fn validate_stock(
    state: &AppState,
    cart: &kirana_core::Cart,
) -> Result<HashMap<String, Product>, ApiError> {
    let mut products = HashMap::with_capacity(cart.items.len());

    for item in &cart.items {
        let product = state.db.products().get(&item.product_id).await?;

        match product {
            Some(p) if p.can_fulfill(item.quantity) => {
                products.insert(p.id.clone(), p);
            }
            Some(p) => {
                return Err(CoreError::OutOfStock { name: p.name }.into());
            }
            None => {
                return Err(ApiError::not_found("Product"));
            }
        }
    }

    Ok(products)
}

/// `POST /api/orders` - converts the cart into a priced, immutable order.
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateOrderRequest>,
) -> Result<Reply, ApiError> {
    validate_shipping(&req.shipping_info)?;

    let cart = state
        .db
        .carts()
        .get(&user.id)
        .await?
        .filter(|c| !c.is_empty())
        .ok_or(CoreError::EmptyCart)?;

    let products = validate_stock(&state, &cart).await?;

    let pricing = OrderPricing::quote(cart.total());

    // Freeze the snapshot: current name and first image, the unit price
    // the cart pinned at add time.
    let items: Vec<OrderItem> = cart
        .items
        .iter()
        .map(|item| {
            let product = &products[&item.product_id];
            OrderItem {
                id: generate_order_item_id(),
                product_id: item.product_id.clone(),
                name: product.name.clone(),
                quantity: item.quantity,
                price_cents: item.price_cents,
                image_url: product.first_image_url(),
            }
        })
        .collect();

    let now = Utc::now();
    let order = Order {
        id: generate_order_id(),
        user_id: user.id.clone(),
        items,
        shipping_info: req.shipping_info,
        payment_method: req.payment_method.unwrap_or_default(),
        payment_status: PaymentStatus::Pending,
        items_price_cents: pricing.items_price_cents,
        shipping_price_cents: pricing.shipping_price_cents,
        tax_price_cents: pricing.tax_price_cents,
        total_price_cents: pricing.total_price_cents,
        order_status: Default::default(),
        tracking_number: None,
        delivered_at: None,
        cancelled_at: None,
        cancellation_reason: None,
        created_at: now,
        updated_at: now,
    };

    state.db.orders().create(&order, &cart.id).await?;

    info!(
        order_id = %order.id,
        user_id = %user.id,
        total_cents = order.total_price_cents,
        "Order placed"
    );
    Ok(created("Order placed successfully", json!({ "order": order })))
}

/// `GET /api/orders/summary` - the checkout price breakdown for the
/// current cart, without creating anything.
pub async fn order_summary(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Reply, ApiError> {
    let cart = state
        .db
        .carts()
        .get(&user.id)
        .await?
        .filter(|c| !c.is_empty())
        .ok_or(CoreError::EmptyCart)?;

    let pricing = OrderPricing::quote(cart.total());

    Ok(ok(json!({
        "summary": pricing,
        "itemCount": cart.item_count(),
    })))
}

/// `GET /api/orders` - the caller's own orders, newest first.
pub async fn list_my_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Reply, ApiError> {
    let orders = state.db.orders().list_by_user(&user.id).await?;
    Ok(ok(json!({ "orders": orders })))
}

/// `GET /api/orders/:id` - owner or admin only.
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Reply, ApiError> {
    let order = state
        .db
        .orders()
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order"))?;

    if order.user_id != user.id && !user.is_admin() {
        return Err(ApiError::forbidden("You do not have access to this order"));
    }

    Ok(ok(json!({ "order": order })))
}

/// `PUT /api/orders/:id/cancel` - owner-only; restores stock atomically
/// with the status flip. Terminal orders cannot be cancelled.
pub async fn cancel_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    body: Option<Json<CancelOrderRequest>>,
) -> Result<Reply, ApiError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();

    let order = state
        .db
        .orders()
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order"))?;

    if order.user_id != user.id {
        return Err(ApiError::forbidden("You do not have access to this order"));
    }

    if !order.order_status.can_cancel() {
        return Err(CoreError::InvalidTransition {
            current_status: order.order_status.as_str().to_string(),
        }
        .into());
    }

    state
        .db
        .orders()
        .cancel(&id, req.cancellation_reason.as_deref(), Utc::now())
        .await?;

    let cancelled = state
        .db
        .orders()
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order"))?;

    info!(order_id = %id, user_id = %user.id, "Order cancelled by owner");
    Ok(ok_message(
        "Order cancelled successfully",
        json!({ "order": cancelled }),
    ))
}
