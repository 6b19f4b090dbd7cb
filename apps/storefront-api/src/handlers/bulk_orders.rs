//! Bulk order request handlers.
//!
//! Wholesale enquiries arrive unauthenticated from the storefront
//! contact form; triage (status changes, deletion) is admin-only.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use kirana_core::{validation, BulkOrder, BulkOrderItem, BulkOrderStatus};
use kirana_db::repository::bulk_order::generate_bulk_order_id;

use crate::auth::AdminUser;
use crate::error::ApiError;
use crate::response::{created, message_only, ok, ok_message, Reply};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBulkOrderRequest {
    pub customer_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub company: Option<String>,
    pub message: Option<String>,
    pub items: Vec<BulkOrderItemRequest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOrderItemRequest {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBulkOrderRequest {
    pub status: BulkOrderStatus,
}

/// `POST /api/bulk-orders` - public submission.
pub async fn create_bulk_order(
    State(state): State<AppState>,
    Json(req): Json<CreateBulkOrderRequest>,
) -> Result<Reply, ApiError> {
    validation::validate_required("customerName", &req.customer_name)?;
    validation::validate_required("phone", &req.phone)?;
    if let Some(email) = req.email.as_deref() {
        validation::validate_email(email)?;
    }
    if req.items.is_empty() {
        return Err(ApiError::validation("At least one product is required"));
    }
    for item in &req.items {
        validation::validate_quantity(item.quantity)?;
    }

    let now = Utc::now();
    let bulk_order = BulkOrder {
        id: generate_bulk_order_id(),
        customer_name: req.customer_name.trim().to_string(),
        phone: req.phone.trim().to_string(),
        email: req.email,
        company: req.company,
        message: req.message,
        items: req
            .items
            .into_iter()
            .map(|item| BulkOrderItem {
                product_id: item.product_id,
                quantity: item.quantity,
                product_name: None,
            })
            .collect(),
        status: BulkOrderStatus::Pending,
        created_at: now,
        updated_at: now,
    };

    state.db.bulk_orders().insert(&bulk_order).await?;

    info!(id = %bulk_order.id, customer = %bulk_order.customer_name, "Bulk order request received");
    Ok(created(
        "Bulk order request submitted",
        json!({ "bulkOrder": bulk_order }),
    ))
}

/// `GET /api/bulk-orders` - admin triage list, newest first.
pub async fn list_bulk_orders(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Reply, ApiError> {
    let bulk_orders = state.db.bulk_orders().list_all().await?;
    Ok(ok(json!({ "bulkOrders": bulk_orders })))
}

/// `PUT /api/bulk-orders/:id` - admin status update.
pub async fn update_bulk_order(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateBulkOrderRequest>,
) -> Result<Reply, ApiError> {
    state.db.bulk_orders().set_status(&id, req.status).await?;

    let bulk_order = state
        .db
        .bulk_orders()
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Bulk order"))?;

    Ok(ok_message(
        "Bulk order updated",
        json!({ "bulkOrder": bulk_order }),
    ))
}

/// `DELETE /api/bulk-orders/:id` - admin hard delete.
pub async fn delete_bulk_order(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Reply, ApiError> {
    state.db.bulk_orders().delete(&id).await?;
    Ok(message_only("Bulk order deleted"))
}
