//! Invoice handlers (admin surface).
//!
//! An invoice is derived entirely from its order at generation time and
//! mirrors the order's totals verbatim. At most one exists per order:
//! the application check below gives a friendly message, and the
//! UNIQUE(order_id) index catches whatever races past it.

use axum::extract::{Path, State};
use chrono::Utc;
use serde_json::json;
use tracing::info;

use kirana_core::Invoice;
use kirana_db::repository::invoice::{generate_invoice_id, generate_invoice_number};

use crate::auth::AdminUser;
use crate::error::ApiError;
use crate::response::{created, ok, Reply};
use crate::AppState;

/// `POST /api/invoices/:order_id`
pub async fn create_invoice(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(order_id): Path<String>,
) -> Result<Reply, ApiError> {
    let order = state
        .db
        .orders()
        .get(&order_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order"))?;

    if state.db.invoices().get_by_order(&order_id).await?.is_some() {
        return Err(ApiError::already_exists("Invoice already exists for this order"));
    }

    let issued_at = Utc::now();
    let invoice = Invoice::from_order(
        generate_invoice_id(),
        generate_invoice_number(issued_at),
        &order,
        issued_at,
    );

    state.db.invoices().insert(&invoice).await?;

    info!(
        order_id = %order_id,
        invoice_number = %invoice.invoice_number,
        admin_id = %admin.id,
        "Invoice created"
    );
    Ok(created(
        "Invoice created successfully",
        json!({ "invoice": invoice }),
    ))
}

/// `GET /api/invoices/:order_id`
pub async fn get_invoice(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(order_id): Path<String>,
) -> Result<Reply, ApiError> {
    let invoice = state
        .db
        .invoices()
        .get_by_order(&order_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Invoice"))?;

    Ok(ok(json!({ "invoice": invoice })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthUser;
    use crate::error::ErrorCode;
    use crate::handlers::cart::{add_item, AddItemRequest};
    use crate::handlers::orders::{create_order, CreateOrderRequest};
    use crate::test_support::{seed_category, seed_product, seed_user, test_shipping, test_state};
    use axum::http::StatusCode;
    use axum::Json;
    use kirana_core::Role;

    async fn place_order(state: &AppState) -> String {
        let user = seed_user(state, "buyer@example.com", Role::User).await;
        let category = seed_category(state).await;
        let product = seed_product(state, &category.id, 40_000, 10).await;

        add_item(
            State(state.clone()),
            user.clone(),
            Json(AddItemRequest {
                product_id: product.id,
                quantity: 3,
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

        body.0.data.unwrap()["order"]["id"]
            .as_str()
            .unwrap()
            .to_string()
    }

    fn admin() -> AdminUser {
        AdminUser(AuthUser {
            id: "admin-1".to_string(),
            role: Role::Admin,
        })
    }

    #[tokio::test]
    async fn test_invoice_mirrors_order_and_rejects_duplicates() {
        let state = test_state().await;
        let order_id = place_order(&state).await;

        let (status, body) = create_invoice(State(state.clone()), admin(), Path(order_id.clone()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let invoice = &body.0.data.unwrap()["invoice"];
        assert_eq!(invoice["grandTotalCents"], 141_600);
        assert_eq!(invoice["subtotalCents"], 120_000);
        assert_eq!(invoice["status"], "unpaid");
        assert_eq!(invoice["customer"]["name"], "Sita Sharma");

        // Second call for the same order: 400 AlreadyExists.
        let err = create_invoice(State(state.clone()), admin(), Path(order_id.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AlreadyExists);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        // And the stored invoice is readable.
        let (_, body) = get_invoice(State(state), admin(), Path(order_id))
            .await
            .unwrap();
        assert_eq!(body.0.data.unwrap()["invoice"]["grandTotalCents"], 141_600);
    }

    #[tokio::test]
    async fn test_invoice_for_missing_order_404() {
        let state = test_state().await;

        let err = create_invoice(State(state.clone()), admin(), Path("no-order".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = get_invoice(State(state), admin(), Path("no-order".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
