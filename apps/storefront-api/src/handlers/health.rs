//! Service health endpoint.

use axum::extract::State;
use serde_json::json;

use crate::response::{ok, Reply};
use crate::AppState;

/// `GET /health` - service liveness plus a database round-trip.
pub async fn health(State(state): State<AppState>) -> Reply {
    let database = state.db.health_check().await;

    ok(json!({
        "service": "storefront-api",
        "database": database,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_state;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_health_reports_database() {
        let state = test_state().await;
        let (status, body) = health(State(state)).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.0.success);
        let data = body.0.data.unwrap();
        assert_eq!(data["database"], true);
    }
}
