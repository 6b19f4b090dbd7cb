//! Uniform response envelope.
//!
//! Every endpoint answers with the same JSON shape:
//! `{"success": bool, "message"?: string, "data"?: object}` — success
//! bodies here, error bodies via [`crate::error::ApiError`].

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use serde_json::Value;

/// The response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Shorthand for the (status, body) pair handlers return.
pub type Reply = (StatusCode, Json<ApiResponse>);

/// 200 with data.
pub fn ok(data: Value) -> Reply {
    (
        StatusCode::OK,
        Json(ApiResponse {
            success: true,
            message: None,
            data: Some(data),
        }),
    )
}

/// 200 with a message and data.
pub fn ok_message(message: impl Into<String>, data: Value) -> Reply {
    (
        StatusCode::OK,
        Json(ApiResponse {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }),
    )
}

/// 201 with a message and data.
pub fn created(message: impl Into<String>, data: Value) -> Reply {
    (
        StatusCode::CREATED,
        Json(ApiResponse {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }),
    )
}

/// 200 with only a message (deletions, deactivations).
pub fn message_only(message: impl Into<String>) -> Reply {
    (
        StatusCode::OK,
        Json(ApiResponse {
            success: true,
            message: Some(message.into()),
            data: None,
        }),
    )
}
