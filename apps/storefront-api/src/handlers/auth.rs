//! Account handlers: registration, login, current profile.
//!
//! Registration always creates a `user` role account; admins are
//! promoted through the admin user surface, never self-service. Login
//! failures are a single undifferentiated 401 so the endpoint does not
//! reveal which part of the credentials was wrong.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use kirana_core::{validation, Role, User};
use kirana_db::repository::user::generate_user_id;

use crate::auth::{hash_password, verify_password, AuthUser};
use crate::error::ApiError;
use crate::response::{created, ok, Reply};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `POST /api/auth/register`
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
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
        role: Role::User,
        phone: req.phone,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    state.db.users().insert(&user, &password_hash).await?;

    let token = state.jwt.generate_access_token(&user.id, user.role)?;

    info!(user_id = %user.id, "User registered");
    Ok(created(
        "Registration successful",
        json!({ "user": user, "token": token }),
    ))
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Reply, ApiError> {
    let email = req.email.trim().to_lowercase();

    let Some((user, stored_hash)) = state.db.users().get_credentials(&email).await? else {
        return Err(ApiError::unauthorized("Invalid email or password"));
    };

    if !verify_password(&req.password, &stored_hash) {
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    if !user.is_active {
        return Err(ApiError::unauthorized("Account is deactivated"));
    }

    let token = state.jwt.generate_access_token(&user.id, user.role)?;

    info!(user_id = %user.id, "User logged in");
    Ok(ok(json!({ "user": user, "token": token })))
}

/// `GET /api/auth/me`
pub async fn me(State(state): State<AppState>, user: AuthUser) -> Result<Reply, ApiError> {
    let profile = state
        .db
        .users()
        .get(&user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    Ok(ok(json!({ "user": profile })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::test_support::test_state;
    use axum::http::StatusCode;

    fn register_req(email: &str) -> RegisterRequest {
        RegisterRequest {
            first_name: "Sita".to_string(),
            last_name: "Sharma".to_string(),
            email: email.to_string(),
            password: "correct horse".to_string(),
            phone: None,
        }
    }

    #[tokio::test]
    async fn test_register_login_me_roundtrip() {
        let state = test_state().await;

        let (status, body) = register(State(state.clone()), Json(register_req("sita@example.com")))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let data = body.0.data.unwrap();
        assert_eq!(data["user"]["email"], "sita@example.com");
        assert_eq!(data["user"]["role"], "user");
        assert!(data["user"].get("passwordHash").is_none());
        assert!(!data["token"].as_str().unwrap().is_empty());

        let (status, body) = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "sita@example.com".to_string(),
                password: "correct horse".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::OK);

        let user_id = body.0.data.unwrap()["user"]["id"].as_str().unwrap().to_string();
        let auth = AuthUser {
            id: user_id.clone(),
            role: Role::User,
        };
        let (_, body) = me(State(state), auth).await.unwrap();
        assert_eq!(body.0.data.unwrap()["user"]["id"], user_id.as_str());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let state = test_state().await;

        register(State(state.clone()), Json(register_req("dup@example.com")))
            .await
            .unwrap();
        let err = register(State(state), Json(register_req("dup@example.com")))
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::AlreadyExists);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_failures_are_undifferentiated() {
        let state = test_state().await;
        register(State(state.clone()), Json(register_req("sita@example.com")))
            .await
            .unwrap();

        let wrong_password = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "sita@example.com".to_string(),
                password: "wrong".to_string(),
            }),
        )
        .await
        .unwrap_err();

        let unknown_email = login(
            State(state),
            Json(LoginRequest {
                email: "nobody@example.com".to_string(),
                password: "correct horse".to_string(),
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_password.message, unknown_email.message);
    }

    #[tokio::test]
    async fn test_register_validation() {
        let state = test_state().await;

        let mut bad_email = register_req("not-an-email");
        bad_email.email = "not-an-email".to_string();
        let err = register(State(state.clone()), Json(bad_email)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let mut short_password = register_req("sita@example.com");
        short_password.password = "short".to_string();
        let err = register(State(state), Json(short_password)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
