//! User API Handlers
//!
//! HTTP endpoints for accounts and login.

use axum::{Json, extract::State, http::StatusCode};
use voluntar_core::domain::user::User;
use voluntar_core::dto::user::{CreateUser, LoginRequest, LoginResponse};

use crate::api::auth::{AuthUser, MaybeAuthUser};
use crate::api::error::ApiResult;
use crate::api::extract::{ApiJson, ApiPath};
use crate::service::user_service;
use crate::state::AppState;

/// POST /api/users/login
/// Exchange credentials for an access token
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    tracing::debug!("Login attempt for {}", req.email);

    let session = user_service::login(&state, req).await?;

    Ok(Json(session.into()))
}

/// POST /api/users
/// Register a new account
pub async fn create_user(
    State(state): State<AppState>,
    MaybeAuthUser(actor): MaybeAuthUser,
    ApiJson(req): ApiJson<CreateUser>,
) -> ApiResult<(StatusCode, Json<User>)> {
    tracing::info!("Registering user: {}", req.email);

    let user = user_service::register(&state, actor.as_ref(), req).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /api/users
/// List the users visible to the caller
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> ApiResult<Json<Vec<User>>> {
    tracing::debug!("Listing users for {}", principal.email);

    let users = user_service::list_users(&state, &principal).await?;

    Ok(Json(users))
}

/// GET /api/users/{email}
/// Get a user by email
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ApiPath(email): ApiPath<String>,
) -> ApiResult<Json<User>> {
    tracing::debug!("Getting user: {}", email);

    let user = user_service::get_user(&state, &principal, &email).await?;

    Ok(Json(user))
}

/// DELETE /api/users/{email}
/// Delete a user (admin only)
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ApiPath(email): ApiPath<String>,
) -> ApiResult<StatusCode> {
    tracing::info!("Deleting user: {}", email);

    user_service::delete_user(&state, &principal, &email).await?;

    Ok(StatusCode::NO_CONTENT)
}
