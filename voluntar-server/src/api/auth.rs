//! Request Authentication
//!
//! Extractors that turn an `Authorization: Bearer` header into a
//! [`Principal`].

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::api::error::ApiError;
use crate::service::auth::extract_bearer;
use crate::service::policy::{PolicyError, Principal};
use crate::state::AppState;

/// A caller with a valid token; rejects with 401 otherwise
#[derive(Debug, Clone)]
pub struct AuthUser(pub Principal);

/// An optional caller
///
/// A missing or malformed header yields `None`, but a token that fails
/// verification is still rejected with 401.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<Principal>);

fn principal_from_parts(parts: &Parts, state: &AppState) -> Result<Option<Principal>, ApiError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let Some(token) = extract_bearer(header) else {
        return Ok(None);
    };

    let claims = state.tokens.verify(token).map_err(|err| {
        tracing::debug!("Rejected token: {}", err);
        ApiError::from(err)
    })?;

    Ok(Some(claims.into()))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        principal_from_parts(parts, state)?
            .map(AuthUser)
            .ok_or_else(|| PolicyError::Unauthenticated.into())
    }
}

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthUser(principal_from_parts(parts, state)?))
    }
}
