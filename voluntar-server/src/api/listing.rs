//! Listing API Handlers
//!
//! HTTP endpoints for the listing board and listing management.

use axum::{Json, extract::State, http::StatusCode};
use voluntar_core::domain::listing::Listing;
use voluntar_core::dto::listing::{CreateListing, KindFilter, UpdateListing};

use crate::api::auth::AuthUser;
use crate::api::error::ApiResult;
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::service::listing_service;
use crate::state::AppState;

// =============================================================================
// Public Board
// =============================================================================

/// GET /api/listings
/// List every listing
pub async fn list_listings(State(state): State<AppState>) -> ApiResult<Json<Vec<Listing>>> {
    tracing::debug!("Listing all listings");

    let listings = listing_service::list_public(&state).await?;

    Ok(Json(listings))
}

/// GET /api/listings/kind?kind=offer
/// List listings of one kind
pub async fn list_listings_by_kind(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<KindFilter>,
) -> ApiResult<Json<Vec<Listing>>> {
    let kind = listing_service::parse_kind(filter.kind.as_deref())?;
    tracing::debug!("Listing listings of kind {}", kind);

    let listings = listing_service::list_public_by_kind(&state, kind).await?;

    Ok(Json(listings))
}

/// GET /api/listings/{id}
/// Get a listing by ID
pub async fn get_listing(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Listing>> {
    tracing::debug!("Getting listing: {}", id);

    let listing = listing_service::get_public(&state, id).await?;

    Ok(Json(listing))
}

// =============================================================================
// Authenticated Endpoints
// =============================================================================

/// GET /api/listings/mine?kind=offer
/// List the listings the caller manages
pub async fn list_my_listings(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ApiQuery(filter): ApiQuery<KindFilter>,
) -> ApiResult<Json<Vec<Listing>>> {
    let kind = match filter.kind.as_deref() {
        Some(raw) => Some(listing_service::parse_kind(Some(raw))?),
        None => None,
    };

    let listings = listing_service::list_for(&state, &principal, kind).await?;

    Ok(Json(listings))
}

/// POST /api/listings
/// Create a listing
pub async fn create_listing(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ApiJson(req): ApiJson<CreateListing>,
) -> ApiResult<(StatusCode, Json<Listing>)> {
    tracing::info!("Creating listing: {}", req.title);

    let listing = listing_service::create_listing(&state, &principal, req).await?;

    Ok((StatusCode::CREATED, Json(listing)))
}

/// PATCH /api/listings/{id}
/// Update a listing (owner or admin)
pub async fn update_listing(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<UpdateListing>,
) -> ApiResult<Json<Listing>> {
    tracing::info!("Updating listing: {}", id);

    let listing = listing_service::update_listing(&state, &principal, id, req).await?;

    Ok(Json(listing))
}

/// DELETE /api/listings/{id}
/// Delete a listing (owner or admin)
pub async fn delete_listing(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    tracing::info!("Deleting listing: {}", id);

    listing_service::delete_listing(&state, &principal, id).await?;

    Ok(StatusCode::NO_CONTENT)
}
