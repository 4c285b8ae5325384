//! GraphQL queries. Every query needs a token and is scoped by role.

use async_graphql::{Context, Object, Result};

use super::types::{ListingObject, UserObject};
use super::{app_state, gql_error, principal};
use crate::service::{listing_service, user_service};

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Every user for an admin, only the caller otherwise
    async fn users(&self, ctx: &Context<'_>) -> Result<Vec<UserObject>> {
        let state = app_state(ctx)?;
        let principal = principal(ctx)?;

        let users = user_service::list_users(state, principal)
            .await
            .map_err(gql_error)?;

        Ok(users.into_iter().map(Into::into).collect())
    }

    async fn user(&self, ctx: &Context<'_>, email: String) -> Result<UserObject> {
        let state = app_state(ctx)?;
        let principal = principal(ctx)?;

        let user = user_service::get_user(state, principal, email.trim())
            .await
            .map_err(gql_error)?;

        Ok(user.into())
    }

    /// Every listing for an admin, the caller's own otherwise
    async fn listings(&self, ctx: &Context<'_>) -> Result<Vec<ListingObject>> {
        let state = app_state(ctx)?;
        let principal = principal(ctx)?;

        let listings = listing_service::list_for(state, principal, None)
            .await
            .map_err(gql_error)?;

        Ok(listings.into_iter().map(Into::into).collect())
    }

    async fn listing(&self, ctx: &Context<'_>, id: i64) -> Result<ListingObject> {
        let state = app_state(ctx)?;
        let principal = principal(ctx)?;

        let listing = listing_service::get_for(state, principal, id)
            .await
            .map_err(gql_error)?;

        Ok(listing.into())
    }

    /// Accepts `offer`/`request` in any case, and the legacy Spanish names
    async fn listings_by_kind(&self, ctx: &Context<'_>, kind: String) -> Result<Vec<ListingObject>> {
        let state = app_state(ctx)?;
        let principal = principal(ctx)?;

        let kind = listing_service::parse_kind(Some(&kind)).map_err(gql_error)?;
        let listings = listing_service::list_for(state, principal, Some(kind))
            .await
            .map_err(gql_error)?;

        Ok(listings.into_iter().map(Into::into).collect())
    }
}
