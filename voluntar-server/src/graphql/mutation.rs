//! GraphQL mutations

use async_graphql::{Context, Object, Result};
use voluntar_core::dto::user::LoginRequest;

use super::types::{
    Ack, CreateListingInput, CreateUserInput, ListingObject, LoginPayload, UpdateListingInput,
    UserObject,
};
use super::{app_state, gql_error, principal};
use crate::api::error::ApiError;
use crate::service::policy::Principal;
use crate::service::{listing_service, user_service};

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Anyone may register; only an admin may create an admin
    async fn create_user(&self, ctx: &Context<'_>, input: CreateUserInput) -> Result<UserObject> {
        let state = app_state(ctx)?;
        let actor = ctx.data_opt::<Principal>();

        let user = user_service::register(state, actor, input.into())
            .await
            .map_err(gql_error)?;

        Ok(user.into())
    }

    async fn delete_user(&self, ctx: &Context<'_>, email: String) -> Result<Ack> {
        let state = app_state(ctx)?;
        let principal = principal(ctx)?;

        user_service::delete_user(state, principal, email.trim())
            .await
            .map_err(gql_error)?;

        Ok(Ack {
            ok: true,
            message: format!("User {} deleted", email.trim()),
        })
    }

    async fn login(&self, ctx: &Context<'_>, email: String, password: String) -> Result<LoginPayload> {
        let state = app_state(ctx)?;

        match user_service::login(state, LoginRequest { email, password }).await {
            Ok(session) => Ok(LoginPayload {
                ok: true,
                message: "Login successful".to_string(),
                token: Some(session.token),
                user: Some(session.user.into()),
            }),
            Err(err) => {
                let err = ApiError::from(err);
                if matches!(err, ApiError::DatabaseError(_) | ApiError::InternalError(_)) {
                    return Err(gql_error(err));
                }

                Ok(LoginPayload {
                    ok: false,
                    message: err.to_string(),
                    token: None,
                    user: None,
                })
            }
        }
    }

    async fn create_listing(
        &self,
        ctx: &Context<'_>,
        input: CreateListingInput,
    ) -> Result<ListingObject> {
        let state = app_state(ctx)?;
        let principal = principal(ctx)?;

        let listing = listing_service::create_listing(state, principal, input.into())
            .await
            .map_err(gql_error)?;

        Ok(listing.into())
    }

    async fn update_listing(
        &self,
        ctx: &Context<'_>,
        id: i64,
        input: UpdateListingInput,
    ) -> Result<ListingObject> {
        let state = app_state(ctx)?;
        let principal = principal(ctx)?;

        let listing = listing_service::update_listing(state, principal, id, input.into())
            .await
            .map_err(gql_error)?;

        Ok(listing.into())
    }

    async fn delete_listing(&self, ctx: &Context<'_>, id: i64) -> Result<Ack> {
        let state = app_state(ctx)?;
        let principal = principal(ctx)?;

        listing_service::delete_listing(state, principal, id)
            .await
            .map_err(gql_error)?;

        Ok(Ack {
            ok: true,
            message: format!("Listing {} deleted", id),
        })
    }
}
