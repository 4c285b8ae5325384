//! GraphQL Module
//!
//! Schema, HTTP handlers and error mapping for the `/graphql` surface.
//! Resolvers call the same services as the REST handlers.

pub mod mutation;
pub mod query;
pub mod subscription;
pub mod types;

use async_graphql::{Context, ErrorExtensions, Schema, http::GraphiQLSource};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    Extension,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{Html, IntoResponse},
};

use crate::api::error::ApiError;
use crate::service::auth::extract_bearer;
use crate::service::policy::{self, Principal};
use crate::state::AppState;

pub use mutation::MutationRoot;
pub use query::QueryRoot;
pub use subscription::SubscriptionRoot;

pub type VoluntarSchema = Schema<QueryRoot, MutationRoot, SubscriptionRoot>;

pub fn build_schema(state: AppState) -> VoluntarSchema {
    Schema::build(QueryRoot, MutationRoot, SubscriptionRoot)
        .data(state)
        .finish()
}

/// POST /graphql
///
/// A valid bearer token attaches a [`Principal`] to the request. An invalid
/// one is ignored and the request runs anonymously.
pub async fn graphql_handler(
    State(state): State<AppState>,
    Extension(schema): Extension<VoluntarSchema>,
    headers: HeaderMap,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let mut request = req.into_inner();

    let header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    if let Some(token) = extract_bearer(header) {
        match state.tokens.verify(token) {
            Ok(claims) => request = request.data(Principal::from(claims)),
            Err(err) => tracing::debug!("Ignoring GraphQL token: {}", err),
        }
    }

    schema.execute(request).await.into()
}

/// GET /graphql
pub async fn graphiql() -> impl IntoResponse {
    Html(
        GraphiQLSource::build()
            .endpoint("/graphql")
            .subscription_endpoint("/graphql/ws")
            .finish(),
    )
}

// =============================================================================
// Resolver helpers
// =============================================================================

pub(crate) fn app_state<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a AppState> {
    ctx.data::<AppState>()
}

/// The caller, or an `UNAUTHENTICATED` error
pub(crate) fn principal<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a Principal> {
    policy::require_authenticated(ctx.data_opt::<Principal>()).map_err(gql_error)
}

/// Maps any service error onto a GraphQL error with a `code` extension
pub(crate) fn gql_error(err: impl Into<ApiError>) -> async_graphql::Error {
    let err = err.into();
    let code = match err.status() {
        StatusCode::BAD_REQUEST => "BAD_REQUEST",
        StatusCode::UNAUTHORIZED => "UNAUTHENTICATED",
        StatusCode::FORBIDDEN => "FORBIDDEN",
        StatusCode::NOT_FOUND => "NOT_FOUND",
        StatusCode::CONFLICT => "CONFLICT",
        _ => "INTERNAL_SERVER_ERROR",
    };

    if code == "INTERNAL_SERVER_ERROR" {
        tracing::error!("GraphQL resolver failed: {:?}", err);
    }

    async_graphql::Error::new(err.to_string()).extend_with(|_, ext| ext.set("code", code))
}
