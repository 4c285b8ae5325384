//! Listing operations

use serde_json::{Value, json};
use voluntar_core::domain::listing::{Listing, ListingKind};
use voluntar_core::dto::listing::{CreateListing, UpdateListing};

use crate::VoluntarClient;
use crate::error::Result;
use crate::users::Ack;

/// Cache key for the listing list
pub const LISTINGS_CACHE_KEY: &str = "listings_list";

const LISTING_FIELDS: &str =
    "id title owner_email: ownerEmail date description kind created_at: createdAt";

fn graphql_kind(kind: ListingKind) -> Value {
    json!(kind.as_str().to_uppercase())
}

fn create_input(req: &CreateListing) -> Value {
    let mut input = json!({
        "title": req.title,
        "date": req.date,
        "description": req.description,
        "kind": graphql_kind(req.kind),
    });
    if let Some(owner) = &req.owner_email {
        input["ownerEmail"] = json!(owner);
    }
    input
}

fn update_input(req: &UpdateListing) -> Value {
    let mut input = json!({});
    if let Some(title) = &req.title {
        input["title"] = json!(title);
    }
    if let Some(owner) = &req.owner_email {
        input["ownerEmail"] = json!(owner);
    }
    if let Some(date) = &req.date {
        input["date"] = json!(date);
    }
    if let Some(description) = &req.description {
        input["description"] = json!(description);
    }
    if let Some(kind) = req.kind {
        input["kind"] = graphql_kind(kind);
    }
    input
}

impl VoluntarClient {
    // =============================================================================
    // Public Board (REST)
    // =============================================================================

    /// Every listing, no token needed
    pub async fn board(&self) -> Result<Vec<Listing>> {
        let url = format!("{}/api/listings", self.base_url);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Every listing of one kind, no token needed
    pub async fn board_by_kind(&self, kind: ListingKind) -> Result<Vec<Listing>> {
        let url = format!("{}/api/listings/kind", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("kind", kind.as_str())])
            .send()
            .await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Scoped Listings (GraphQL)
    // =============================================================================

    /// Listings visible to the caller: all for an admin, their own otherwise (cached)
    pub async fn listings(&self) -> Result<Vec<Listing>> {
        self.require_token().await?;

        let query = format!("query {{ listings {{ {} }} }}", LISTING_FIELDS);

        self.cached(LISTINGS_CACHE_KEY, || {
            self.graphql(&query, json!({}), "listings")
        })
        .await
    }

    pub async fn listing(&self, id: i64) -> Result<Listing> {
        self.require_token().await?;

        let query = format!(
            "query Listing($id: Int!) {{ listing(id: $id) {{ {} }} }}",
            LISTING_FIELDS
        );

        self.graphql(&query, json!({ "id": id }), "listing").await
    }

    pub async fn listings_by_kind(&self, kind: ListingKind) -> Result<Vec<Listing>> {
        self.require_token().await?;

        let query = format!(
            "query ByKind($kind: String!) {{ listingsByKind(kind: $kind) {{ {} }} }}",
            LISTING_FIELDS
        );

        self.graphql(&query, json!({ "kind": kind.as_str() }), "listingsByKind")
            .await
    }

    pub async fn create_listing(&self, req: CreateListing) -> Result<Listing> {
        self.require_token().await?;

        let query = format!(
            "mutation Create($input: CreateListingInput!) {{ createListing(input: $input) {{ {} }} }}",
            LISTING_FIELDS
        );

        let listing = self
            .graphql(&query, json!({ "input": create_input(&req) }), "createListing")
            .await?;

        self.invalidate("listings").await;

        Ok(listing)
    }

    pub async fn update_listing(&self, id: i64, req: UpdateListing) -> Result<Listing> {
        self.require_token().await?;

        let query = format!(
            "mutation Update($id: Int!, $input: UpdateListingInput!) {{ \
             updateListing(id: $id, input: $input) {{ {} }} }}",
            LISTING_FIELDS
        );

        let listing = self
            .graphql(
                &query,
                json!({ "id": id, "input": update_input(&req) }),
                "updateListing",
            )
            .await?;

        self.invalidate("listings").await;

        Ok(listing)
    }

    pub async fn delete_listing(&self, id: i64) -> Result<String> {
        self.require_token().await?;

        let ack: Ack = self
            .graphql(
                "mutation Delete($id: Int!) { deleteListing(id: $id) { message } }",
                json!({ "id": id }),
                "deleteListing",
            )
            .await?;

        self.invalidate("listings").await;

        Ok(ack.message)
    }
}
