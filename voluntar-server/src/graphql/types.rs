//! GraphQL object and input types
//!
//! Thin wrappers over the core domain types so the core crate stays free of
//! GraphQL derives.

use async_graphql::{Enum, InputObject, SimpleObject};
use chrono::{DateTime, Utc};
use voluntar_core::domain::event::ListingEvent;
use voluntar_core::domain::listing::{Listing, ListingKind};
use voluntar_core::domain::user::{Role, User};
use voluntar_core::dto::listing::{CreateListing, UpdateListing};
use voluntar_core::dto::user::CreateUser;

#[derive(Enum, Copy, Clone, Debug, PartialEq, Eq)]
#[graphql(name = "Role")]
pub enum GqlRole {
    Admin,
    User,
}

impl From<Role> for GqlRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Admin => GqlRole::Admin,
            Role::User => GqlRole::User,
        }
    }
}

impl From<GqlRole> for Role {
    fn from(role: GqlRole) -> Self {
        match role {
            GqlRole::Admin => Role::Admin,
            GqlRole::User => Role::User,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, PartialEq, Eq)]
#[graphql(name = "ListingKind")]
pub enum GqlListingKind {
    Offer,
    Request,
}

impl From<ListingKind> for GqlListingKind {
    fn from(kind: ListingKind) -> Self {
        match kind {
            ListingKind::Offer => GqlListingKind::Offer,
            ListingKind::Request => GqlListingKind::Request,
        }
    }
}

impl From<GqlListingKind> for ListingKind {
    fn from(kind: GqlListingKind) -> Self {
        match kind {
            GqlListingKind::Offer => ListingKind::Offer,
            GqlListingKind::Request => ListingKind::Request,
        }
    }
}

#[derive(SimpleObject, Clone, Debug)]
#[graphql(name = "User")]
pub struct UserObject {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: GqlRole,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserObject {
    fn from(user: User) -> Self {
        UserObject {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role.into(),
            created_at: user.created_at,
        }
    }
}

#[derive(SimpleObject, Clone, Debug)]
#[graphql(name = "Listing")]
pub struct ListingObject {
    pub id: i64,
    pub title: String,
    pub owner_email: String,
    pub date: String,
    pub description: String,
    pub kind: GqlListingKind,
    pub created_at: DateTime<Utc>,
}

impl From<Listing> for ListingObject {
    fn from(listing: Listing) -> Self {
        ListingObject {
            id: listing.id,
            title: listing.title,
            owner_email: listing.owner_email,
            date: listing.date,
            description: listing.description,
            kind: listing.kind.into(),
            created_at: listing.created_at,
        }
    }
}

/// Outcome of a delete
#[derive(SimpleObject, Clone, Debug)]
pub struct Ack {
    pub ok: bool,
    pub message: String,
}

/// Outcome of a login; a failed login is reported here rather than as an error
#[derive(SimpleObject, Clone, Debug)]
pub struct LoginPayload {
    pub ok: bool,
    pub message: String,
    pub token: Option<String>,
    pub user: Option<UserObject>,
}

/// A broadcast listing change
#[derive(SimpleObject, Clone, Debug)]
#[graphql(name = "ListingEvent")]
pub struct ListingEventPayload {
    /// `listing_created`, `listing_updated` or `listing_deleted`
    pub event: String,
    pub id: i64,
    /// Absent for deletions
    pub listing: Option<ListingObject>,
}

impl ListingEventPayload {
    /// Listing changes only; connection greetings are not forwarded
    pub fn from_event(event: ListingEvent) -> Option<Self> {
        let name = event.name().to_string();
        match event {
            ListingEvent::ListingCreated(listing) | ListingEvent::ListingUpdated(listing) => {
                Some(ListingEventPayload {
                    event: name,
                    id: listing.id,
                    listing: Some(listing.into()),
                })
            }
            ListingEvent::ListingDeleted { id } => Some(ListingEventPayload {
                event: name,
                id,
                listing: None,
            }),
            ListingEvent::Welcome { .. } => None,
        }
    }
}

#[derive(InputObject, Clone, Debug)]
pub struct CreateUserInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<GqlRole>,
}

impl From<CreateUserInput> for CreateUser {
    fn from(input: CreateUserInput) -> Self {
        CreateUser {
            name: input.name,
            email: input.email,
            password: input.password,
            role: input.role.map(Into::into),
        }
    }
}

#[derive(InputObject, Clone, Debug)]
pub struct CreateListingInput {
    pub title: String,
    /// Defaults to the caller
    pub owner_email: Option<String>,
    pub date: String,
    pub description: String,
    pub kind: GqlListingKind,
}

impl From<CreateListingInput> for CreateListing {
    fn from(input: CreateListingInput) -> Self {
        CreateListing {
            title: input.title,
            owner_email: input.owner_email,
            date: input.date,
            description: input.description,
            kind: input.kind.into(),
        }
    }
}

#[derive(InputObject, Clone, Debug, Default)]
pub struct UpdateListingInput {
    pub title: Option<String>,
    pub owner_email: Option<String>,
    pub date: Option<String>,
    pub description: Option<String>,
    pub kind: Option<GqlListingKind>,
}

impl From<UpdateListingInput> for UpdateListing {
    fn from(input: UpdateListingInput) -> Self {
        UpdateListing {
            title: input.title,
            owner_email: input.owner_email,
            date: input.date,
            description: input.description,
            kind: input.kind.map(Into::into),
        }
    }
}
