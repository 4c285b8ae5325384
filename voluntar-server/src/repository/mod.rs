//! Repository Module
//!
//! Data access layer for the server.
//!
//! Repositories are trait-based so the same services run against the
//! seeded in-memory store or against PostgreSQL.

pub mod listing;
pub mod memory;
pub mod user;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use voluntar_core::domain::listing::{Listing, ListingKind};
use voluntar_core::domain::user::{Role, User};

pub use listing::PgListingRepository;
pub use memory::MemoryStore;
pub use user::PgUserRepository;

/// Repository error type
#[derive(Debug)]
pub enum RepoError {
    /// A uniqueness constraint was violated
    Conflict(String),
    /// A stored value could not be mapped back to a domain type
    Corrupt(String),
    DatabaseError(sqlx::Error),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return RepoError::Conflict(db_err.message().to_string());
            }
        }
        RepoError::DatabaseError(err)
    }
}

impl std::fmt::Display for RepoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepoError::Conflict(msg) => write!(f, "conflict: {}", msg),
            RepoError::Corrupt(msg) => write!(f, "corrupt record: {}", msg),
            RepoError::DatabaseError(err) => write!(f, "database error: {}", err),
        }
    }
}

pub type RepoResult<T> = Result<T, RepoError>;

/// A user ready to be stored; the id is assigned by the repository
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// A listing ready to be stored; the id is assigned by the repository
#[derive(Debug, Clone)]
pub struct NewListing {
    pub title: String,
    pub owner_email: String,
    pub date: String,
    pub description: String,
    pub kind: ListingKind,
    pub created_at: DateTime<Utc>,
}

/// Normalized set of listing fields to overwrite
#[derive(Debug, Clone, Default)]
pub struct ListingChanges {
    pub title: Option<String>,
    pub owner_email: Option<String>,
    pub date: Option<String>,
    pub description: Option<String>,
    pub kind: Option<ListingKind>,
}

impl ListingChanges {
    pub(crate) fn apply(self, listing: &mut Listing) {
        if let Some(title) = self.title {
            listing.title = title;
        }
        if let Some(owner_email) = self.owner_email {
            listing.owner_email = owner_email;
        }
        if let Some(date) = self.date {
            listing.date = date;
        }
        if let Some(description) = self.description {
            listing.description = description;
        }
        if let Some(kind) = self.kind {
            listing.kind = kind;
        }
    }
}

/// Filter applied when listing listings; `None` fields match everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFilter {
    pub owner_email: Option<String>,
    pub kind: Option<ListingKind>,
}

impl ListingFilter {
    pub fn owned_by(email: impl Into<String>) -> Self {
        Self {
            owner_email: Some(email.into()),
            kind: None,
        }
    }

    pub fn with_kind(mut self, kind: ListingKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn matches(&self, listing: &Listing) -> bool {
        self.owner_email
            .as_deref()
            .is_none_or(|email| listing.owner_email == email)
            && self.kind.is_none_or(|kind| listing.kind == kind)
    }
}

/// Storage operations for users
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Stores a user under the next sequential id
    ///
    /// Fails with `RepoError::Conflict` when the email is already registered.
    async fn create(&self, user: NewUser) -> RepoResult<User>;

    /// Finds a user by exact email
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;

    /// Finds a user by email ignoring ASCII case
    async fn find_by_email_ci(&self, email: &str) -> RepoResult<Option<User>>;

    /// Lists every user ordered by id
    async fn list_all(&self) -> RepoResult<Vec<User>>;

    /// Deletes a user by exact email, returning whether a row was removed
    async fn delete_by_email(&self, email: &str) -> RepoResult<bool>;
}

/// Storage operations for listings
#[async_trait]
pub trait ListingRepository: Send + Sync {
    /// Stores a listing under the next sequential id
    async fn create(&self, listing: NewListing) -> RepoResult<Listing>;

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<Listing>>;

    /// Lists listings matching the filter ordered by id
    async fn list(&self, filter: &ListingFilter) -> RepoResult<Vec<Listing>>;

    /// Applies the changes and returns the updated listing, or `None` if absent
    async fn update(&self, id: i64, changes: ListingChanges) -> RepoResult<Option<Listing>>;

    /// Deletes a listing, returning whether a row was removed
    async fn delete(&self, id: i64) -> RepoResult<bool>;
}

/// The pair of repositories the services work against
#[derive(Clone)]
pub struct Store {
    pub users: Arc<dyn UserRepository>,
    pub listings: Arc<dyn ListingRepository>,
}

impl Store {
    pub fn memory(store: MemoryStore) -> Self {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            listings: store,
        }
    }

    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            listings: Arc::new(PgListingRepository::new(pool)),
        }
    }
}

/// Next id after the current maximum
pub(crate) fn next_id(ids: impl Iterator<Item = i64>) -> i64 {
    ids.max().unwrap_or(0) + 1
}
