//! In-memory store
//!
//! Keeps users and listings in `RwLock`-guarded vectors. Nothing survives
//! a restart. Used when no database is configured and by the tests.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use voluntar_core::domain::listing::{Listing, ListingKind};
use voluntar_core::domain::user::{Role, User};

use super::{
    ListingChanges, ListingFilter, ListingRepository, NewListing, NewUser, RepoError, RepoResult,
    UserRepository, next_id,
};

/// Password shared by every seeded account
pub const SEED_PASSWORD: &str = "123";

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    listings: RwLock<Vec<Listing>>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding three demo accounts and three listings
    ///
    /// `password_hash` is the stored hash of [`SEED_PASSWORD`].
    pub fn seeded(password_hash: &str) -> Self {
        let now = Utc::now();

        let user = |id: i64, name: &str, email: &str, role: Role| User {
            id,
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role,
            created_at: now,
        };

        let listing = |id: i64, title: &str, owner: &str, date: &str, description: &str, kind| {
            Listing {
                id,
                title: title.to_string(),
                owner_email: owner.to_string(),
                date: date.to_string(),
                description: description.to_string(),
                kind,
                created_at: now,
            }
        };

        let users = vec![
            user(1, "LAURA", "L@A.U", Role::Admin),
            user(2, "MARCOS", "M@R.C", Role::User),
            user(3, "SONIA", "S@O.N", Role::User),
        ];

        let listings = vec![
            listing(
                1,
                "OFFERING MEDICINE",
                "L@A.U",
                "2025-10-24",
                "VITAMIN SUPPLEMENTS FOR SICK ANIMALS",
                ListingKind::Offer,
            ),
            listing(
                2,
                "NEED A SHELTER",
                "M@R.C",
                "2025-10-27",
                "FOUR KITTENS UP FOR ADOPTION",
                ListingKind::Request,
            ),
            listing(
                3,
                "NEED A VEHICLE",
                "S@O.N",
                "2025-10-28",
                "NEED A VEHICLE TO MOVE A HORSE",
                ListingKind::Request,
            ),
        ];

        Self {
            users: RwLock::new(users),
            listings: RwLock::new(listings),
        }
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: NewUser) -> RepoResult<User> {
        let mut users = self.users.write().await;

        if users.iter().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(RepoError::Conflict(format!(
                "email {} is already registered",
                user.email
            )));
        }

        let user = User {
            id: next_id(users.iter().map(|u| u.id)),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: user.created_at,
        };
        users.push(user.clone());

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_email_ci(&self, email: &str) -> RepoResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list_all(&self) -> RepoResult<Vec<User>> {
        let mut users = self.users.read().await.clone();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    async fn delete_by_email(&self, email: &str) -> RepoResult<bool> {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|u| u.email != email);
        Ok(users.len() < before)
    }
}

#[async_trait]
impl ListingRepository for MemoryStore {
    async fn create(&self, listing: NewListing) -> RepoResult<Listing> {
        let mut listings = self.listings.write().await;

        let listing = Listing {
            id: next_id(listings.iter().map(|l| l.id)),
            title: listing.title,
            owner_email: listing.owner_email,
            date: listing.date,
            description: listing.description,
            kind: listing.kind,
            created_at: listing.created_at,
        };
        listings.push(listing.clone());

        Ok(listing)
    }

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<Listing>> {
        let listings = self.listings.read().await;
        Ok(listings.iter().find(|l| l.id == id).cloned())
    }

    async fn list(&self, filter: &ListingFilter) -> RepoResult<Vec<Listing>> {
        let listings = self.listings.read().await;
        let mut matching: Vec<Listing> = listings
            .iter()
            .filter(|l| filter.matches(l))
            .cloned()
            .collect();
        matching.sort_by_key(|l| l.id);
        Ok(matching)
    }

    async fn update(&self, id: i64, changes: ListingChanges) -> RepoResult<Option<Listing>> {
        let mut listings = self.listings.write().await;

        let Some(listing) = listings.iter_mut().find(|l| l.id == id) else {
            return Ok(None);
        };
        changes.apply(listing);

        Ok(Some(listing.clone()))
    }

    async fn delete(&self, id: i64) -> RepoResult<bool> {
        let mut listings = self.listings.write().await;
        let before = listings.len();
        listings.retain(|l| l.id != id);
        Ok(listings.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "ANA".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            role: Role::User,
            created_at: Utc::now(),
        }
    }

    fn new_listing(owner: &str, kind: ListingKind) -> NewListing {
        NewListing {
            title: "HELP".to_string(),
            owner_email: owner.to_string(),
            date: "2025-11-01".to_string(),
            description: "SOME HELP".to_string(),
            kind,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_user_ids_follow_current_maximum() {
        let store = MemoryStore::seeded("hash");

        let user = UserRepository::create(&store, new_user("a@n.a")).await.unwrap();
        assert_eq!(user.id, 4);

        assert!(store.delete_by_email("a@n.a").await.unwrap());
        let again = UserRepository::create(&store, new_user("b@n.a")).await.unwrap();
        assert_eq!(again.id, 4);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_a_conflict() {
        let store = MemoryStore::seeded("hash");

        let result = UserRepository::create(&store, new_user("L@A.U")).await;
        assert!(matches!(result, Err(RepoError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_duplicate_email_ignores_case() {
        let store = MemoryStore::seeded("hash");

        let result = UserRepository::create(&store, new_user("l@a.u")).await;
        assert!(matches!(result, Err(RepoError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_case_insensitive_lookup() {
        let store = MemoryStore::seeded("hash");

        assert!(store.find_by_email("l@a.u").await.unwrap().is_none());
        let found = store.find_by_email_ci("l@a.u").await.unwrap().unwrap();
        assert_eq!(found.name, "LAURA");
    }

    #[tokio::test]
    async fn test_empty_store_starts_ids_at_one() {
        let store = MemoryStore::new();

        let listing = ListingRepository::create(&store, new_listing("x@y.z", ListingKind::Offer))
            .await
            .unwrap();
        assert_eq!(listing.id, 1);
    }

    #[tokio::test]
    async fn test_list_filters_by_owner_and_kind() {
        let store = MemoryStore::seeded("hash");
        ListingRepository::create(&store, new_listing("M@R.C", ListingKind::Offer))
            .await
            .unwrap();

        let all = store.list(&ListingFilter::default()).await.unwrap();
        assert_eq!(all.len(), 4);

        let requests = store
            .list(&ListingFilter::default().with_kind(ListingKind::Request))
            .await
            .unwrap();
        assert_eq!(requests.len(), 2);

        let marcos_offers = store
            .list(&ListingFilter::owned_by("M@R.C").with_kind(ListingKind::Offer))
            .await
            .unwrap();
        assert_eq!(marcos_offers.len(), 1);
        assert_eq!(marcos_offers[0].id, 4);
    }

    #[tokio::test]
    async fn test_update_applies_only_given_fields() {
        let store = MemoryStore::seeded("hash");

        let changes = ListingChanges {
            title: Some("NEW TITLE".to_string()),
            ..Default::default()
        };
        let updated = store.update(2, changes).await.unwrap().unwrap();

        assert_eq!(updated.title, "NEW TITLE");
        assert_eq!(updated.description, "FOUR KITTENS UP FOR ADOPTION");
        assert_eq!(updated.kind, ListingKind::Request);

        assert!(store.update(99, ListingChanges::default()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_listing() {
        let store = MemoryStore::seeded("hash");

        assert!(ListingRepository::delete(&store, 1).await.unwrap());
        assert!(!ListingRepository::delete(&store, 1).await.unwrap());
        assert!(store.find_by_id(1).await.unwrap().is_none());
    }
}
