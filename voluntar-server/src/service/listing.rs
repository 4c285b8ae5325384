//! Listing Service
//!
//! Business logic for volunteering listings. Every successful mutation is
//! broadcast on the event bus.

use chrono::Utc;
use voluntar_core::domain::event::ListingEvent;
use voluntar_core::domain::listing::{Listing, ListingKind};
use voluntar_core::dto::listing::{CreateListing, UpdateListing};

use crate::repository::{ListingChanges, ListingFilter, NewListing, RepoError};
use crate::service::policy::{self, ListingScope, PolicyError, Principal};
use crate::service::user::is_valid_email;
use crate::state::AppState;

/// Service error type
#[derive(Debug)]
pub enum ListingError {
    NotFound(i64),
    ValidationError(String),
    Policy(PolicyError),
    Repository(RepoError),
}

impl From<RepoError> for ListingError {
    fn from(err: RepoError) -> Self {
        ListingError::Repository(err)
    }
}

impl From<PolicyError> for ListingError {
    fn from(err: PolicyError) -> Self {
        ListingError::Policy(err)
    }
}

pub type Result<T> = std::result::Result<T, ListingError>;

// =============================================================================
// Public Board
// =============================================================================

/// List every listing
pub async fn list_public(state: &AppState) -> Result<Vec<Listing>> {
    Ok(state.store.listings.list(&ListingFilter::default()).await?)
}

/// List every listing of the given kind
pub async fn list_public_by_kind(state: &AppState, kind: ListingKind) -> Result<Vec<Listing>> {
    let filter = ListingFilter::default().with_kind(kind);
    Ok(state.store.listings.list(&filter).await?)
}

/// Get a listing by ID
pub async fn get_public(state: &AppState, id: i64) -> Result<Listing> {
    state
        .store
        .listings
        .find_by_id(id)
        .await?
        .ok_or(ListingError::NotFound(id))
}

// =============================================================================
// Scoped Views
// =============================================================================

/// List the listings the caller manages: all for an admin, their own otherwise
pub async fn list_for(
    state: &AppState,
    principal: &Principal,
    kind: Option<ListingKind>,
) -> Result<Vec<Listing>> {
    let mut filter = match policy::listing_scope(principal) {
        ListingScope::All => ListingFilter::default(),
        ListingScope::Owner(email) => ListingFilter::owned_by(email),
    };
    filter.kind = kind;

    let listings = state.store.listings.list(&filter).await?;
    tracing::debug!(
        "{} listing(s) visible to {} ({})",
        listings.len(),
        principal.email,
        principal.role
    );

    Ok(listings)
}

/// Get a listing the caller owns (or any listing for an admin)
pub async fn get_for(state: &AppState, principal: &Principal, id: i64) -> Result<Listing> {
    let listing = get_public(state, id).await?;
    policy::ensure_can_view_listing(principal, &listing)?;
    Ok(listing)
}

// =============================================================================
// Mutations
// =============================================================================

/// Create a listing owned by the caller, or by `owner_email` when an admin asks
pub async fn create_listing(
    state: &AppState,
    principal: &Principal,
    req: CreateListing,
) -> Result<Listing> {
    let owner_email = req
        .owner_email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .unwrap_or(&principal.email)
        .to_string();

    policy::ensure_can_act_for(principal, &owner_email)?;

    let new_listing = NewListing {
        title: normalize_text(&req.title),
        owner_email,
        date: req.date.trim().to_string(),
        description: normalize_text(&req.description),
        kind: req.kind,
        created_at: Utc::now(),
    };
    validate_new_listing(&new_listing)?;

    let listing = state.store.listings.create(new_listing).await?;

    tracing::info!(
        "Listing created: {} ({}) by {}",
        listing.title,
        listing.id,
        principal.email
    );
    state
        .events
        .publish(ListingEvent::ListingCreated(listing.clone()));

    Ok(listing)
}

/// Apply a partial update (owner or admin)
///
/// Empty strings count as "not provided". A request that changes nothing
/// returns the listing as stored without broadcasting.
pub async fn update_listing(
    state: &AppState,
    principal: &Principal,
    id: i64,
    req: UpdateListing,
) -> Result<Listing> {
    let existing = get_public(state, id).await?;
    policy::ensure_can_mutate_listing(principal, &existing)?;

    let changes = normalize_changes(req);
    validate_changes(&changes)?;

    if let Some(owner_email) = &changes.owner_email {
        policy::ensure_can_act_for(principal, owner_email)?;
    }

    if is_noop(&changes) {
        return Ok(existing);
    }

    let listing = state
        .store
        .listings
        .update(id, changes)
        .await?
        .ok_or(ListingError::NotFound(id))?;

    tracing::info!("Listing updated: {} by {}", id, principal.email);
    state
        .events
        .publish(ListingEvent::ListingUpdated(listing.clone()));

    Ok(listing)
}

/// Delete a listing (owner or admin)
pub async fn delete_listing(state: &AppState, principal: &Principal, id: i64) -> Result<()> {
    let existing = get_public(state, id).await?;
    policy::ensure_can_mutate_listing(principal, &existing)?;

    let deleted = state.store.listings.delete(id).await?;

    if !deleted {
        return Err(ListingError::NotFound(id));
    }

    tracing::info!("Listing deleted: {} by {}", id, principal.email);
    state.events.publish(ListingEvent::ListingDeleted { id });

    Ok(())
}

/// Parse a kind filter coming from a query string or GraphQL argument
pub fn parse_kind(raw: Option<&str>) -> Result<ListingKind> {
    let raw = raw.map(str::trim).filter(|k| !k.is_empty()).ok_or_else(|| {
        ListingError::ValidationError("a kind is required (offer or request)".to_string())
    })?;

    raw.parse().map_err(ListingError::ValidationError)
}

// =============================================================================
// Validation
// =============================================================================

fn normalize_text(value: &str) -> String {
    value.trim().to_uppercase()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn normalize_changes(req: UpdateListing) -> ListingChanges {
    ListingChanges {
        title: non_empty(req.title).map(|t| t.to_uppercase()),
        owner_email: non_empty(req.owner_email),
        date: non_empty(req.date),
        description: non_empty(req.description).map(|d| d.to_uppercase()),
        kind: req.kind,
    }
}

fn is_noop(changes: &ListingChanges) -> bool {
    changes.title.is_none()
        && changes.owner_email.is_none()
        && changes.date.is_none()
        && changes.description.is_none()
        && changes.kind.is_none()
}

// Column widths of the listings table
const MAX_TITLE_LEN: usize = 255;
const MAX_EMAIL_LEN: usize = 255;
const MAX_DATE_LEN: usize = 64;

fn check_length(field: &str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(ListingError::ValidationError(format!(
            "{} is too long (max {} characters)",
            field, max
        )));
    }

    Ok(())
}

fn check_owner_email(owner_email: &str) -> Result<()> {
    if !is_valid_email(owner_email) {
        return Err(ListingError::ValidationError(format!(
            "invalid owner email '{}'",
            owner_email
        )));
    }

    check_length("owner email", owner_email, MAX_EMAIL_LEN)
}

fn validate_new_listing(listing: &NewListing) -> Result<()> {
    if listing.title.is_empty() {
        return Err(ListingError::ValidationError(
            "title cannot be empty".to_string(),
        ));
    }
    check_length("title", &listing.title, MAX_TITLE_LEN)?;

    if listing.date.is_empty() {
        return Err(ListingError::ValidationError(
            "date cannot be empty".to_string(),
        ));
    }
    check_length("date", &listing.date, MAX_DATE_LEN)?;

    if listing.description.is_empty() {
        return Err(ListingError::ValidationError(
            "description cannot be empty".to_string(),
        ));
    }

    check_owner_email(&listing.owner_email)
}

/// Fields left out of an update are not checked
fn validate_changes(changes: &ListingChanges) -> Result<()> {
    if let Some(title) = &changes.title {
        check_length("title", title, MAX_TITLE_LEN)?;
    }

    if let Some(date) = &changes.date {
        check_length("date", date, MAX_DATE_LEN)?;
    }

    if let Some(owner_email) = &changes.owner_email {
        check_owner_email(owner_email)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::policy::tests::{admin, user};
    use crate::state::test_support::seeded_state;

    fn create_req(owner: Option<&str>) -> CreateListing {
        CreateListing {
            title: "  dog walking ".to_string(),
            owner_email: owner.map(str::to_string),
            date: "2025-11-02".to_string(),
            description: "walk two dogs on sunday".to_string(),
            kind: ListingKind::Offer,
        }
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!(parse_kind(Some("Oferta")).unwrap(), ListingKind::Offer);
        assert!(matches!(
            parse_kind(None),
            Err(ListingError::ValidationError(_))
        ));
        assert!(matches!(
            parse_kind(Some("  ")),
            Err(ListingError::ValidationError(_))
        ));
        assert!(matches!(
            parse_kind(Some("gift")),
            Err(ListingError::ValidationError(_))
        ));
    }

    #[test]
    fn test_normalize_changes_drops_empty_fields() {
        let changes = normalize_changes(UpdateListing {
            title: Some("  ".to_string()),
            description: Some("new text".to_string()),
            ..Default::default()
        });

        assert!(changes.title.is_none());
        assert_eq!(changes.description.as_deref(), Some("NEW TEXT"));
        assert!(!is_noop(&changes));
    }

    #[tokio::test]
    async fn test_create_defaults_owner_and_broadcasts() {
        let state = seeded_state().await;
        let mut events = state.events.subscribe();

        let listing = create_listing(&state, &user("M@R.C"), create_req(None))
            .await
            .unwrap();

        assert_eq!(listing.id, 4);
        assert_eq!(listing.owner_email, "M@R.C");
        assert_eq!(listing.title, "DOG WALKING");
        assert_eq!(listing.description, "WALK TWO DOGS ON SUNDAY");
        assert_eq!(
            events.recv().await.unwrap(),
            ListingEvent::ListingCreated(listing)
        );
    }

    #[tokio::test]
    async fn test_user_cannot_create_for_someone_else() {
        let state = seeded_state().await;

        let result = create_listing(&state, &user("M@R.C"), create_req(Some("S@O.N"))).await;
        assert!(matches!(result, Err(ListingError::Policy(_))));

        let by_admin = create_listing(&state, &admin(), create_req(Some("S@O.N")))
            .await
            .unwrap();
        assert_eq!(by_admin.owner_email, "S@O.N");
    }

    #[tokio::test]
    async fn test_create_rejects_blank_fields() {
        let state = seeded_state().await;
        let mut req = create_req(None);
        req.description = "   ".to_string();

        let result = create_listing(&state, &user("M@R.C"), req).await;
        assert!(matches!(result, Err(ListingError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_oversized_fields() {
        let state = seeded_state().await;

        let mut req = create_req(None);
        req.date = "x".repeat(65);
        let result = create_listing(&state, &user("M@R.C"), req).await;
        assert!(matches!(result, Err(ListingError::ValidationError(msg)) if msg.contains("date")));

        let mut req = create_req(Some(&format!("{}@x.io", "a".repeat(260))));
        req.date = "x".repeat(64);
        let result = create_listing(&state, &admin(), req).await;
        assert!(
            matches!(result, Err(ListingError::ValidationError(msg)) if msg.contains("owner email"))
        );
    }

    #[tokio::test]
    async fn test_update_rejects_oversized_fields() {
        let state = seeded_state().await;
        let mut events = state.events.subscribe();

        for changes in [
            UpdateListing {
                title: Some("t".repeat(256)),
                ..Default::default()
            },
            UpdateListing {
                date: Some("d".repeat(65)),
                ..Default::default()
            },
            UpdateListing {
                owner_email: Some(format!("{}@x.io", "a".repeat(260))),
                ..Default::default()
            },
        ] {
            let result = update_listing(&state, &admin(), 2, changes).await;
            assert!(matches!(result, Err(ListingError::ValidationError(_))));
        }

        let unchanged = get_public(&state, 2).await.unwrap();
        assert_eq!(unchanged.description, "FOUR KITTENS UP FOR ADOPTION");
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_scoped_listing_views() {
        let state = seeded_state().await;

        assert_eq!(list_for(&state, &admin(), None).await.unwrap().len(), 3);

        let own = list_for(&state, &user("M@R.C"), None).await.unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].owner_email, "M@R.C");

        let own_offers = list_for(&state, &user("M@R.C"), Some(ListingKind::Offer))
            .await
            .unwrap();
        assert!(own_offers.is_empty());

        assert!(get_for(&state, &user("M@R.C"), 2).await.is_ok());
        assert!(matches!(
            get_for(&state, &user("M@R.C"), 3).await,
            Err(ListingError::Policy(_))
        ));
    }

    #[tokio::test]
    async fn test_public_board_sees_everything() {
        let state = seeded_state().await;

        assert_eq!(list_public(&state).await.unwrap().len(), 3);
        assert_eq!(
            list_public_by_kind(&state, ListingKind::Request)
                .await
                .unwrap()
                .len(),
            2
        );
        assert!(matches!(
            get_public(&state, 42).await,
            Err(ListingError::NotFound(42))
        ));
    }

    #[tokio::test]
    async fn test_update_by_owner() {
        let state = seeded_state().await;
        let mut events = state.events.subscribe();

        let updated = update_listing(
            &state,
            &user("M@R.C"),
            2,
            UpdateListing {
                title: Some("shelter found".to_string()),
                kind: Some(ListingKind::Offer),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.title, "SHELTER FOUND");
        assert_eq!(updated.kind, ListingKind::Offer);
        assert_eq!(updated.description, "FOUR KITTENS UP FOR ADOPTION");
        assert_eq!(
            events.recv().await.unwrap(),
            ListingEvent::ListingUpdated(updated)
        );
    }

    #[tokio::test]
    async fn test_update_rules() {
        let state = seeded_state().await;

        let other_owner = update_listing(&state, &user("M@R.C"), 3, UpdateListing::default()).await;
        assert!(matches!(other_owner, Err(ListingError::Policy(_))));

        let hand_over = update_listing(
            &state,
            &user("M@R.C"),
            2,
            UpdateListing {
                owner_email: Some("S@O.N".to_string()),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(hand_over, Err(ListingError::Policy(_))));

        let missing = update_listing(&state, &admin(), 99, UpdateListing::default()).await;
        assert!(matches!(missing, Err(ListingError::NotFound(99))));
    }

    #[tokio::test]
    async fn test_noop_update_does_not_broadcast() {
        let state = seeded_state().await;
        let mut events = state.events.subscribe();

        let unchanged = update_listing(&state, &admin(), 1, UpdateListing::default())
            .await
            .unwrap();

        assert_eq!(unchanged.title, "OFFERING MEDICINE");
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_delete_rules() {
        let state = seeded_state().await;
        let mut events = state.events.subscribe();

        let denied = delete_listing(&state, &user("M@R.C"), 3).await;
        assert!(matches!(denied, Err(ListingError::Policy(_))));

        delete_listing(&state, &user("S@O.N"), 3).await.unwrap();
        assert_eq!(
            events.recv().await.unwrap(),
            ListingEvent::ListingDeleted { id: 3 }
        );

        let gone = delete_listing(&state, &admin(), 3).await;
        assert!(matches!(gone, Err(ListingError::NotFound(3))));
    }
}
