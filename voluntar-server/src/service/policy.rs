//! Authorization Policy
//!
//! The one place the access rules live. REST handlers and GraphQL resolvers
//! both go through these checks:
//!
//! - admins see every user and every listing
//! - a regular user sees their own account and their own listings
//! - only the owner or an admin may change or delete a listing
//! - the public board of listings is readable without a token

use voluntar_core::domain::listing::Listing;
use voluntar_core::domain::user::Role;

use crate::service::auth::Claims;

/// The authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Principal {
            id: claims.sub,
            email: claims.email,
            name: claims.name,
            role: claims.role,
        }
    }
}

/// Policy error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    Unauthenticated,
    Forbidden(String),
}

impl std::fmt::Display for PolicyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyError::Unauthenticated => write!(f, "not authenticated, log in first"),
            PolicyError::Forbidden(msg) => write!(f, "{}", msg),
        }
    }
}

/// Which listings a caller may see outside the public board
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingScope {
    All,
    Owner(String),
}

pub fn require_authenticated(principal: Option<&Principal>) -> Result<&Principal, PolicyError> {
    principal.ok_or(PolicyError::Unauthenticated)
}

pub fn require_admin(principal: &Principal) -> Result<(), PolicyError> {
    if principal.is_admin() {
        Ok(())
    } else {
        tracing::info!("Access denied: {} requested an admin resource", principal.email);
        Err(PolicyError::Forbidden(
            "access denied, admin role required".to_string(),
        ))
    }
}

pub fn listing_scope(principal: &Principal) -> ListingScope {
    if principal.is_admin() {
        ListingScope::All
    } else {
        ListingScope::Owner(principal.email.clone())
    }
}

pub fn ensure_can_view_listing(principal: &Principal, listing: &Listing) -> Result<(), PolicyError> {
    if principal.is_admin() || listing.is_owned_by(&principal.email) {
        Ok(())
    } else {
        Err(PolicyError::Forbidden(
            "you cannot view listings of other users".to_string(),
        ))
    }
}

pub fn ensure_can_mutate_listing(
    principal: &Principal,
    listing: &Listing,
) -> Result<(), PolicyError> {
    if principal.is_admin() || listing.is_owned_by(&principal.email) {
        Ok(())
    } else {
        tracing::info!(
            "Access denied: {} tried to modify listing {} owned by {}",
            principal.email,
            listing.id,
            listing.owner_email
        );
        Err(PolicyError::Forbidden(
            "you cannot modify listings of other users".to_string(),
        ))
    }
}

pub fn ensure_can_view_user(principal: &Principal, email: &str) -> Result<(), PolicyError> {
    if principal.is_admin() || principal.email == email {
        Ok(())
    } else {
        Err(PolicyError::Forbidden(
            "you cannot view other users".to_string(),
        ))
    }
}

/// A regular user may only act on resources under their own email
pub fn ensure_can_act_for(principal: &Principal, owner_email: &str) -> Result<(), PolicyError> {
    if principal.is_admin() || principal.email == owner_email {
        Ok(())
    } else {
        Err(PolicyError::Forbidden(
            "you cannot act on behalf of other users".to_string(),
        ))
    }
}

/// Only an admin may hand out the admin role
pub fn ensure_can_grant_role(actor: Option<&Principal>, role: Role) -> Result<(), PolicyError> {
    match (role, actor) {
        (Role::User, _) => Ok(()),
        (Role::Admin, Some(actor)) if actor.is_admin() => Ok(()),
        (Role::Admin, _) => Err(PolicyError::Forbidden(
            "only an admin can create admin accounts".to_string(),
        )),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;
    use voluntar_core::domain::listing::ListingKind;

    pub(crate) fn admin() -> Principal {
        Principal {
            id: 1,
            email: "L@A.U".to_string(),
            name: "LAURA".to_string(),
            role: Role::Admin,
        }
    }

    pub(crate) fn user(email: &str) -> Principal {
        Principal {
            id: 2,
            email: email.to_string(),
            name: "MARCOS".to_string(),
            role: Role::User,
        }
    }

    fn listing_of(owner: &str) -> Listing {
        Listing {
            id: 9,
            title: "T".to_string(),
            owner_email: owner.to_string(),
            date: "2025-01-01".to_string(),
            description: "D".to_string(),
            kind: ListingKind::Offer,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_admin_sees_all() {
        assert_eq!(listing_scope(&admin()), ListingScope::All);
        assert!(ensure_can_view_listing(&admin(), &listing_of("M@R.C")).is_ok());
        assert!(ensure_can_view_user(&admin(), "M@R.C").is_ok());
    }

    #[test]
    fn test_owner_sees_own() {
        let marcos = user("M@R.C");
        assert_eq!(
            listing_scope(&marcos),
            ListingScope::Owner("M@R.C".to_string())
        );
        assert!(ensure_can_view_listing(&marcos, &listing_of("M@R.C")).is_ok());
        assert!(ensure_can_view_listing(&marcos, &listing_of("S@O.N")).is_err());
        assert!(ensure_can_view_user(&marcos, "S@O.N").is_err());
    }

    #[test]
    fn test_owner_or_admin_mutates() {
        let marcos = user("M@R.C");
        assert!(ensure_can_mutate_listing(&marcos, &listing_of("M@R.C")).is_ok());
        assert!(ensure_can_mutate_listing(&admin(), &listing_of("M@R.C")).is_ok());
        assert!(matches!(
            ensure_can_mutate_listing(&marcos, &listing_of("S@O.N")),
            Err(PolicyError::Forbidden(_))
        ));
    }

    #[test]
    fn test_authentication_and_admin_requirements() {
        assert_eq!(
            require_authenticated(None),
            Err(PolicyError::Unauthenticated)
        );
        assert!(require_admin(&user("M@R.C")).is_err());
        assert!(require_admin(&admin()).is_ok());
    }

    #[test]
    fn test_role_granting() {
        assert!(ensure_can_grant_role(None, Role::User).is_ok());
        assert!(ensure_can_grant_role(None, Role::Admin).is_err());
        assert!(ensure_can_grant_role(Some(&user("M@R.C")), Role::Admin).is_err());
        assert!(ensure_can_grant_role(Some(&admin()), Role::Admin).is_ok());
    }
}
