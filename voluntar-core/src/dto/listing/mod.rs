//! Listing DTOs

use serde::{Deserialize, Serialize};

use crate::domain::listing::ListingKind;

/// Request to create a listing
///
/// `owner_email` may be omitted, in which case the listing belongs to the
/// caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateListing {
    pub title: String,
    #[serde(default, alias = "email")]
    pub owner_email: Option<String>,
    pub date: String,
    pub description: String,
    pub kind: ListingKind,
}

/// Partial update of a listing
///
/// Only fields that are present and non-empty are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateListing {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "email")]
    pub owner_email: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub kind: Option<ListingKind>,
}

impl UpdateListing {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.owner_email.is_none()
            && self.date.is_none()
            && self.description.is_none()
            && self.kind.is_none()
    }
}

/// Query string for filtering listings by kind
///
/// Kept as a raw string so a missing or malformed value can be reported
/// with a proper message instead of a generic extractor rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KindFilter {
    #[serde(default, alias = "tipo")]
    pub kind: Option<String>,
}
