//! Listing domain model
//!
//! A listing is a volunteering ad: either something a user offers or
//! something a user requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A volunteering offer or request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: i64,
    pub title: String,
    /// Email of the user who owns the listing
    pub owner_email: String,
    /// Free-form date string as entered by the owner (e.g. "2025-10-24")
    pub date: String,
    pub description: String,
    pub kind: ListingKind,
    pub created_at: DateTime<Utc>,
}

impl Listing {
    pub fn is_owned_by(&self, email: &str) -> bool {
        self.owner_email == email
    }
}

/// Kind of listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ListingKind {
    Offer,
    Request,
}

impl ListingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingKind::Offer => "offer",
            ListingKind::Request => "request",
        }
    }
}

impl std::fmt::Display for ListingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "offer" | "oferta" => Ok(ListingKind::Offer),
            "request" | "petición" | "peticion" => Ok(ListingKind::Request),
            other => Err(format!(
                "unknown listing kind '{}' (expected offer or request)",
                other
            )),
        }
    }
}

impl TryFrom<String> for ListingKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
