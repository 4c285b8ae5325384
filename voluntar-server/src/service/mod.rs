//! Service Module
//!
//! Business logic layer for the server.
//! Services validate input, apply the authorization policy and orchestrate
//! the repositories. REST handlers and GraphQL resolvers both call into here.

pub mod auth;
pub mod listing;
pub mod policy;
pub mod user;

// Re-export for convenience
pub use listing as listing_service;
pub use user as user_service;
