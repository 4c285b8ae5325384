//! Data Transfer Objects
//!
//! Request and response payloads shared by the server surfaces and the
//! client. DTOs never carry password hashes.

pub mod listing;
pub mod user;
