//! Core domain types
//!
//! This module contains the domain structures used across Voluntar crates.
//! The server persists them, the client caches them and the CLI prints them.

pub mod event;
pub mod listing;
pub mod user;
