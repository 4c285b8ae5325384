//! Voluntar Core
//!
//! Core types shared by the Voluntar server, client and CLI.
//!
//! This crate contains:
//! - Domain types: Users, volunteering listings and the events broadcast when they change
//! - DTOs: Request and response payloads exchanged over REST and GraphQL

pub mod domain;
pub mod dto;
