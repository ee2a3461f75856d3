//! # NoteVault Shared Library
//!
//! Shared types and business logic used by the NoteVault API server.
//!
//! ## Module Organization
//!
//! - `models`: database models (tenants, users, notes)
//! - `auth`: authentication and authorization utilities
//! - `db`: connection pool and migrations
//! - `quota`: plan-based active-note limits

pub mod auth;
pub mod db;
pub mod models;
pub mod quota;

/// Current version of the NoteVault shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
