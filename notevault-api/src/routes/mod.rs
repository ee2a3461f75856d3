/// API route handlers
///
/// Organized by resource:
///
/// - `health`: health check endpoints
/// - `auth`: register, login, current user, profile, logout
/// - `users`: admin user invites
/// - `notes`: note CRUD, toggles, search, categories
/// - `tenants`: plan upgrade
pub mod auth;
pub mod health;
pub mod notes;
pub mod tenants;
pub mod users;
