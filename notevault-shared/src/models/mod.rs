/// Database models
///
/// - `tenant`: organizations, the multi-tenant isolation boundary
/// - `user`: accounts within a tenant, with admin/member roles
/// - `note`: the core entity, scoped to (tenant, author)
pub mod note;
pub mod tenant;
pub mod user;
