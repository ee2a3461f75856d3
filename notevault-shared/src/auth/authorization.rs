/// Capability checks
///
/// Authorization decisions live here as explicit functions returning a
/// `Result` whose error names the reason, rather than conditionals spread
/// through handlers. Handlers call the capability they need and propagate
/// the error, which the API layer maps to 403.
///
/// Note-level access control is intentionally NOT here: visibility and
/// ownership are enforced inside the note queries themselves (tenant +
/// author/share filters), so a mismatch is indistinguishable from a missing
/// note.
use super::middleware::CurrentUser;
use crate::models::tenant::normalize_slug;

/// Error type for capability checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Caller does not hold the admin role
    #[error("Admin role required")]
    AdminRequired,

    /// Caller tried to act on a tenant other than their own
    #[error("Cross-tenant access denied")]
    TenantMismatch,
}

/// Requires the caller to hold the admin role.
///
/// Gates user invites and tenant plan upgrades.
pub fn require_admin(current: &CurrentUser) -> Result<(), AuthzError> {
    if !current.is_admin() {
        return Err(AuthzError::AdminRequired);
    }

    Ok(())
}

/// Requires the caller's own tenant to match the addressed slug.
///
/// Slugs are compared in their normalized (lowercase) form. This is what
/// stops an admin of one tenant from upgrading another.
pub fn require_same_tenant(current: &CurrentUser, slug: &str) -> Result<(), AuthzError> {
    if current.tenant_slug != normalize_slug(slug) {
        return Err(AuthzError::TenantMismatch);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tenant::TenantPlan;
    use crate::models::user::UserRole;
    use uuid::Uuid;

    fn current(role: UserRole, slug: &str) -> CurrentUser {
        CurrentUser {
            user_id: Uuid::new_v4(),
            name: "Test".to_string(),
            email: "test@example.com".to_string(),
            role,
            avatar_url: None,
            is_verified: false,
            tenant_id: Uuid::new_v4(),
            tenant_name: "Acme".to_string(),
            tenant_slug: slug.to_string(),
            plan: TenantPlan::Free,
        }
    }

    #[test]
    fn test_require_admin() {
        assert!(require_admin(&current(UserRole::Admin, "acme")).is_ok());
        assert!(matches!(
            require_admin(&current(UserRole::Member, "acme")),
            Err(AuthzError::AdminRequired)
        ));
    }

    #[test]
    fn test_require_same_tenant() {
        let caller = current(UserRole::Admin, "acme");

        assert!(require_same_tenant(&caller, "acme").is_ok());
        // Path slugs arrive in whatever case the client typed
        assert!(require_same_tenant(&caller, "ACME").is_ok());
        assert!(matches!(
            require_same_tenant(&caller, "globex"),
            Err(AuthzError::TenantMismatch)
        ));
    }
}
