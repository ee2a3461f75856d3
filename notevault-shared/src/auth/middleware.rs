/// Bearer-token authentication for Axum
///
/// Resolves `Authorization: Bearer <jwt>` to a [`CurrentUser`] and attaches
/// it to request extensions, or fails the request with an [`AuthError`].
/// The user and tenant rows are loaded from the database on every request,
/// so role changes and plan upgrades take effect without re-issuing tokens.
///
/// # Example
///
/// ```no_run
/// use axum::{extract::Request, middleware::Next, response::Response, Extension};
/// use notevault_shared::auth::middleware::{authenticate, AuthError, CurrentUser};
/// use sqlx::PgPool;
///
/// async fn handler(Extension(current): Extension<CurrentUser>) -> String {
///     format!("Hello, {}!", current.name)
/// }
///
/// async fn auth_layer(
///     pool: PgPool,
///     secret: String,
///     req: Request,
///     next: Next,
/// ) -> Result<Response, AuthError> {
///     authenticate(&pool, &secret, req, next).await
/// }
/// ```
use axum::{extract::Request, http::header, middleware::Next, response::Response};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::jwt::{validate_token, JwtError};
use crate::models::tenant::{Tenant, TenantPlan};
use crate::models::user::{User, UserRole};

/// Authenticated identity attached to request extensions
///
/// Carries everything handlers need without further lookups: the user, the
/// tenant they belong to, and the tenant's current plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// User display name
    pub name: String,

    /// User email
    pub email: String,

    /// Role within the tenant
    pub role: UserRole,

    /// Avatar URL, if set
    pub avatar_url: Option<String>,

    /// Whether the email is verified
    pub is_verified: bool,

    /// Tenant the user belongs to
    pub tenant_id: Uuid,

    /// Tenant display name
    pub tenant_name: String,

    /// Tenant slug (lowercase)
    pub tenant_slug: String,

    /// Tenant plan as of this request
    pub plan: TenantPlan,
}

impl CurrentUser {
    /// Builds the request identity from freshly loaded rows.
    pub fn from_records(user: &User, tenant: &Tenant) -> Self {
        Self {
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.get_role(),
            avatar_url: user.avatar_url.clone(),
            is_verified: user.is_verified,
            tenant_id: tenant.id,
            tenant_name: tenant.name.clone(),
            tenant_slug: tenant.slug.clone(),
            plan: tenant.get_plan(),
        }
    }

    /// Whether this user holds the admin role.
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Error type for the authentication middleware
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Authorization header missing
    #[error("Missing credentials")]
    MissingCredentials,

    /// Authorization header is not a Bearer token
    #[error("Expected Bearer token")]
    InvalidFormat,

    /// Token failed validation
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Token is valid but the user or tenant no longer resolves
    #[error("Unknown user")]
    UnknownUser,

    /// Database error during resolution
    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Authenticates a request and runs the rest of the stack
///
/// 1. Extracts the Bearer token from the Authorization header
/// 2. Validates the JWT (signature, expiry, issuer)
/// 3. Loads the user and their tenant from the database
/// 4. Inserts [`CurrentUser`] into request extensions
///
/// # Errors
///
/// Any failure short-circuits the request; callers map [`AuthError`] to a
/// 401 response.
pub async fn authenticate(
    pool: &PgPool,
    jwt_secret: &str,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidFormat)?;

    let claims = validate_token(token, jwt_secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer => AuthError::InvalidToken("Invalid issuer".to_string()),
        _ => AuthError::InvalidToken(e.to_string()),
    })?;

    let user = User::find_by_id(pool, claims.sub)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?
        .ok_or(AuthError::UnknownUser)?;

    // A user without a resolvable tenant cannot be scoped; treat as unauthenticated.
    let tenant = Tenant::find_by_id(pool, user.tenant_id)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?
        .ok_or(AuthError::UnknownUser)?;

    let current = CurrentUser::from_records(&user, &tenant);
    req.extensions_mut().insert(current);

    Ok(next.run(req).await)
}
