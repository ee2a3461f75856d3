/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/auth/register` - register into an existing tenant by slug
/// - `POST /api/auth/login` - login and get a bearer token
/// - `GET  /api/auth/me` - current user
/// - `PUT  /api/auth/profile` - update name/avatar
/// - `POST /api/auth/logout` - no-op; token removal is client-side
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use notevault_shared::{
    auth::{jwt, middleware::CurrentUser, password},
    models::{
        tenant::Tenant,
        user::{CreateUser, UpdateProfile, User, UserRole},
    },
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Tenant summary embedded in user payloads
#[derive(Debug, Clone, Serialize)]
pub struct TenantInfo {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub plan: String,
}

impl TenantInfo {
    pub fn from_tenant(tenant: &Tenant) -> Self {
        Self {
            id: tenant.id.to_string(),
            name: tenant.name.clone(),
            slug: tenant.slug.clone(),
            plan: tenant.plan.clone(),
        }
    }

    pub fn from_current(current: &CurrentUser) -> Self {
        Self {
            id: current.tenant_id.to_string(),
            name: current.tenant_name.clone(),
            slug: current.tenant_slug.clone(),
            plan: current.plan.as_str().to_string(),
        }
    }
}

/// User payload returned by auth endpoints
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(rename = "isVerified")]
    pub is_verified: bool,
    pub role: String,
    pub tenant: TenantInfo,
}

impl UserInfo {
    pub fn from_user(user: &User, tenant: &Tenant) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
            avatar: user.avatar_url.clone(),
            is_verified: user.is_verified,
            role: user.role.clone(),
            tenant: TenantInfo::from_tenant(tenant),
        }
    }

    pub fn from_current(current: &CurrentUser) -> Self {
        Self {
            id: current.user_id.to_string(),
            name: current.name.clone(),
            email: current.email.clone(),
            avatar: current.avatar_url.clone(),
            is_verified: current.is_verified,
            role: current.role.as_str().to_string(),
            tenant: TenantInfo::from_current(current),
        }
    }
}

/// Register request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Display name
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    /// Slug of the tenant to join; required, checked in the handler so the
    /// error message names the field
    pub tenant_slug: Option<String>,

    /// Requested role; anything other than "admin" becomes member
    pub role: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Profile update request
#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    /// New display name
    pub name: Option<String>,

    /// New avatar URL
    pub avatar: Option<String>,
}

/// Response carrying a token and the user
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: UserInfo,
}

/// Response carrying just the user
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: UserInfo,
}

/// Response for profile updates
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub message: String,
    pub user: UserInfo,
}

/// Plain message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Maps a requested role string the way the registration flow always has:
/// "admin" is honored, everything else (including absence) becomes member.
fn resolve_role(requested: Option<&str>) -> UserRole {
    match requested {
        Some("admin") => UserRole::Admin,
        _ => UserRole::Member,
    }
}

/// Register a new user into an existing tenant
///
/// The tenant must already exist; registration never creates tenants.
///
/// # Errors
///
/// - `400 Bad Request`: validation failed, duplicate email, missing or
///   unknown tenant slug
/// - `500 Internal Server Error`: server error
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate()?;

    let tenant_slug = req
        .tenant_slug
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("tenantSlug is required".to_string()))?;

    if User::find_by_email(&state.db, &req.email).await?.is_some() {
        return Err(ApiError::BadRequest(
            "User already exists with this email".to_string(),
        ));
    }

    let tenant = Tenant::find_by_slug(&state.db, tenant_slug)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Invalid tenant".to_string()))?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            tenant_id: tenant.id,
            name: req.name,
            email: req.email,
            password_hash,
            role: resolve_role(req.role.as_deref()),
        },
    )
    .await?;

    let token = jwt::create_token(&jwt::Claims::new(user.id, tenant.id), state.jwt_secret())?;

    tracing::info!(user_id = %user.id, tenant_id = %tenant.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully".to_string(),
            token,
            user: UserInfo::from_user(&user, &tenant),
        }),
    ))
}

/// Login with email and password
///
/// Unknown email and wrong password are indistinguishable to the caller.
///
/// # Errors
///
/// - `400 Bad Request`: validation failed
/// - `401 Unauthorized`: invalid credentials
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    let tenant = Tenant::find_by_id(&state.db, user.tenant_id)
        .await?
        .ok_or_else(|| ApiError::Internal("User has no tenant".to_string()))?;

    User::update_last_login(&state.db, user.id).await?;

    let token = jwt::create_token(&jwt::Claims::new(user.id, tenant.id), state.jwt_secret())?;

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        token,
        user: UserInfo::from_user(&user, &tenant),
    }))
}

/// Current user
pub async fn me(Extension(current): Extension<CurrentUser>) -> Json<UserResponse> {
    Json(UserResponse {
        user: UserInfo::from_current(&current),
    })
}

/// Update the caller's profile (name and/or avatar)
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<ProfileRequest>,
) -> ApiResult<Json<ProfileResponse>> {
    let user = User::update_profile(
        &state.db,
        current.user_id,
        UpdateProfile {
            name: req.name.filter(|n| !n.trim().is_empty()),
            avatar_url: req.avatar,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let mut info = UserInfo::from_current(&current);
    info.name = user.name;
    info.avatar = user.avatar_url;

    Ok(Json(ProfileResponse {
        message: "Profile updated successfully".to_string(),
        user: info,
    }))
}

/// Logout; the token lives client-side, so there is nothing to revoke.
pub async fn logout() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Logout successful".to_string(),
    })
}
