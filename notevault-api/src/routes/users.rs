/// User management endpoints
///
/// # Endpoints
///
/// - `POST /api/users/invite` - admin invites a user into their own tenant
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use notevault_shared::{
    auth::{authorization, middleware::CurrentUser, password},
    models::user::{CreateUser, User, UserRole},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Length of generated passwords for invites that don't supply one
const GENERATED_PASSWORD_LEN: usize = 10;

/// Invite request
#[derive(Debug, Deserialize, Validate)]
pub struct InviteRequest {
    /// Display name
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Initial password; generated when absent
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,

    /// Requested role; anything other than "admin" becomes member
    pub role: Option<String>,
}

/// Invited user summary (no tenant echo; it is always the caller's own)
#[derive(Debug, Serialize)]
pub struct InvitedUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

/// Invite response
#[derive(Debug, Serialize)]
pub struct InviteResponse {
    pub message: String,
    pub user: InvitedUser,
}

/// Invite a user into the caller's tenant
///
/// Admin only. The invited user always lands in the caller's own tenant;
/// there is no cross-tenant invite.
///
/// # Errors
///
/// - `400 Bad Request`: validation failed or duplicate email
/// - `403 Forbidden`: caller is not an admin
pub async fn invite(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<InviteRequest>,
) -> ApiResult<(StatusCode, Json<InviteResponse>)> {
    authorization::require_admin(&current)?;
    req.validate()?;

    if User::find_by_email(&state.db, &req.email).await?.is_some() {
        return Err(ApiError::BadRequest(
            "User already exists with this email".to_string(),
        ));
    }

    let initial_password = req
        .password
        .unwrap_or_else(|| password::generate_password(GENERATED_PASSWORD_LEN));
    let password_hash = password::hash_password(&initial_password)?;

    let role = match req.role.as_deref() {
        Some("admin") => UserRole::Admin,
        _ => UserRole::Member,
    };

    let user = User::create(
        &state.db,
        CreateUser {
            tenant_id: current.tenant_id,
            name: req.name,
            email: req.email,
            password_hash,
            role,
        },
    )
    .await?;

    tracing::info!(
        user_id = %user.id,
        tenant_id = %current.tenant_id,
        invited_by = %current.user_id,
        "User invited"
    );

    Ok((
        StatusCode::CREATED,
        Json(InviteResponse {
            message: "User invited successfully".to_string(),
            user: InvitedUser {
                id: user.id.to_string(),
                name: user.name,
                email: user.email,
                role: user.role,
            },
        }),
    ))
}
