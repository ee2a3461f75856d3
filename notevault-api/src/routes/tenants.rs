/// Tenant endpoints
///
/// # Endpoints
///
/// - `POST /api/tenants/:slug/upgrade` - admin upgrades their own tenant to pro
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use notevault_shared::{
    auth::{authorization, middleware::CurrentUser},
    models::tenant::Tenant,
};
use serde::Serialize;

use super::auth::TenantInfo;

/// Upgrade response
#[derive(Debug, Serialize)]
pub struct UpgradeResponse {
    pub message: String,
    pub tenant: TenantInfo,
}

/// Upgrade a tenant to the pro plan
///
/// Admin only, and only for the caller's own tenant: the path slug must
/// match the caller's tenant slug or the request is rejected with 403.
/// The plan is set to pro unconditionally; no payment processing is
/// modeled, and upgrading an already-pro tenant is a no-op success.
///
/// # Errors
///
/// - `403 Forbidden`: caller is not an admin, or the slug names another tenant
/// - `404 Not Found`: no tenant with that slug
pub async fn upgrade(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(slug): Path<String>,
) -> ApiResult<Json<UpgradeResponse>> {
    authorization::require_admin(&current)?;
    authorization::require_same_tenant(&current, &slug)?;

    let tenant = Tenant::upgrade_to_pro(&state.db, &slug)
        .await?
        .ok_or_else(|| ApiError::NotFound("Tenant not found".to_string()))?;

    tracing::info!(tenant_id = %tenant.id, slug = %tenant.slug, "Tenant upgraded to pro");

    Ok(Json(UpgradeResponse {
        message: "Tenant upgraded to Pro successfully".to_string(),
        tenant: TenantInfo::from_tenant(&tenant),
    }))
}
