/// Health check endpoints
///
/// `GET /health` reports service status and database connectivity.
/// `GET /api/health` is the same check at the legacy path.
use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status ("healthy" or "degraded")
    pub status: String,

    /// Application version
    pub version: String,

    /// Database status ("connected" or "disconnected")
    pub database: String,
}

/// Simple message response for the legacy path
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiHealthResponse {
    pub message: String,
}

/// Health check handler
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let database = match sqlx::query("SELECT 1").fetch_one(&state.db).await {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    Ok(Json(HealthResponse {
        status: if database == "connected" {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
    }))
}

/// Legacy health handler
pub async fn api_health() -> Json<ApiHealthResponse> {
    Json(ApiHealthResponse {
        message: "Server is running!".to_string(),
    })
}
