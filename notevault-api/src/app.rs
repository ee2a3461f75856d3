/// Application state and router builder
///
/// # Route map
///
/// ```text
/// /
/// ├── /health                        # liveness + db check (public)
/// ├── /api/health                    # same, legacy path (public)
/// └── /api/
///     ├── /auth/
///     │   ├── POST /register         # public
///     │   ├── POST /login            # public
///     │   ├── GET  /me               # auth
///     │   ├── PUT  /profile          # auth
///     │   └── POST /logout           # auth
///     ├── /users/
///     │   └── POST /invite           # auth + admin
///     ├── /notes/                    # all auth
///     │   ├── GET    /               # list with pagination/filter/search
///     │   ├── POST   /               # create (quota-checked)
///     │   ├── GET    /categories/list
///     │   ├── GET    /:id
///     │   ├── PUT    /:id
///     │   ├── DELETE /:id
///     │   ├── PATCH  /:id/pin
///     │   └── PATCH  /:id/archive
///     └── /tenants/
///         └── POST /:slug/upgrade    # auth + admin, own tenant only
/// ```
///
/// Middleware stack (outermost first): tracing, CORS, then per-group bearer
/// authentication.
use crate::config::Config;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, patch, post, put},
    Router,
};
use notevault_shared::auth::middleware;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned per request via Axum's `State` extractor; Arc keeps that cheap.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets the JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api/health", get(routes::health::api_health));

    // Register and login are the only unauthenticated API routes.
    let auth_public = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login));

    let auth_protected = Router::new()
        .route("/me", get(routes::auth::me))
        .route("/profile", put(routes::auth::update_profile))
        .route("/logout", post(routes::auth::logout))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_layer,
        ));

    let user_routes = Router::new()
        .route("/invite", post(routes::users::invite))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_layer,
        ));

    let note_routes = Router::new()
        .route(
            "/",
            get(routes::notes::list_notes).post(routes::notes::create_note),
        )
        .route("/categories/list", get(routes::notes::list_categories))
        .route(
            "/:id",
            get(routes::notes::get_note)
                .put(routes::notes::update_note)
                .delete(routes::notes::delete_note),
        )
        .route("/:id/pin", patch(routes::notes::toggle_pin))
        .route("/:id/archive", patch(routes::notes::toggle_archive))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_layer,
        ));

    let tenant_routes = Router::new()
        .route("/:slug/upgrade", post(routes::tenants::upgrade))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_layer,
        ));

    let cors = build_cors(&state.config.api.cors_origins);

    Router::new()
        .merge(health_routes)
        .nest("/api/auth", auth_public.merge(auth_protected))
        .nest("/api/users", user_routes)
        .nest("/api/notes", note_routes)
        .nest("/api/tenants", tenant_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Configures CORS from the origins list; "*" means permissive (development).
fn build_cors(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// Bearer authentication middleware layer
///
/// Delegates to the shared middleware, which resolves the token to a
/// `CurrentUser` (fresh user + tenant rows) and injects it into request
/// extensions.
async fn auth_layer(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    middleware::authenticate(&state.db, state.jwt_secret(), req, next)
        .await
        .map_err(Into::into)
}
