/// Common test utilities for integration tests
///
/// Provides a TestContext that connects to the database named by
/// DATABASE_URL, runs migrations, and creates a throwaway tenant and admin
/// user with a valid bearer token. Requests are driven through the full
/// router via `tower::ServiceExt::oneshot`, so every test exercises the
/// real middleware stack.
use axum::body::Body;
use axum::http::{Request, StatusCode};
use notevault_api::app::{build_router, AppState};
use notevault_api::config::Config;
use notevault_shared::auth::jwt::{create_token, Claims};
use notevault_shared::auth::password::hash_password;
use notevault_shared::db::migrations::run_migrations;
use notevault_shared::models::tenant::{CreateTenant, Tenant, TenantPlan};
use notevault_shared::models::user::{CreateUser, User, UserRole};
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt as _;
use uuid::Uuid;

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub config: Config,
    pub tenant: Tenant,
    pub user: User,
    pub token: String,
}

impl TestContext {
    /// Creates a context with a fresh free-plan tenant and an admin user.
    pub async fn new() -> anyhow::Result<Self> {
        Self::with_plan(TenantPlan::Free).await
    }

    /// Creates a context with a fresh tenant on the given plan.
    pub async fn with_plan(plan: TenantPlan) -> anyhow::Result<Self> {
        let config = Config::from_env()?;

        let db = PgPool::connect(&config.database.url).await?;
        run_migrations(&db).await?;

        // Unique suffix keeps parallel test runs from colliding on the
        // tenant slug or user email.
        let suffix = Uuid::new_v4().simple().to_string();

        let tenant = Tenant::create(
            &db,
            CreateTenant {
                name: format!("Test Tenant {}", &suffix[..8]),
                slug: format!("test-{}", suffix),
                plan,
            },
        )
        .await?;

        let user = create_user(
            &db,
            &tenant,
            "Test Admin",
            &format!("admin-{}@test.example", suffix),
            UserRole::Admin,
        )
        .await?;

        let token = create_token(&Claims::new(user.id, tenant.id), &config.jwt.secret)?;

        let app = build_router(AppState::new(db.clone(), config.clone()));

        Ok(Self {
            db,
            app,
            config,
            tenant,
            user,
            token,
        })
    }

    /// Mints a bearer token for any user.
    pub fn token_for(&self, user: &User) -> String {
        create_token(&Claims::new(user.id, user.tenant_id), &self.config.jwt.secret)
            .expect("token creation")
    }

    /// Adds another user (and token) to this context's tenant.
    pub async fn add_user(&self, name: &str, role: UserRole) -> anyhow::Result<(User, String)> {
        let suffix = Uuid::new_v4().simple().to_string();
        let user = create_user(
            &self.db,
            &self.tenant,
            name,
            &format!("user-{}@test.example", suffix),
            role,
        )
        .await?;
        let token = self.token_for(&user);
        Ok((user, token))
    }

    /// Creates a second tenant with its own admin user and token.
    pub async fn add_tenant(&self, plan: TenantPlan) -> anyhow::Result<(Tenant, User, String)> {
        let suffix = Uuid::new_v4().simple().to_string();
        let tenant = Tenant::create(
            &self.db,
            CreateTenant {
                name: format!("Other Tenant {}", &suffix[..8]),
                slug: format!("other-{}", suffix),
                plan,
            },
        )
        .await?;
        let user = create_user(
            &self.db,
            &tenant,
            "Other Admin",
            &format!("other-{}@test.example", suffix),
            UserRole::Admin,
        )
        .await?;
        let token = self.token_for(&user);
        Ok((tenant, user, token))
    }
}

/// Creates a user with the password "password".
pub async fn create_user(
    db: &PgPool,
    tenant: &Tenant,
    name: &str,
    email: &str,
    role: UserRole,
) -> anyhow::Result<User> {
    let user = User::create(
        db,
        CreateUser {
            tenant_id: tenant.id,
            name: name.to_string(),
            email: email.to_string(),
            password_hash: hash_password("password")?,
            role,
        },
    )
    .await?;

    Ok(user)
}

/// Sends a request through the router and returns (status, parsed body).
pub async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).expect("request build"))
        .await
        .expect("request");

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");

    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, json)
}

/// Creates a note through the API and returns its parsed id.
pub async fn create_note(
    app: &axum::Router,
    token: &str,
    title: &str,
    content: &str,
) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/api/notes",
        Some(token),
        Some(serde_json::json!({ "title": title, "content": content })),
    )
    .await
}

/// Extracts a note id from a `{message, note}` response.
pub fn note_id(body: &Value) -> String {
    body["note"]["id"]
        .as_str()
        .expect("note id in response")
        .to_string()
}
