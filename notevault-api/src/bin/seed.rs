//! Development seed binary
//!
//! Idempotently creates two tenants (acme on free, globex on free) and an
//! admin plus a member account in each, all with the password "password".
//!
//! ```bash
//! cargo run -p notevault-api --bin notevault-seed
//! ```

use notevault_api::config::Config;
use notevault_shared::auth::password::hash_password;
use notevault_shared::db::{migrations::run_migrations, pool::create_pool};
use notevault_shared::models::tenant::{CreateTenant, Tenant, TenantPlan};
use notevault_shared::models::user::{CreateUser, User, UserRole};
use sqlx::PgPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn ensure_tenant(pool: &PgPool, name: &str, slug: &str) -> anyhow::Result<Tenant> {
    if let Some(tenant) = Tenant::find_by_slug(pool, slug).await? {
        return Ok(tenant);
    }

    let tenant = Tenant::create(
        pool,
        CreateTenant {
            name: name.to_string(),
            slug: slug.to_string(),
            plan: TenantPlan::Free,
        },
    )
    .await?;

    tracing::info!(slug = %tenant.slug, "Created tenant");
    Ok(tenant)
}

async fn ensure_user(
    pool: &PgPool,
    tenant: &Tenant,
    name: &str,
    email: &str,
    role: UserRole,
    password_hash: &str,
) -> anyhow::Result<()> {
    if User::find_by_email(pool, email).await?.is_some() {
        return Ok(());
    }

    User::create(
        pool,
        CreateUser {
            tenant_id: tenant.id,
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role,
        },
    )
    .await?;

    tracing::info!(email, "Created user");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let pool = create_pool(config.database.pool_config()).await?;
    run_migrations(&pool).await?;

    let acme = ensure_tenant(&pool, "Acme", "acme").await?;
    let globex = ensure_tenant(&pool, "Globex", "globex").await?;

    // One shared hash; these are development accounts.
    let password_hash = hash_password("password")?;

    ensure_user(&pool, &acme, "Acme Admin", "admin@acme.test", UserRole::Admin, &password_hash)
        .await?;
    ensure_user(&pool, &acme, "Acme User", "user@acme.test", UserRole::Member, &password_hash)
        .await?;
    ensure_user(
        &pool,
        &globex,
        "Globex Admin",
        "admin@globex.test",
        UserRole::Admin,
        &password_hash,
    )
    .await?;
    ensure_user(
        &pool,
        &globex,
        "Globex User",
        "user@globex.test",
        UserRole::Member,
        &password_hash,
    )
    .await?;

    tracing::info!("Seed completed. Accounts ready with password: password");

    Ok(())
}
