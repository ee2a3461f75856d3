/// Tenant model and database operations
///
/// Tenants are the multi-tenant isolation boundary. Every user and every note
/// belongs to exactly one tenant, and all note queries filter by tenant.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tenants (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     slug VARCHAR(100) NOT NULL UNIQUE,
///     plan VARCHAR(20) NOT NULL DEFAULT 'free',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT tenants_plan_check CHECK (plan IN ('free', 'pro')),
///     CONSTRAINT tenants_slug_lowercase_check CHECK (slug = lower(slug))
/// );
/// ```
///
/// The slug is globally unique, stored lowercase, and immutable after
/// creation. The plan gates the active-note quota (see the `quota` module)
/// and only ever changes through [`Tenant::upgrade_to_pro`].
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Subscription plan
///
/// Free tenants are capped at 3 non-archived notes; pro tenants are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantPlan {
    Free,
    Pro,
}

impl TenantPlan {
    /// Converts plan to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            TenantPlan::Free => "free",
            TenantPlan::Pro => "pro",
        }
    }

    /// Parses plan from its stored string form
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "free" => Some(TenantPlan::Free),
            "pro" => Some(TenantPlan::Pro),
            _ => None,
        }
    }
}

/// Tenant model representing an organization
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tenant {
    /// Unique tenant ID (UUID v4)
    pub id: Uuid,

    /// Organization display name
    pub name: String,

    /// URL-safe identifier, unique and lowercase
    pub slug: String,

    /// Current plan ("free" or "pro")
    pub plan: String,

    /// When the tenant was created
    pub created_at: DateTime<Utc>,

    /// When the tenant was last updated
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Gets the parsed plan enum
    ///
    /// Unknown values (which the CHECK constraint should prevent) are
    /// treated as free so the quota stays on the restrictive side.
    pub fn get_plan(&self) -> TenantPlan {
        TenantPlan::from_str(&self.plan).unwrap_or(TenantPlan::Free)
    }
}

/// Input for creating a new tenant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenant {
    /// Organization display name
    pub name: String,

    /// Slug; normalized to lowercase before insertion
    pub slug: String,

    /// Initial plan (defaults to Free)
    #[serde(default = "default_plan")]
    pub plan: TenantPlan,
}

fn default_plan() -> TenantPlan {
    TenantPlan::Free
}

/// Normalizes a slug the way it is stored: trimmed and lowercased.
pub fn normalize_slug(slug: &str) -> String {
    slug.trim().to_lowercase()
}

impl Tenant {
    /// Creates a new tenant
    ///
    /// # Errors
    ///
    /// Returns an error if the slug is already taken (unique constraint)
    /// or the database is unavailable.
    pub async fn create(pool: &PgPool, data: CreateTenant) -> Result<Self, sqlx::Error> {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO tenants (name, slug, plan)
            VALUES ($1, $2, $3)
            RETURNING id, name, slug, plan, created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(normalize_slug(&data.slug))
        .bind(data.plan.as_str())
        .fetch_one(pool)
        .await?;

        Ok(tenant)
    }

    /// Finds a tenant by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            SELECT id, name, slug, plan, created_at, updated_at
            FROM tenants
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(tenant)
    }

    /// Finds a tenant by slug
    ///
    /// The lookup is effectively case-insensitive: the input is normalized
    /// to lowercase first, matching how slugs are stored.
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Self>, sqlx::Error> {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            SELECT id, name, slug, plan, created_at, updated_at
            FROM tenants
            WHERE slug = $1
            "#,
        )
        .bind(normalize_slug(slug))
        .fetch_optional(pool)
        .await?;

        Ok(tenant)
    }

    /// Sets a tenant's plan to pro, unconditionally
    ///
    /// Idempotent: upgrading an already-pro tenant succeeds and returns the
    /// tenant unchanged apart from `updated_at`. No payment processing is
    /// involved.
    ///
    /// # Returns
    ///
    /// The updated tenant, or None if no tenant has that slug.
    pub async fn upgrade_to_pro(pool: &PgPool, slug: &str) -> Result<Option<Self>, sqlx::Error> {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            UPDATE tenants
            SET plan = 'pro', updated_at = NOW()
            WHERE slug = $1
            RETURNING id, name, slug, plan, created_at, updated_at
            "#,
        )
        .bind(normalize_slug(slug))
        .fetch_optional(pool)
        .await?;

        Ok(tenant)
    }
}
