/// Plan-based quota enforcement
///
/// Free tenants may hold at most [`FREE_ACTIVE_NOTE_LIMIT`] non-archived
/// notes; pro tenants are uncapped. Archiving a note frees a slot, deleting
/// one does too.
///
/// The check-then-insert sequence is a classic read-then-write race, so
/// enforcement for creates runs inside the caller's transaction with the
/// tenant row locked (`SELECT ... FOR UPDATE`). Concurrent creates for the
/// same tenant serialize on that lock and the cap holds even under
/// concurrency.
///
/// # Example
///
/// ```no_run
/// use notevault_shared::models::note::{CreateNote, Note};
/// use notevault_shared::quota::QuotaEnforcer;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, data: CreateNote, tenant_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let enforcer = QuotaEnforcer::new(pool.clone());
///
/// let mut tx = pool.begin().await?;
/// enforcer.enforce_for_create(&mut tx, tenant_id).await?;
/// let note = Note::create(&mut *tx, data).await?;
/// tx.commit().await?;
/// # Ok(())
/// # }
/// ```
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::tenant::{Tenant, TenantPlan};

/// Maximum non-archived notes for a free tenant
pub const FREE_ACTIVE_NOTE_LIMIT: u32 = 3;

/// Quota enforcement error
#[derive(Debug, thiserror::Error)]
pub enum QuotaError {
    /// Active-note cap reached
    #[error("Active note limit exceeded ({current}/{limit})")]
    LimitExceeded { limit: u32, current: u32 },

    /// Tenant not found
    #[error("Tenant not found: {0}")]
    TenantNotFound(Uuid),

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Quota limits for a plan
#[derive(Debug, Clone, Copy)]
pub struct QuotaLimits {
    /// Maximum non-archived notes; None means unlimited
    pub active_notes: Option<u32>,
}

impl QuotaLimits {
    /// Gets quota limits for a tenant plan
    pub fn for_plan(plan: TenantPlan) -> Self {
        match plan {
            TenantPlan::Free => QuotaLimits {
                active_notes: Some(FREE_ACTIVE_NOTE_LIMIT),
            },
            TenantPlan::Pro => QuotaLimits { active_notes: None },
        }
    }
}

/// Result of a quota check
#[derive(Debug, Clone)]
pub struct QuotaCheckResult {
    /// Whether another note may be created
    pub allowed: bool,

    /// Current non-archived note count
    pub current: u32,

    /// Plan limit; None means unlimited
    pub limit: Option<u32>,
}

impl QuotaCheckResult {
    fn evaluate(current: u32, limit: Option<u32>) -> Self {
        QuotaCheckResult {
            allowed: limit.map_or(true, |l| current < l),
            current,
            limit,
        }
    }

    /// Remaining slots before the cap; None means unlimited.
    pub fn remaining(&self) -> Option<u32> {
        self.limit.map(|l| l.saturating_sub(self.current))
    }
}

/// Quota enforcement service
///
/// Reads the tenant's current plan from the database on every check so a
/// plan upgrade takes effect immediately.
pub struct QuotaEnforcer {
    db: PgPool,
}

impl QuotaEnforcer {
    /// Creates a new quota enforcer
    pub fn new(db: PgPool) -> Self {
        QuotaEnforcer { db }
    }

    /// Reports quota standing for a tenant without taking any locks.
    ///
    /// Suitable for display; use [`enforce_for_create`](Self::enforce_for_create)
    /// when gating an insert.
    pub async fn check(&self, tenant_id: Uuid) -> Result<QuotaCheckResult, QuotaError> {
        let tenant = Tenant::find_by_id(&self.db, tenant_id)
            .await?
            .ok_or(QuotaError::TenantNotFound(tenant_id))?;

        let limits = QuotaLimits::for_plan(tenant.get_plan());
        let current = self.count_active_notes(tenant_id).await?;

        Ok(QuotaCheckResult::evaluate(current, limits.active_notes))
    }

    /// Gates a note insert inside `tx`.
    ///
    /// Locks the tenant row so concurrent creates for the same tenant
    /// serialize, then counts non-archived notes against the plan limit.
    /// The caller must perform the insert in the same transaction for the
    /// cap to be race-free.
    ///
    /// # Errors
    ///
    /// Returns `QuotaError::LimitExceeded` when the cap is reached, before
    /// anything is inserted.
    pub async fn enforce_for_create(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant_id: Uuid,
    ) -> Result<(), QuotaError> {
        let plan: Option<String> =
            sqlx::query_scalar("SELECT plan FROM tenants WHERE id = $1 FOR UPDATE")
                .bind(tenant_id)
                .fetch_optional(&mut **tx)
                .await?;

        let plan = plan.ok_or(QuotaError::TenantNotFound(tenant_id))?;
        let plan = TenantPlan::from_str(&plan).unwrap_or(TenantPlan::Free);

        let limit = match QuotaLimits::for_plan(plan).active_notes {
            Some(limit) => limit,
            None => return Ok(()),
        };

        let current: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notes WHERE tenant_id = $1 AND is_archived = FALSE",
        )
        .bind(tenant_id)
        .fetch_one(&mut **tx)
        .await?;
        let current = current as u32;

        if current >= limit {
            return Err(QuotaError::LimitExceeded { limit, current });
        }

        Ok(())
    }

    /// Counts non-archived notes for a tenant.
    async fn count_active_notes(&self, tenant_id: Uuid) -> Result<u32, sqlx::Error> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notes WHERE tenant_id = $1 AND is_archived = FALSE",
        )
        .bind(tenant_id)
        .fetch_one(&self.db)
        .await?;

        Ok(count as u32)
    }
}
