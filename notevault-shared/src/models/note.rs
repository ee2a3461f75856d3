/// Note model and database operations
///
/// Notes are the core entity: short text documents scoped to a
/// (tenant, author) pair with pin/archive flags, a free-text category,
/// tags, a display color, and an optional share list.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE notes (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
///     author_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(100) NOT NULL,
///     content TEXT NOT NULL,
///     category VARCHAR(100) NOT NULL DEFAULT 'General',
///     tags TEXT[] NOT NULL DEFAULT '{}',
///     is_pinned BOOLEAN NOT NULL DEFAULT FALSE,
///     is_archived BOOLEAN NOT NULL DEFAULT FALSE,
///     color VARCHAR(7) NOT NULL DEFAULT '#ffffff',
///     is_public BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE note_shares (
///     note_id UUID NOT NULL REFERENCES notes(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     permission VARCHAR(10) NOT NULL DEFAULT 'read',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (note_id, user_id)
/// );
/// ```
///
/// # Access rules
///
/// Reads are visible to the author and to users in the share list.
/// Mutations (update, delete, pin, archive) are author-only: a share entry
/// never grants write access, whatever its `permission` value says. Every
/// query filters by tenant, so notes can never leak across tenants.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnection;
use sqlx::PgPool;
use uuid::Uuid;

/// Columns selected for every Note row
const NOTE_COLUMNS: &str = "id, tenant_id, author_id, title, content, category, tags, \
     is_pinned, is_archived, color, is_public, created_at, updated_at";

/// Share permission level
///
/// Stored per share entry. Only read visibility is enforced; `write` is
/// accepted and persisted but grants nothing beyond read (mutations stay
/// author-only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SharePermission {
    Read,
    Write,
}

impl SharePermission {
    /// Converts permission to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            SharePermission::Read => "read",
            SharePermission::Write => "write",
        }
    }

    /// Parses permission from its stored string form
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "read" => Some(SharePermission::Read),
            "write" => Some(SharePermission::Write),
            _ => None,
        }
    }
}

impl Default for SharePermission {
    fn default() -> Self {
        SharePermission::Read
    }
}

/// Note model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique note ID (UUID v4)
    pub id: Uuid,

    /// Tenant this note belongs to
    pub tenant_id: Uuid,

    /// User who authored the note; sole holder of mutation rights
    pub author_id: Uuid,

    /// Title, at most 100 characters
    pub title: String,

    /// Body text, at most 10000 characters
    pub content: String,

    /// Free-text category, defaults to "General"
    pub category: String,

    /// Tags attached to the note
    pub tags: Vec<String>,

    /// Pinned notes sort first in the default listing
    pub is_pinned: bool,

    /// Archived notes are hidden from the default active view and do not
    /// count against the free-plan quota
    pub is_archived: bool,

    /// Display color as a 6-digit hex string
    pub color: String,

    /// Stored but not consulted by any visibility query
    pub is_public: bool,

    /// When the note was created
    pub created_at: DateTime<Utc>,

    /// When the note was last updated
    pub updated_at: DateTime<Utc>,
}

/// A share entry attaching one user to one note
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct NoteShare {
    /// Shared note
    pub note_id: Uuid,

    /// User the note is shared with
    pub user_id: Uuid,

    /// Granted permission ("read" or "write")
    pub permission: String,

    /// When the share was created
    pub created_at: DateTime<Utc>,
}

/// Share entry as it appears in note create/update payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareEntry {
    /// User to share with
    pub user: Uuid,

    /// Permission to grant (defaults to read)
    #[serde(default)]
    pub permission: SharePermission,
}

/// Input for creating a new note
///
/// `tenant_id` and `author_id` always come from the authenticated identity,
/// never from the client payload.
#[derive(Debug, Clone)]
pub struct CreateNote {
    pub tenant_id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub category: String,
    pub tags: Vec<String>,
    pub color: String,
    pub is_public: bool,
}

/// Input for updating a note; title and content are always written,
/// the rest only when present
#[derive(Debug, Clone, Default)]
pub struct UpdateNote {
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub color: Option<String>,
    pub is_public: Option<bool>,
}

/// Filter for listing and counting notes
///
/// Tenant, author, and the archived flag are always applied; category and
/// search are optional refinements.
#[derive(Debug, Clone)]
pub struct NoteFilter {
    pub tenant_id: Uuid,
    pub author_id: Uuid,
    pub archived: bool,
    pub category: Option<String>,
    pub search: Option<String>,
}

/// Escapes LIKE pattern metacharacters so user input matches literally.
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Builds the WHERE clause shared by list and count queries.
///
/// Returns the clause and the number of placeholders consumed. Bind order:
/// tenant_id, author_id, archived, then category and search if present.
fn filter_clause(filter: &NoteFilter) -> (String, usize) {
    let mut clause = String::from("WHERE tenant_id = $1 AND author_id = $2 AND is_archived = $3");
    let mut bind_count = 3;

    if filter.category.is_some() {
        bind_count += 1;
        clause.push_str(&format!(" AND category = ${}", bind_count));
    }
    if filter.search.is_some() {
        bind_count += 1;
        clause.push_str(&format!(
            " AND (title ILIKE ${n} OR content ILIKE ${n})",
            n = bind_count
        ));
    }

    (clause, bind_count)
}

impl Note {
    /// Creates a new note
    ///
    /// Takes any Postgres executor so it can run inside the quota
    /// transaction (see `quota::QuotaEnforcer::enforce_for_create`).
    pub async fn create<'e, E>(executor: E, data: CreateNote) -> Result<Self, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let note = sqlx::query_as::<_, Note>(&format!(
            r#"
            INSERT INTO notes (tenant_id, author_id, title, content, category, tags, color, is_public)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {NOTE_COLUMNS}
            "#,
        ))
        .bind(data.tenant_id)
        .bind(data.author_id)
        .bind(data.title)
        .bind(data.content)
        .bind(data.category)
        .bind(data.tags)
        .bind(data.color)
        .bind(data.is_public)
        .fetch_one(executor)
        .await?;

        Ok(note)
    }

    /// Finds a note visible to `user_id`: the author sees their own notes,
    /// share recipients see notes shared with them. Anything else is None,
    /// including notes that exist but belong to someone else.
    pub async fn find_visible(
        pool: &PgPool,
        id: Uuid,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let note = sqlx::query_as::<_, Note>(&format!(
            r#"
            SELECT {NOTE_COLUMNS}
            FROM notes
            WHERE id = $1
              AND tenant_id = $2
              AND (author_id = $3 OR EXISTS (
                  SELECT 1 FROM note_shares
                  WHERE note_shares.note_id = notes.id AND note_shares.user_id = $3
              ))
            "#,
        ))
        .bind(id)
        .bind(tenant_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(note)
    }

    /// Lists notes matching the filter, pinned first then most recently
    /// updated first.
    pub async fn list(
        pool: &PgPool,
        filter: &NoteFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let (clause, bind_count) = filter_clause(filter);
        let sql = format!(
            "SELECT {NOTE_COLUMNS} FROM notes {clause} \
             ORDER BY is_pinned DESC, updated_at DESC LIMIT ${} OFFSET ${}",
            bind_count + 1,
            bind_count + 2,
        );

        let mut q = sqlx::query_as::<_, Note>(&sql)
            .bind(filter.tenant_id)
            .bind(filter.author_id)
            .bind(filter.archived);

        if let Some(ref category) = filter.category {
            q = q.bind(category);
        }
        if let Some(ref search) = filter.search {
            q = q.bind(format!("%{}%", escape_like(search)));
        }

        let notes = q.bind(limit).bind(offset).fetch_all(pool).await?;

        Ok(notes)
    }

    /// Counts notes matching the filter (for pagination totals).
    pub async fn count(pool: &PgPool, filter: &NoteFilter) -> Result<i64, sqlx::Error> {
        let (clause, _) = filter_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM notes {clause}");

        let mut q = sqlx::query_scalar::<_, i64>(&sql)
            .bind(filter.tenant_id)
            .bind(filter.author_id)
            .bind(filter.archived);

        if let Some(ref category) = filter.category {
            q = q.bind(category);
        }
        if let Some(ref search) = filter.search {
            q = q.bind(format!("%{}%", escape_like(search)));
        }

        let count = q.fetch_one(pool).await?;

        Ok(count)
    }

    /// Updates a note owned by (tenant_id, author_id)
    ///
    /// Title and content are always replaced; category, tags, color, and
    /// is_public only when provided. Ownership mismatches surface as None,
    /// indistinguishable from a missing note.
    pub async fn update<'e, E>(
        executor: E,
        id: Uuid,
        tenant_id: Uuid,
        author_id: Uuid,
        data: UpdateNote,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        // Build dynamic update query based on which fields are present
        let mut query =
            String::from("UPDATE notes SET updated_at = NOW(), title = $4, content = $5");
        let mut bind_count = 5;

        if data.category.is_some() {
            bind_count += 1;
            query.push_str(&format!(", category = ${}", bind_count));
        }
        if data.tags.is_some() {
            bind_count += 1;
            query.push_str(&format!(", tags = ${}", bind_count));
        }
        if data.color.is_some() {
            bind_count += 1;
            query.push_str(&format!(", color = ${}", bind_count));
        }
        if data.is_public.is_some() {
            bind_count += 1;
            query.push_str(&format!(", is_public = ${}", bind_count));
        }

        query.push_str(&format!(
            " WHERE id = $1 AND tenant_id = $2 AND author_id = $3 RETURNING {NOTE_COLUMNS}"
        ));

        let mut q = sqlx::query_as::<_, Note>(&query)
            .bind(id)
            .bind(tenant_id)
            .bind(author_id)
            .bind(data.title)
            .bind(data.content);

        if let Some(category) = data.category {
            q = q.bind(category);
        }
        if let Some(tags) = data.tags {
            q = q.bind(tags);
        }
        if let Some(color) = data.color {
            q = q.bind(color);
        }
        if let Some(is_public) = data.is_public {
            q = q.bind(is_public);
        }

        let note = q.fetch_optional(executor).await?;

        Ok(note)
    }

    /// Deletes a note owned by (tenant_id, author_id); hard delete.
    ///
    /// # Returns
    ///
    /// True if a row was removed, false for missing notes and ownership
    /// mismatches alike.
    pub async fn delete(
        pool: &PgPool,
        id: Uuid,
        tenant_id: Uuid,
        author_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM notes WHERE id = $1 AND tenant_id = $2 AND author_id = $3")
                .bind(id)
                .bind(tenant_id)
                .bind(author_id)
                .execute(pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Flips the pinned flag in a single statement; author-only.
    pub async fn toggle_pinned(
        pool: &PgPool,
        id: Uuid,
        tenant_id: Uuid,
        author_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let note = sqlx::query_as::<_, Note>(&format!(
            r#"
            UPDATE notes
            SET is_pinned = NOT is_pinned, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2 AND author_id = $3
            RETURNING {NOTE_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(tenant_id)
        .bind(author_id)
        .fetch_optional(pool)
        .await?;

        Ok(note)
    }

    /// Flips the archived flag in a single statement; author-only.
    pub async fn toggle_archived(
        pool: &PgPool,
        id: Uuid,
        tenant_id: Uuid,
        author_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let note = sqlx::query_as::<_, Note>(&format!(
            r#"
            UPDATE notes
            SET is_archived = NOT is_archived, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2 AND author_id = $3
            RETURNING {NOTE_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(tenant_id)
        .bind(author_id)
        .fetch_optional(pool)
        .await?;

        Ok(note)
    }

    /// Distinct categories used by the requester's own notes.
    pub async fn distinct_categories(
        pool: &PgPool,
        tenant_id: Uuid,
        author_id: Uuid,
    ) -> Result<Vec<String>, sqlx::Error> {
        let categories = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT category
            FROM notes
            WHERE tenant_id = $1 AND author_id = $2
            ORDER BY category
            "#,
        )
        .bind(tenant_id)
        .bind(author_id)
        .fetch_all(pool)
        .await?;

        Ok(categories)
    }
}

impl NoteShare {
    /// Replaces a note's share set wholesale
    ///
    /// Runs multiple statements, so it takes a connection from the caller's
    /// transaction: share replacement always accompanies a note create or
    /// update and should commit or roll back with it.
    pub async fn replace_for_note(
        conn: &mut PgConnection,
        note_id: Uuid,
        shares: &[ShareEntry],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM note_shares WHERE note_id = $1")
            .bind(note_id)
            .execute(&mut *conn)
            .await?;

        for share in shares {
            sqlx::query(
                r#"
                INSERT INTO note_shares (note_id, user_id, permission)
                VALUES ($1, $2, $3)
                ON CONFLICT (note_id, user_id) DO UPDATE SET permission = EXCLUDED.permission
                "#,
            )
            .bind(note_id)
            .bind(share.user)
            .bind(share.permission.as_str())
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    /// Lists share entries for a note.
    pub async fn list_for_note(pool: &PgPool, note_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let shares = sqlx::query_as::<_, NoteShare>(
            r#"
            SELECT note_id, user_id, permission, created_at
            FROM note_shares
            WHERE note_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(note_id)
        .fetch_all(pool)
        .await?;

        Ok(shares)
    }
}
