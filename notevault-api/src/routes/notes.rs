/// Note endpoints
///
/// All routes require authentication; every query is scoped to the caller's
/// tenant, and mutations additionally to the caller as author. Ownership
/// mismatches are reported as 404, never 403, so callers cannot probe for
/// other users' note IDs.
///
/// # Endpoints
///
/// - `GET    /api/notes` - paginated listing with category/search/archived filters
/// - `POST   /api/notes` - create (free-plan quota enforced transactionally)
/// - `GET    /api/notes/:id` - single note (author or share recipient)
/// - `PUT    /api/notes/:id` - update (author only)
/// - `DELETE /api/notes/:id` - hard delete (author only)
/// - `PATCH  /api/notes/:id/pin` - toggle pinned (author only)
/// - `PATCH  /api/notes/:id/archive` - toggle archived (author only)
/// - `GET    /api/notes/categories/list` - distinct categories of own notes
use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use notevault_shared::{
    auth::middleware::CurrentUser,
    models::note::{CreateNote, Note, NoteFilter, NoteShare, ShareEntry, UpdateNote},
    quota::QuotaEnforcer,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Category value applied when a note is created without one
const DEFAULT_CATEGORY: &str = "General";

/// Color applied when a note is created without one
const DEFAULT_COLOR: &str = "#ffffff";

/// Category filter value meaning "no filter"
const CATEGORY_ALL: &str = "All";

/// Default page size for listings
const DEFAULT_PAGE_LIMIT: i64 = 10;

/// Listing query parameters
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotesParams {
    /// 1-based page number; coerced to at least 1
    pub page: Option<i64>,

    /// Page size; coerced to at least 1
    pub limit: Option<i64>,

    /// Exact category match; "All" disables the filter
    pub category: Option<String>,

    /// Case-insensitive substring match over title and content
    pub search: Option<String>,

    /// Whether to list archived notes instead of active ones
    pub is_archived: Option<bool>,
}

/// Create request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteRequest {
    #[validate(length(min = 1, max = 100, message = "Title must be 1-100 characters"))]
    pub title: String,

    #[validate(length(min = 1, max = 10000, message = "Content must be 1-10000 characters"))]
    pub content: String,

    pub category: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    pub color: Option<String>,

    #[serde(default)]
    pub is_public: bool,

    /// Users to share with; read visibility only, whatever the permission says
    #[serde(default)]
    pub shared_with: Vec<ShareEntry>,
}

/// Update request; same field validation as create
///
/// Optional fields left out of the payload keep their stored values.
/// A present `sharedWith` replaces the share set wholesale.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNoteRequest {
    #[validate(length(min = 1, max = 100, message = "Title must be 1-100 characters"))]
    pub title: String,

    #[validate(length(min = 1, max = 10000, message = "Content must be 1-10000 characters"))]
    pub content: String,

    pub category: Option<String>,

    pub tags: Option<Vec<String>>,

    pub color: Option<String>,

    pub is_public: Option<bool>,

    pub shared_with: Option<Vec<ShareEntry>>,
}

/// Pagination block in list responses
#[derive(Debug, Serialize)]
pub struct Pagination {
    /// Current 1-based page
    pub current: i64,

    /// Total page count: ceil(total / limit)
    pub pages: i64,

    /// Total matching notes
    pub total: i64,
}

/// List response
#[derive(Debug, Serialize)]
pub struct ListNotesResponse {
    pub notes: Vec<Note>,
    pub pagination: Pagination,
}

/// Response carrying a note and a message
#[derive(Debug, Serialize)]
pub struct NoteResponse {
    pub message: String,
    pub note: Note,
}

/// Plain message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Categories response
#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<String>,
}

/// Checks a 6-digit hex color like `#1a2B3c`.
fn is_valid_hex_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Rejects a malformed color the same way derived validation failures are
/// reported.
fn validate_color_field(color: Option<&str>) -> Result<(), ApiError> {
    match color {
        Some(c) if !is_valid_hex_color(c) => {
            Err(ApiError::Validation(vec![ValidationErrorDetail {
                field: "color".to_string(),
                message: "Color must be a valid hex color".to_string(),
            }]))
        }
        _ => Ok(()),
    }
}

/// Trims tags and drops the ones that end up empty.
fn clean_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Applies the "General" default to a missing or blank category.
fn resolve_category(category: Option<String>) -> String {
    category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string())
}

/// List notes with pagination, category filter, and search
pub async fn list_notes(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(params): Query<ListNotesParams>,
) -> ApiResult<Json<ListNotesResponse>> {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_LIMIT).max(1);
    let offset = (page - 1) * limit;

    let filter = NoteFilter {
        tenant_id: current.tenant_id,
        author_id: current.user_id,
        archived: params.is_archived.unwrap_or(false),
        category: params
            .category
            .filter(|c| !c.is_empty() && c != CATEGORY_ALL),
        search: params.search.filter(|s| !s.is_empty()),
    };

    let notes = Note::list(&state.db, &filter, limit, offset).await?;
    let total = Note::count(&state.db, &filter).await?;

    Ok(Json(ListNotesResponse {
        notes,
        pagination: Pagination {
            current: page,
            pages: (total + limit - 1) / limit,
            total,
        },
    }))
}

/// Create a note
///
/// Author and tenant are stamped from the authenticated identity; whatever
/// the client sends for them is ignored. The free-plan cap is enforced in
/// the same transaction as the insert, with the tenant row locked, so
/// concurrent creates cannot blow past it.
///
/// # Errors
///
/// - `400 Bad Request`: validation failed
/// - `402 Payment Required`: free-plan active-note cap reached
pub async fn create_note(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<CreateNoteRequest>,
) -> ApiResult<(StatusCode, Json<NoteResponse>)> {
    req.validate()?;
    validate_color_field(req.color.as_deref())?;

    let data = CreateNote {
        tenant_id: current.tenant_id,
        author_id: current.user_id,
        title: req.title.trim().to_string(),
        content: req.content,
        category: resolve_category(req.category),
        tags: clean_tags(req.tags),
        color: req.color.unwrap_or_else(|| DEFAULT_COLOR.to_string()),
        is_public: req.is_public,
    };

    let enforcer = QuotaEnforcer::new(state.db.clone());

    let mut tx = state.db.begin().await?;
    enforcer
        .enforce_for_create(&mut tx, current.tenant_id)
        .await?;
    let note = Note::create(&mut *tx, data).await?;
    if !req.shared_with.is_empty() {
        NoteShare::replace_for_note(&mut tx, note.id, &req.shared_with).await?;
    }
    tx.commit().await?;

    tracing::info!(note_id = %note.id, tenant_id = %current.tenant_id, "Note created");

    Ok((
        StatusCode::CREATED,
        Json(NoteResponse {
            message: "Note created successfully".to_string(),
            note,
        }),
    ))
}

/// Get a single note
///
/// Visible to the author and to share recipients. Everything else is 404,
/// including notes that exist but are not visible.
pub async fn get_note(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Note>> {
    let note = Note::find_visible(&state.db, id, current.tenant_id, current.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Note not found".to_string()))?;

    Ok(Json(note))
}

/// Update a note (author only)
pub async fn update_note(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateNoteRequest>,
) -> ApiResult<Json<NoteResponse>> {
    req.validate()?;
    validate_color_field(req.color.as_deref())?;

    let data = UpdateNote {
        title: req.title.trim().to_string(),
        content: req.content,
        category: req.category.map(|c| resolve_category(Some(c))),
        tags: req.tags.map(clean_tags),
        color: req.color,
        is_public: req.is_public,
    };

    let mut tx = state.db.begin().await?;
    let note = Note::update(&mut *tx, id, current.tenant_id, current.user_id, data)
        .await?
        .ok_or_else(|| ApiError::NotFound("Note not found or access denied".to_string()))?;
    if let Some(ref shares) = req.shared_with {
        NoteShare::replace_for_note(&mut tx, note.id, shares).await?;
    }
    tx.commit().await?;

    Ok(Json(NoteResponse {
        message: "Note updated successfully".to_string(),
        note,
    }))
}

/// Delete a note (author only, hard delete)
pub async fn delete_note(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let deleted = Note::delete(&state.db, id, current.tenant_id, current.user_id).await?;

    if !deleted {
        return Err(ApiError::NotFound(
            "Note not found or access denied".to_string(),
        ));
    }

    Ok(Json(MessageResponse {
        message: "Note deleted successfully".to_string(),
    }))
}

/// Toggle the pinned flag (author only)
pub async fn toggle_pin(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<NoteResponse>> {
    let note = Note::toggle_pinned(&state.db, id, current.tenant_id, current.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Note not found or access denied".to_string()))?;

    let message = format!(
        "Note {} successfully",
        if note.is_pinned { "pinned" } else { "unpinned" }
    );

    Ok(Json(NoteResponse { message, note }))
}

/// Toggle the archived flag (author only)
pub async fn toggle_archive(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<NoteResponse>> {
    let note = Note::toggle_archived(&state.db, id, current.tenant_id, current.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Note not found or access denied".to_string()))?;

    let message = format!(
        "Note {} successfully",
        if note.is_archived {
            "archived"
        } else {
            "unarchived"
        }
    );

    Ok(Json(NoteResponse { message, note }))
}

/// List distinct categories of the caller's own notes
pub async fn list_categories(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<CategoriesResponse>> {
    let categories =
        Note::distinct_categories(&state.db, current.tenant_id, current.user_id).await?;

    Ok(Json(CategoriesResponse { categories }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request(title: &str, content: &str, color: Option<&str>) -> CreateNoteRequest {
        CreateNoteRequest {
            title: title.to_string(),
            content: content.to_string(),
            category: None,
            tags: vec![],
            color: color.map(String::from),
            is_public: false,
            shared_with: vec![],
        }
    }

    #[test]
    fn test_create_request_validation() {
        assert!(create_request("Title", "Body", None).validate().is_ok());
        assert!(create_request("", "Body", None).validate().is_err());
        assert!(create_request(&"a".repeat(101), "Body", None)
            .validate()
            .is_err());
        assert!(create_request("Title", "", None).validate().is_err());
        assert!(create_request("Title", &"a".repeat(10001), None)
            .validate()
            .is_err());
    }

    #[test]
    fn test_is_valid_hex_color() {
        assert!(is_valid_hex_color("#ffffff"));
        assert!(is_valid_hex_color("#1A2b3C"));
        assert!(!is_valid_hex_color("ffffff"));
        assert!(!is_valid_hex_color("#fff"));
        assert!(!is_valid_hex_color("#gggggg"));
        assert!(!is_valid_hex_color("#fffffff"));
    }

    #[test]
    fn test_validate_color_field() {
        assert!(validate_color_field(None).is_ok());
        assert!(validate_color_field(Some("#aabbcc")).is_ok());
        assert!(matches!(
            validate_color_field(Some("blue")),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn test_clean_tags() {
        assert_eq!(
            clean_tags(vec![" work ".to_string(), "".to_string(), "ideas".to_string()]),
            vec!["work".to_string(), "ideas".to_string()]
        );
    }

    #[test]
    fn test_resolve_category() {
        assert_eq!(resolve_category(None), "General");
        assert_eq!(resolve_category(Some("  ".to_string())), "General");
        assert_eq!(resolve_category(Some(" Work ".to_string())), "Work");
    }

    #[test]
    fn test_pagination_math() {
        // Mirrors the expression in list_notes
        let pages = |total: i64, limit: i64| (total + limit - 1) / limit;
        assert_eq!(pages(0, 10), 0);
        assert_eq!(pages(1, 10), 1);
        assert_eq!(pages(10, 10), 1);
        assert_eq!(pages(11, 10), 2);
        assert_eq!(pages(25, 10), 3);
    }

    #[test]
    fn test_list_params_camel_case() {
        let params: ListNotesParams =
            serde_json::from_str(r#"{"page": 2, "isArchived": true}"#).unwrap();
        assert_eq!(params.page, Some(2));
        assert_eq!(params.is_archived, Some(true));
    }
}
