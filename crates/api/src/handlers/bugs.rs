//! Handlers for the bug tracker resource.
//!
//! Every write goes through the intake pipeline in `bugtrack_core::intake`
//! (sanitize, then validate) before it reaches the store.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;

use bugtrack_core::bug::{Bug, BugInput, CommentInput};
use bugtrack_core::error::CoreError;
use bugtrack_core::intake::{prepare_changes, prepare_comment, prepare_new_bug};
use bugtrack_core::types::{parse_bug_id, BugId};
use bugtrack_db::BugPage;

use crate::error::{AppError, AppResult};
use crate::query::BugListParams;
use crate::response::{DataResponse, MessageResponse, PaginatedResponse, Pagination};
use crate::state::AppState;

fn bug_not_found(id: BugId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Bug",
        id: id.to_string(),
    })
}

async fn load_bug(state: &AppState, id: BugId) -> AppResult<Bug> {
    state
        .store
        .find_by_id(id)
        .await?
        .ok_or_else(|| bug_not_found(id))
}

// ---------------------------------------------------------------------------
// GET /bugs
// ---------------------------------------------------------------------------

/// List bugs newest first with optional filters and pagination.
///
/// An unknown enum filter value is an equality test nothing satisfies, so it
/// yields an empty page rather than an error.
pub async fn list_bugs(
    State(state): State<AppState>,
    params: Result<Query<BugListParams>, QueryRejection>,
) -> AppResult<impl IntoResponse> {
    let Query(params) = params?;
    let page = params.page_request();

    let result = match params.filter() {
        Some(filter) => state.store.list(&filter, page).await?,
        None => {
            tracing::debug!("Enum filter names an unknown value, nothing matches");
            BugPage {
                items: Vec::new(),
                total: 0,
            }
        }
    };

    tracing::debug!(
        total = result.total,
        page = page.page,
        limit = page.limit,
        "Listed bugs",
    );

    let pagination = Pagination {
        page: page.page,
        limit: page.limit,
        total: result.total,
        pages: page.page_count(result.total),
    };
    Ok(Json(PaginatedResponse::new(result.items, pagination)))
}

// ---------------------------------------------------------------------------
// POST /bugs
// ---------------------------------------------------------------------------

/// Create a bug from a sanitized, validated payload.
pub async fn create_bug(
    State(state): State<AppState>,
    payload: Result<Json<BugInput>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = payload?;
    let new_bug = prepare_new_bug(input, Utc::now())?;

    let bug = state.store.create(new_bug).await?;

    tracing::info!(
        bug_id = %bug.id,
        severity = %bug.severity,
        status = %bug.status,
        "Bug created",
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::with_message(bug, "Bug created successfully")),
    ))
}

// ---------------------------------------------------------------------------
// GET /bugs/{id}
// ---------------------------------------------------------------------------

pub async fn get_bug(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = parse_bug_id(&raw_id)?;
    let bug = load_bug(&state, id).await?;

    tracing::debug!(bug_id = %id, "Fetched bug");

    Ok(Json(DataResponse::new(bug)))
}

// ---------------------------------------------------------------------------
// PUT /bugs/{id}
// ---------------------------------------------------------------------------

/// Apply a partial update.
///
/// The record is loaded before the body is inspected, so a missing bug is
/// reported as 404 even when the payload is also invalid.
pub async fn update_bug(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<BugInput>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let id = parse_bug_id(&raw_id)?;
    let existing = load_bug(&state, id).await?;
    let Json(input) = payload?;

    let changes = prepare_changes(&existing, input, Utc::now())?;

    let updated = state
        .store
        .update(id, &changes)
        .await?
        .ok_or_else(|| bug_not_found(id))?;

    tracing::info!(
        bug_id = %id,
        from = %existing.status,
        to = %updated.status,
        "Bug updated",
    );

    Ok(Json(DataResponse::with_message(
        updated,
        "Bug updated successfully",
    )))
}

// ---------------------------------------------------------------------------
// DELETE /bugs/{id}
// ---------------------------------------------------------------------------

pub async fn delete_bug(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = parse_bug_id(&raw_id)?;

    if !state.store.delete(id).await? {
        return Err(bug_not_found(id));
    }

    tracing::info!(bug_id = %id, "Bug deleted");

    Ok(Json(MessageResponse::new("Bug deleted successfully")))
}

// ---------------------------------------------------------------------------
// POST /bugs/{id}/comments
// ---------------------------------------------------------------------------

/// Append one comment to an existing bug.
pub async fn add_comment(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<CommentInput>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let id = parse_bug_id(&raw_id)?;
    load_bug(&state, id).await?;
    let Json(input) = payload?;

    let comment = prepare_comment(input, Utc::now())?;

    let updated = state
        .store
        .add_comment(id, comment)
        .await?
        .ok_or_else(|| bug_not_found(id))?;

    tracing::info!(
        bug_id = %id,
        comments = updated.comments.len(),
        "Comment added",
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::with_message(
            updated,
            "Comment added successfully",
        )),
    ))
}
