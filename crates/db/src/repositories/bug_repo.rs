//! Repository for the `bugs` table.

use sqlx::types::Json;
use sqlx::PgPool;

use bugtrack_core::bug::{Bug, BugChanges, Comment};
use bugtrack_core::types::{BugId, Timestamp};

use crate::models::bug::BugRow;
use crate::store::{BugFilter, PageRequest};

/// Column list for `bugs` queries.
const COLUMNS: &str = "\
    id, title, description, severity, status, priority, reporter, assignee, \
    tags, steps_to_reproduce, environment, attachments, comments, \
    due_date, resolved_at, created_at, updated_at";

/// Provides CRUD operations for bugs.
pub struct BugRepo;

impl BugRepo {
    /// Insert a fully materialized bug, returning the stored row.
    pub async fn insert(pool: &PgPool, bug: &Bug) -> Result<BugRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO bugs ({COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BugRow>(&query)
            .bind(bug.id)
            .bind(&bug.title)
            .bind(&bug.description)
            .bind(bug.severity.as_str())
            .bind(bug.status.as_str())
            .bind(bug.priority.as_str())
            .bind(&bug.reporter)
            .bind(&bug.assignee)
            .bind(&bug.tags)
            .bind(&bug.steps_to_reproduce)
            .bind(bug.environment.as_ref().map(Json))
            .bind(Json(&bug.attachments))
            .bind(Json(&bug.comments))
            .bind(bug.due_date)
            .bind(bug.resolved_at)
            .bind(bug.created_at)
            .bind(bug.updated_at)
            .fetch_one(pool)
            .await
    }

    /// Find a bug by ID.
    pub async fn find_by_id(pool: &PgPool, id: BugId) -> Result<Option<BugRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM bugs WHERE id = $1");
        sqlx::query_as::<_, BugRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List bugs matching `filter`, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &BugFilter,
        page: PageRequest,
    ) -> Result<Vec<BugRow>, sqlx::Error> {
        let (where_clause, bind_values, bind_idx) = build_filter(filter);

        let query = format!(
            "SELECT {COLUMNS} FROM bugs {where_clause} \
             ORDER BY created_at DESC, id DESC \
             LIMIT ${bind_idx} OFFSET ${}",
            bind_idx + 1
        );

        let mut q = sqlx::query_as::<_, BugRow>(&query);
        for value in &bind_values {
            q = q.bind(value.as_str());
        }
        q.bind(page.limit)
            .bind(page.offset())
            .fetch_all(pool)
            .await
    }

    /// Count bugs matching `filter` (for pagination metadata).
    pub async fn count(pool: &PgPool, filter: &BugFilter) -> Result<i64, sqlx::Error> {
        let (where_clause, bind_values, _) = build_filter(filter);

        let query = format!("SELECT COUNT(*)::BIGINT AS count FROM bugs {where_clause}");

        let mut q = sqlx::query_scalar::<_, i64>(&query);
        for value in &bind_values {
            q = q.bind(value.as_str());
        }
        q.fetch_one(pool).await
    }

    /// Apply the supplied fields only. Returns the updated row if found.
    ///
    /// `resolved_at` is stamped in the same statement when the resulting
    /// status is `resolved` and no stamp exists yet.
    pub async fn update(
        pool: &PgPool,
        id: BugId,
        changes: &BugChanges,
        now: Timestamp,
    ) -> Result<Option<BugRow>, sqlx::Error> {
        let mut sets: Vec<String> = Vec::new();
        let mut param_idx: usize = 1;
        let mut status_param: Option<usize> = None;

        let mut set = |column: &str, sets: &mut Vec<String>| {
            sets.push(format!("{column} = ${param_idx}"));
            param_idx += 1;
            param_idx - 1
        };

        if changes.title.is_some() {
            set("title", &mut sets);
        }
        if changes.description.is_some() {
            set("description", &mut sets);
        }
        if changes.reporter.is_some() {
            set("reporter", &mut sets);
        }
        if changes.assignee.is_some() {
            set("assignee", &mut sets);
        }
        if changes.severity.is_some() {
            set("severity", &mut sets);
        }
        if changes.status.is_some() {
            status_param = Some(set("status", &mut sets));
        }
        if changes.priority.is_some() {
            set("priority", &mut sets);
        }
        if changes.tags.is_some() {
            set("tags", &mut sets);
        }
        if changes.steps_to_reproduce.is_some() {
            set("steps_to_reproduce", &mut sets);
        }
        if changes.environment.is_some() {
            set("environment", &mut sets);
        }
        if changes.attachments.is_some() {
            set("attachments", &mut sets);
        }
        if changes.comments.is_some() {
            set("comments", &mut sets);
        }
        if changes.due_date.is_some() {
            set("due_date", &mut sets);
        }
        let now_param = set("updated_at", &mut sets);
        let id_param = param_idx;

        // SET expressions see the old row, so compare against the new status
        // parameter when one was supplied.
        let next_status = status_param
            .map(|idx| format!("${idx}"))
            .unwrap_or_else(|| "status".to_string());
        sets.push(format!(
            "resolved_at = CASE \
                WHEN resolved_at IS NULL AND {next_status} = 'resolved' THEN ${now_param} \
                ELSE resolved_at END"
        ));

        let query = format!(
            "UPDATE bugs SET {} WHERE id = ${id_param} RETURNING {COLUMNS}",
            sets.join(", ")
        );

        let mut q = sqlx::query_as::<_, BugRow>(&query);
        if let Some(title) = &changes.title {
            q = q.bind(title);
        }
        if let Some(description) = &changes.description {
            q = q.bind(description);
        }
        if let Some(reporter) = &changes.reporter {
            q = q.bind(reporter);
        }
        if let Some(assignee) = &changes.assignee {
            q = q.bind(assignee);
        }
        if let Some(severity) = changes.severity {
            q = q.bind(severity.as_str());
        }
        if let Some(status) = changes.status {
            q = q.bind(status.as_str());
        }
        if let Some(priority) = changes.priority {
            q = q.bind(priority.as_str());
        }
        if let Some(tags) = &changes.tags {
            q = q.bind(tags);
        }
        if let Some(steps) = &changes.steps_to_reproduce {
            q = q.bind(steps);
        }
        if let Some(environment) = &changes.environment {
            q = q.bind(Json(environment));
        }
        if let Some(attachments) = &changes.attachments {
            q = q.bind(Json(attachments));
        }
        if let Some(comments) = &changes.comments {
            q = q.bind(Json(comments));
        }
        if let Some(due_date) = changes.due_date {
            q = q.bind(due_date);
        }
        q.bind(now).bind(id).fetch_optional(pool).await
    }

    /// Append one comment to the `comments` array. Returns the updated row if found.
    pub async fn append_comment(
        pool: &PgPool,
        id: BugId,
        comment: &Comment,
        now: Timestamp,
    ) -> Result<Option<BugRow>, sqlx::Error> {
        let query = format!(
            "UPDATE bugs SET comments = comments || $1::jsonb, updated_at = $2 \
             WHERE id = $3 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BugRow>(&query)
            .bind(Json([comment]))
            .bind(now)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Delete a bug. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: BugId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM bugs WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Build the `WHERE` clause for list/count queries.
///
/// Returns the clause, the text values to bind in order, and the next free
/// parameter index.
fn build_filter(filter: &BugFilter) -> (String, Vec<String>, usize) {
    let mut conditions: Vec<String> = Vec::new();
    let mut bind_values: Vec<String> = Vec::new();
    let mut param_idx: usize = 1;

    if let Some(status) = filter.status {
        conditions.push(format!("status = ${param_idx}"));
        bind_values.push(status.as_str().to_string());
        param_idx += 1;
    }
    if let Some(severity) = filter.severity {
        conditions.push(format!("severity = ${param_idx}"));
        bind_values.push(severity.as_str().to_string());
        param_idx += 1;
    }
    if let Some(priority) = filter.priority {
        conditions.push(format!("priority = ${param_idx}"));
        bind_values.push(priority.as_str().to_string());
        param_idx += 1;
    }
    if let Some(reporter) = &filter.reporter {
        // strpos keeps user input out of LIKE pattern syntax.
        conditions.push(format!("strpos(lower(reporter), lower(${param_idx})) > 0"));
        bind_values.push(reporter.clone());
        param_idx += 1;
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    (where_clause, bind_values, param_idx)
}
