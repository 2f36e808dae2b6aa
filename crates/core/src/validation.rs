//! Field validators and the aggregate bug validator.
//!
//! Every field validator is a pure function returning the normalized value
//! on success or a single human-readable message on failure. The aggregate
//! validator runs them all and reports every failure at once.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;

use crate::bug::{Attachment, AttachmentInput, BugInput, Comment, CommentInput, Environment};
use crate::bug::{Priority, Severity, Status};
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

pub const TITLE_MIN_LEN: usize = 3;
pub const TITLE_MAX_LEN: usize = 100;
pub const DESCRIPTION_MIN_LEN: usize = 10;
pub const DESCRIPTION_MAX_LEN: usize = 1000;
pub const REPORTER_MIN_LEN: usize = 2;
pub const REPORTER_MAX_LEN: usize = 50;
pub const ASSIGNEE_MAX_LEN: usize = 50;
pub const TAG_MAX_LEN: usize = 20;
pub const STEP_MAX_LEN: usize = 200;
pub const COMMENT_MAX_LEN: usize = 500;

/// Outcome of a single field validator: the normalized value, or the reason
/// it was rejected.
pub type FieldResult<T> = Result<T, String>;

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Shared shape of the required, bounded text fields.
fn bounded_text(
    value: Option<&str>,
    min: usize,
    max: usize,
    required_msg: &str,
    too_short_msg: &str,
    too_long_msg: &str,
) -> FieldResult<String> {
    let value = match value {
        Some(v) if !v.is_empty() => v,
        _ => return Err(required_msg.to_string()),
    };
    let trimmed = value.trim();
    let len = char_len(trimmed);
    if len < min {
        return Err(too_short_msg.to_string());
    }
    if len > max {
        return Err(too_long_msg.to_string());
    }
    Ok(trimmed.to_string())
}

// ---------------------------------------------------------------------------
// Field validators
// ---------------------------------------------------------------------------

pub fn validate_bug_title(title: Option<&str>) -> FieldResult<String> {
    bounded_text(
        title,
        TITLE_MIN_LEN,
        TITLE_MAX_LEN,
        "Title is required and must be a string",
        "Title must be at least 3 characters long",
        "Title cannot exceed 100 characters",
    )
}

pub fn validate_bug_description(description: Option<&str>) -> FieldResult<String> {
    bounded_text(
        description,
        DESCRIPTION_MIN_LEN,
        DESCRIPTION_MAX_LEN,
        "Description is required and must be a string",
        "Description must be at least 10 characters long",
        "Description cannot exceed 1000 characters",
    )
}

pub fn validate_reporter(reporter: Option<&str>) -> FieldResult<String> {
    bounded_text(
        reporter,
        REPORTER_MIN_LEN,
        REPORTER_MAX_LEN,
        "Reporter is required and must be a string",
        "Reporter name must be at least 2 characters long",
        "Reporter name cannot exceed 50 characters",
    )
}

pub fn validate_severity(severity: &str) -> FieldResult<Severity> {
    Severity::parse(severity)
        .ok_or_else(|| format!("Severity must be one of: {}", Severity::allowed()))
}

pub fn validate_status(status: &str) -> FieldResult<Status> {
    Status::parse(status).ok_or_else(|| format!("Status must be one of: {}", Status::allowed()))
}

pub fn validate_priority(priority: &str) -> FieldResult<Priority> {
    Priority::parse(priority)
        .ok_or_else(|| format!("Priority must be one of: {}", Priority::allowed()))
}

/// Parse a due date and require it to be strictly after `now`.
///
/// Accepts RFC 3339, a zone-less `YYYY-MM-DDTHH:MM:SS[.fff]` (read as UTC)
/// and a bare `YYYY-MM-DD` (midnight UTC).
pub fn validate_due_date(raw: &str, now: Timestamp) -> FieldResult<Timestamp> {
    let due = parse_timestamp(raw).ok_or_else(|| "Due date must be a valid date".to_string())?;
    if due <= now {
        return Err("Due date must be in the future".to_string());
    }
    Ok(due)
}

fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

pub fn validate_assignee(assignee: &str) -> FieldResult<String> {
    let trimmed = assignee.trim();
    if char_len(trimmed) > ASSIGNEE_MAX_LEN {
        return Err("Assignee name cannot exceed 50 characters".to_string());
    }
    Ok(trimmed.to_string())
}

pub fn validate_tags(tags: &[String]) -> FieldResult<Vec<String>> {
    bounded_items(tags, TAG_MAX_LEN, "Tag cannot exceed 20 characters")
}

pub fn validate_steps(steps: &[String]) -> FieldResult<Vec<String>> {
    bounded_items(steps, STEP_MAX_LEN, "Step cannot exceed 200 characters")
}

fn bounded_items(items: &[String], max: usize, too_long_msg: &str) -> FieldResult<Vec<String>> {
    let trimmed: Vec<String> = items.iter().map(|s| s.trim().to_string()).collect();
    if trimmed.iter().any(|s| char_len(s) > max) {
        return Err(too_long_msg.to_string());
    }
    Ok(trimmed)
}

pub fn validate_comment_author(author: Option<&str>) -> FieldResult<String> {
    match author.map(str::trim) {
        Some(a) if !a.is_empty() => Ok(a.to_string()),
        _ => Err("Comment author is required".to_string()),
    }
}

pub fn validate_comment_content(content: Option<&str>) -> FieldResult<String> {
    let content = match content.map(str::trim) {
        Some(c) if !c.is_empty() => c,
        _ => return Err("Comment content is required".to_string()),
    };
    if char_len(content) > COMMENT_MAX_LEN {
        return Err("Comment cannot exceed 500 characters".to_string());
    }
    Ok(content.to_string())
}

/// Validate one comment, collecting both field messages when both fail.
pub fn validate_comment(input: &CommentInput, now: Timestamp) -> Result<Comment, Vec<String>> {
    let author = validate_comment_author(input.author.as_deref());
    let content = validate_comment_content(input.content.as_deref());
    match (author, content) {
        (Ok(author), Ok(content)) => Ok(Comment {
            author,
            content,
            created_at: input.created_at.unwrap_or(now),
        }),
        (author, content) => Err(author.err().into_iter().chain(content.err()).collect()),
    }
}

fn normalize_attachment(input: &AttachmentInput, now: Timestamp) -> Attachment {
    Attachment {
        filename: input.filename.as_deref().map(|s| s.trim().to_string()),
        url: input.url.as_deref().map(|s| s.trim().to_string()),
        upload_date: input.upload_date.unwrap_or(now),
    }
}

// ---------------------------------------------------------------------------
// Aggregate validation
// ---------------------------------------------------------------------------

/// Pass/fail summary of a whole record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Every normalized value the validators produced, plus every failure.
///
/// Optional fields are `Some` only when they were present in the input and
/// passed their validator.
#[derive(Debug, Clone, Default)]
pub struct CheckedBug {
    pub title: Option<String>,
    pub description: Option<String>,
    pub reporter: Option<String>,
    pub severity: Option<Severity>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub due_date: Option<Timestamp>,
    pub assignee: Option<String>,
    pub tags: Option<Vec<String>>,
    pub steps_to_reproduce: Option<Vec<String>>,
    pub environment: Option<Environment>,
    pub attachments: Option<Vec<Attachment>>,
    pub comments: Option<Vec<Comment>>,
    pub errors: Vec<String>,
}

impl CheckedBug {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn keep<T>(&mut self, result: FieldResult<T>) -> Option<T> {
        result.map_err(|e| self.errors.push(e)).ok()
    }
}

/// Run every applicable validator over `input`.
///
/// Required fields are always checked; optional ones only when present.
/// Errors are recorded in a fixed field order and never short-circuit.
pub fn check_bug_data(input: &BugInput, now: Timestamp) -> CheckedBug {
    let mut checked = CheckedBug::default();

    checked.title = checked.keep(validate_bug_title(input.title.as_deref()));
    checked.description = checked.keep(validate_bug_description(input.description.as_deref()));
    checked.reporter = checked.keep(validate_reporter(input.reporter.as_deref()));

    if let Some(severity) = &input.severity {
        checked.severity = checked.keep(validate_severity(severity));
    }
    if let Some(status) = &input.status {
        checked.status = checked.keep(validate_status(status));
    }
    if let Some(priority) = &input.priority {
        checked.priority = checked.keep(validate_priority(priority));
    }
    if let Some(due_date) = &input.due_date {
        checked.due_date = checked.keep(validate_due_date(due_date, now));
    }
    if let Some(assignee) = &input.assignee {
        checked.assignee = checked.keep(validate_assignee(assignee));
    }
    if let Some(tags) = &input.tags {
        checked.tags = checked.keep(validate_tags(tags));
    }
    if let Some(steps) = &input.steps_to_reproduce {
        checked.steps_to_reproduce = checked.keep(validate_steps(steps));
    }

    checked.environment = input.environment.clone().map(Environment::trimmed);
    checked.attachments = input.attachments.as_ref().map(|attachments| {
        attachments
            .iter()
            .map(|a| normalize_attachment(a, now))
            .collect()
    });

    if let Some(comments) = &input.comments {
        let mut valid = Vec::with_capacity(comments.len());
        for comment in comments {
            match validate_comment(comment, now) {
                Ok(c) => valid.push(c),
                Err(errs) => checked.errors.extend(errs),
            }
        }
        if valid.len() == comments.len() {
            checked.comments = Some(valid);
        }
    }

    checked
}

/// Validate a (possibly merged) bug record against all field rules.
pub fn validate_bug_data(input: &BugInput, now: Timestamp) -> ValidationReport {
    let checked = check_bug_data(input, now);
    ValidationReport {
        is_valid: checked.is_valid(),
        errors: checked.errors,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
