//! The write pipeline: sanitize, then validate, then hand back a payload the
//! store can persist without further checks.

use crate::bug::{Bug, BugChanges, BugInput, Comment, CommentInput, NewBug};
use crate::error::CoreError;
use crate::sanitize::{sanitize_input, sanitize_opt};
use crate::types::Timestamp;
use crate::validation::{check_bug_data, validate_comment};

/// Sanitize the free-text fields of a write request.
///
/// Blank optional strings (`assignee`, `dueDate`) are treated as absent,
/// which is what HTML forms send for untouched inputs.
pub fn sanitize_bug_input(mut input: BugInput) -> BugInput {
    input.title = sanitize_opt(input.title);
    input.description = sanitize_opt(input.description);
    input.reporter = sanitize_opt(input.reporter);
    input.assignee = sanitize_opt(input.assignee).filter(|a| !a.is_empty());
    input.due_date = input.due_date.filter(|d| !d.trim().is_empty());
    if let Some(comments) = input.comments.as_mut() {
        for comment in comments.iter_mut() {
            sanitize_comment(comment);
        }
    }
    input
}

fn sanitize_comment(comment: &mut CommentInput) {
    comment.author = comment.author.take().map(|a| sanitize_input(&a));
    comment.content = comment.content.take().map(|c| sanitize_input(&c));
}

/// Sanitize and validate a create request.
pub fn prepare_new_bug(input: BugInput, now: Timestamp) -> Result<NewBug, CoreError> {
    let input = sanitize_bug_input(input);
    let checked = check_bug_data(&input, now);
    if !checked.is_valid() {
        return Err(CoreError::Validation(checked.errors));
    }

    let (Some(title), Some(description), Some(reporter)) =
        (checked.title, checked.description, checked.reporter)
    else {
        return Err(CoreError::Internal(
            "required bug fields missing after validation".into(),
        ));
    };

    Ok(NewBug {
        title,
        description,
        reporter,
        assignee: checked.assignee,
        severity: checked.severity.unwrap_or_default(),
        status: checked.status.unwrap_or_default(),
        priority: checked.priority.unwrap_or_default(),
        tags: checked.tags.unwrap_or_default(),
        steps_to_reproduce: checked.steps_to_reproduce.unwrap_or_default(),
        environment: checked.environment,
        attachments: checked.attachments.unwrap_or_default(),
        comments: checked.comments.unwrap_or_default(),
        due_date: checked.due_date,
    })
}

/// Sanitize and validate a partial update against the stored record.
///
/// Validation runs on the merged record so an update that only touches
/// `status` still re-checks the stored title, description, reporter and
/// due date. Once a stored due date has passed, edits are rejected until
/// the update supplies a new one.
pub fn prepare_changes(
    existing: &Bug,
    input: BugInput,
    now: Timestamp,
) -> Result<BugChanges, CoreError> {
    let supplied = sanitize_bug_input(input);

    let merged = BugInput {
        title: supplied.title.clone().or_else(|| Some(existing.title.clone())),
        description: supplied
            .description
            .clone()
            .or_else(|| Some(existing.description.clone())),
        reporter: supplied
            .reporter
            .clone()
            .or_else(|| Some(existing.reporter.clone())),
        due_date: supplied
            .due_date
            .clone()
            .or_else(|| existing.due_date.map(|d| d.to_rfc3339())),
        ..supplied.clone()
    };

    let checked = check_bug_data(&merged, now);
    if !checked.is_valid() {
        return Err(CoreError::Validation(checked.errors));
    }

    Ok(BugChanges {
        title: supplied.title.and(checked.title),
        description: supplied.description.and(checked.description),
        reporter: supplied.reporter.and(checked.reporter),
        assignee: checked.assignee,
        severity: checked.severity,
        status: checked.status,
        priority: checked.priority,
        tags: checked.tags,
        steps_to_reproduce: checked.steps_to_reproduce,
        environment: checked.environment,
        attachments: checked.attachments,
        comments: checked.comments,
        due_date: supplied.due_date.and(checked.due_date),
    })
}

/// Sanitize and validate a single comment for appending to a bug.
pub fn prepare_comment(mut input: CommentInput, now: Timestamp) -> Result<Comment, CoreError> {
    sanitize_comment(&mut input);
    validate_comment(&input, now).map_err(CoreError::Validation)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{Duration, Utc};

    use super::*;
    use crate::bug::{Priority, Severity, Status};
    use crate::types::BugId;

    fn create_input() -> BugInput {
        BugInput {
            title: Some("<script>alert(\"hack\")</script>Test Bug".into()),
            description: Some("This is a test bug description with javascript:alert(1) in it".into()),
            reporter: Some("John Doe onclick=\"x()\"".into()),
            ..Default::default()
        }
    }

    fn stored(now: Timestamp) -> Bug {
        let new = prepare_new_bug(
            BugInput {
                title: Some("Stored bug".into()),
                description: Some("A description long enough".into()),
                reporter: Some("Alice".into()),
                ..Default::default()
            },
            now,
        )
        .unwrap();
        Bug::new(BugId::now_v7(), new, now)
    }

    #[test]
    fn new_bug_is_sanitized_and_defaulted() {
        let bug = prepare_new_bug(create_input(), Utc::now()).unwrap();
        assert_eq!(bug.title, "alert(\"hack\")Test Bug");
        assert!(!bug.description.contains("javascript:"));
        assert!(!bug.reporter.contains("onclick"));
        assert_eq!(bug.severity, Severity::Medium);
        assert_eq!(bug.status, Status::Open);
        assert_eq!(bug.priority, Priority::Medium);
        assert!(bug.tags.is_empty());
    }

    #[test]
    fn sanitizing_can_push_a_title_below_the_minimum() {
        let input = BugInput {
            title: Some("<b></b>ab".into()),
            ..create_input()
        };
        let err = prepare_new_bug(input, Utc::now()).unwrap_err();
        assert_matches!(err, CoreError::Validation(errors) => {
            assert_eq!(errors, vec!["Title must be at least 3 characters long".to_string()]);
        });
    }

    #[test]
    fn blank_assignee_and_due_date_are_absent() {
        let input = BugInput {
            assignee: Some("   ".into()),
            due_date: Some("".into()),
            ..create_input()
        };
        let bug = prepare_new_bug(input, Utc::now()).unwrap();
        assert_eq!(bug.assignee, None);
        assert_eq!(bug.due_date, None);
    }

    #[test]
    fn missing_everything_reports_all_required_fields() {
        let err = prepare_new_bug(BugInput::default(), Utc::now()).unwrap_err();
        assert_matches!(err, CoreError::Validation(errors) if errors.len() == 3);
    }

    #[test]
    fn status_only_update_touches_only_status() {
        let now = Utc::now();
        let bug = stored(now);
        let changes = prepare_changes(
            &bug,
            BugInput {
                status: Some("resolved".into()),
                ..Default::default()
            },
            now,
        )
        .unwrap();
        assert_eq!(
            changes,
            BugChanges {
                status: Some(Status::Resolved),
                ..Default::default()
            }
        );
    }

    #[test]
    fn update_validates_the_merged_record() {
        let now = Utc::now();
        let mut bug = stored(now);
        // A record that somehow holds an invalid stored value still fails.
        bug.title = "x".into();
        let err = prepare_changes(
            &bug,
            BugInput {
                status: Some("closed".into()),
                ..Default::default()
            },
            now,
        )
        .unwrap_err();
        assert_matches!(err, CoreError::Validation(errors) => {
            assert_eq!(errors, vec!["Title must be at least 3 characters long".to_string()]);
        });
    }

    #[test]
    fn update_rejects_invalid_supplied_fields() {
        let now = Utc::now();
        let bug = stored(now);
        let err = prepare_changes(
            &bug,
            BugInput {
                title: Some("".into()),
                priority: Some("asap".into()),
                ..Default::default()
            },
            now,
        )
        .unwrap_err();
        assert_matches!(err, CoreError::Validation(errors) if errors.len() == 2);
    }

    #[test]
    fn stored_past_due_date_blocks_updates() {
        let now = Utc::now();
        let mut bug = stored(now);
        bug.due_date = Some(now - Duration::days(3));
        let err = prepare_changes(
            &bug,
            BugInput {
                status: Some("closed".into()),
                ..Default::default()
            },
            now,
        )
        .unwrap_err();
        assert_matches!(err, CoreError::Validation(errors) => {
            assert_eq!(errors, vec!["Due date must be in the future".to_string()]);
        });
    }

    #[test]
    fn stored_future_due_date_is_not_rewritten() {
        let now = Utc::now();
        let mut bug = stored(now);
        bug.due_date = Some(now + Duration::days(3));
        let changes = prepare_changes(
            &bug,
            BugInput {
                severity: Some("low".into()),
                ..Default::default()
            },
            now,
        )
        .unwrap();
        assert_eq!(changes.severity, Some(Severity::Low));
        assert_eq!(changes.due_date, None);
    }

    #[test]
    fn new_due_date_replaces_a_passed_one() {
        let now = Utc::now();
        let mut bug = stored(now);
        bug.due_date = Some(now - Duration::days(3));
        let changes = prepare_changes(
            &bug,
            BugInput {
                due_date: Some("2999-01-01".into()),
                ..Default::default()
            },
            now,
        )
        .unwrap();
        assert!(changes.due_date.is_some_and(|d| d > now));
    }

    #[test]
    fn update_sanitizes_supplied_text() {
        let now = Utc::now();
        let bug = stored(now);
        let changes = prepare_changes(
            &bug,
            BugInput {
                assignee: Some(" <i>Bob</i> ".into()),
                ..Default::default()
            },
            now,
        )
        .unwrap();
        assert_eq!(changes.assignee.as_deref(), Some("Bob"));
        assert_eq!(changes.title, None);
    }

    #[test]
    fn comment_is_sanitized_then_validated() {
        let now = Utc::now();
        let comment = prepare_comment(
            CommentInput {
                author: Some(" <b>Carol</b> ".into()),
                content: Some("Reproduced on staging".into()),
                created_at: None,
            },
            now,
        )
        .unwrap();
        assert_eq!(comment.author, "Carol");
        assert_eq!(comment.created_at, now);

        let err = prepare_comment(
            CommentInput {
                author: Some("<p></p>".into()),
                content: Some("text".into()),
                created_at: None,
            },
            now,
        )
        .unwrap_err();
        assert_matches!(err, CoreError::Validation(errors) => {
            assert_eq!(errors, vec!["Comment author is required".to_string()]);
        });
    }
}
