//! The `Bug` entity, its enumerations, and the derived-field rules that run
//! before every write.
//!
//! Defaults and the `resolvedAt` stamp live here as plain functions so both
//! storage backends apply exactly the same rules.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{BugId, Timestamp};

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Declares a closed string enum with its wire names, a `parse` lookup and
/// the human-readable list used in validation messages.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $wire)] $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire name of this variant.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $wire ),+
                }
            }

            /// Look up a variant by its exact wire name.
            pub fn parse(raw: &str) -> Option<Self> {
                match raw {
                    $( $wire => Some($name::$variant), )+
                    _ => None,
                }
            }

            /// Comma-separated list of wire names, e.g. `low, medium, high`.
            pub fn allowed() -> String {
                Self::ALL
                    .iter()
                    .map(|v| v.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum! {
    /// How badly the defect hurts users.
    Severity {
        Low => "low",
        #[default]
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
}

string_enum! {
    /// Workflow state. Any transition is allowed; only entering
    /// [`Status::Resolved`] has a side effect.
    Status {
        #[default]
        Open => "open",
        InProgress => "in-progress",
        Resolved => "resolved",
        Closed => "closed",
    }
}

string_enum! {
    /// Scheduling urgency.
    Priority {
        Low => "low",
        #[default]
        Medium => "medium",
        High => "high",
        Urgent => "urgent",
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// Where the defect was observed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub browser: Option<String>,
    pub os: Option<String>,
    pub version: Option<String>,
}

impl Environment {
    /// Trim every field, dropping the ones left empty.
    pub fn trimmed(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }
        Self {
            browser: clean(self.browser),
            os: clean(self.os),
            version: clean(self.version),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub filename: Option<String>,
    pub url: Option<String>,
    pub upload_date: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub author: String,
    pub content: String,
    pub created_at: Timestamp,
}

/// A stored bug record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bug {
    pub id: BugId,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub status: Status,
    pub priority: Priority,
    pub reporter: String,
    pub assignee: Option<String>,
    pub tags: Vec<String>,
    pub steps_to_reproduce: Vec<String>,
    pub environment: Option<Environment>,
    pub attachments: Vec<Attachment>,
    pub comments: Vec<Comment>,
    pub due_date: Option<Timestamp>,
    pub resolved_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Bug {
    /// Materialize a validated [`NewBug`] with server-assigned fields.
    pub fn new(id: BugId, input: NewBug, now: Timestamp) -> Self {
        let mut bug = Self {
            id,
            title: input.title,
            description: input.description,
            severity: input.severity,
            status: input.status,
            priority: input.priority,
            reporter: input.reporter,
            assignee: input.assignee,
            tags: input.tags,
            steps_to_reproduce: input.steps_to_reproduce,
            environment: input.environment,
            attachments: input.attachments,
            comments: input.comments,
            due_date: input.due_date,
            resolved_at: None,
            created_at: now,
            updated_at: now,
        };
        bug.apply_resolution_rule(now);
        bug
    }

    /// Overlay the supplied fields, refresh `updated_at` and re-run the
    /// resolution rule.
    pub fn apply_changes(&mut self, changes: &BugChanges, now: Timestamp) {
        if let Some(title) = &changes.title {
            self.title = title.clone();
        }
        if let Some(description) = &changes.description {
            self.description = description.clone();
        }
        if let Some(reporter) = &changes.reporter {
            self.reporter = reporter.clone();
        }
        if let Some(assignee) = &changes.assignee {
            self.assignee = Some(assignee.clone());
        }
        if let Some(severity) = changes.severity {
            self.severity = severity;
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        if let Some(priority) = changes.priority {
            self.priority = priority;
        }
        if let Some(tags) = &changes.tags {
            self.tags = tags.clone();
        }
        if let Some(steps) = &changes.steps_to_reproduce {
            self.steps_to_reproduce = steps.clone();
        }
        if let Some(environment) = &changes.environment {
            self.environment = Some(environment.clone());
        }
        if let Some(attachments) = &changes.attachments {
            self.attachments = attachments.clone();
        }
        if let Some(comments) = &changes.comments {
            self.comments = comments.clone();
        }
        if let Some(due_date) = changes.due_date {
            self.due_date = Some(due_date);
        }
        self.updated_at = now;
        self.apply_resolution_rule(now);
    }

    /// Append a comment and refresh `updated_at`.
    pub fn push_comment(&mut self, comment: Comment, now: Timestamp) {
        self.comments.push(comment);
        self.updated_at = now;
    }

    /// Stamp `resolved_at` the first time the record is resolved. An existing
    /// stamp is never overwritten or cleared.
    pub fn apply_resolution_rule(&mut self, now: Timestamp) {
        if self.status == Status::Resolved && self.resolved_at.is_none() {
            self.resolved_at = Some(now);
        }
    }
}

// ---------------------------------------------------------------------------
// Write payloads
// ---------------------------------------------------------------------------

/// Raw attachment as received on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentInput {
    pub filename: Option<String>,
    pub url: Option<String>,
    pub upload_date: Option<Timestamp>,
}

/// Raw comment as received on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentInput {
    pub author: Option<String>,
    pub content: Option<String>,
    pub created_at: Option<Timestamp>,
}

/// Unvalidated bug fields from a create or update request.
///
/// Every field is optional so the same shape serves full and partial
/// writes. Enumerations and the due date stay as raw strings until the
/// validators have had a chance to report on them. Unknown and
/// server-assigned keys (`id`, `createdAt`, `resolvedAt`, ...) are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BugInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub reporter: Option<String>,
    pub assignee: Option<String>,
    pub severity: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub tags: Option<Vec<String>>,
    pub steps_to_reproduce: Option<Vec<String>>,
    pub environment: Option<Environment>,
    pub attachments: Option<Vec<AttachmentInput>>,
    pub comments: Option<Vec<CommentInput>>,
    pub due_date: Option<String>,
}

/// A fully validated record ready to be stored for the first time.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBug {
    pub title: String,
    pub description: String,
    pub reporter: String,
    pub assignee: Option<String>,
    pub severity: Severity,
    pub status: Status,
    pub priority: Priority,
    pub tags: Vec<String>,
    pub steps_to_reproduce: Vec<String>,
    pub environment: Option<Environment>,
    pub attachments: Vec<Attachment>,
    pub comments: Vec<Comment>,
    pub due_date: Option<Timestamp>,
}

/// The validated subset of fields an update supplied. `None` means
/// "leave the stored value alone".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BugChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub reporter: Option<String>,
    pub assignee: Option<String>,
    pub severity: Option<Severity>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub tags: Option<Vec<String>>,
    pub steps_to_reproduce: Option<Vec<String>>,
    pub environment: Option<Environment>,
    pub attachments: Option<Vec<Attachment>>,
    pub comments: Option<Vec<Comment>>,
    pub due_date: Option<Timestamp>,
}

impl BugChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
