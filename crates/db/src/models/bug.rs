//! Row model for the `bugs` table.

use sqlx::types::Json;
use sqlx::FromRow;

use bugtrack_core::bug::{Attachment, Bug, Comment, Environment, Priority, Severity, Status};
use bugtrack_core::types::{BugId, Timestamp};

use crate::error::StoreError;

/// A row from the `bugs` table. Enumerations are stored as their wire names.
#[derive(Debug, Clone, FromRow)]
pub struct BugRow {
    pub id: BugId,
    pub title: String,
    pub description: String,
    pub severity: String,
    pub status: String,
    pub priority: String,
    pub reporter: String,
    pub assignee: Option<String>,
    pub tags: Vec<String>,
    pub steps_to_reproduce: Vec<String>,
    pub environment: Option<Json<Environment>>,
    pub attachments: Json<Vec<Attachment>>,
    pub comments: Json<Vec<Comment>>,
    pub due_date: Option<Timestamp>,
    pub resolved_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

fn parse_column<T>(
    id: BugId,
    column: &str,
    raw: &str,
    parse: fn(&str) -> Option<T>,
) -> Result<T, StoreError> {
    parse(raw).ok_or_else(|| StoreError::Corrupt {
        id: id.to_string(),
        reason: format!("unknown {column} '{raw}'"),
    })
}

impl TryFrom<BugRow> for Bug {
    type Error = StoreError;

    fn try_from(row: BugRow) -> Result<Self, Self::Error> {
        Ok(Bug {
            severity: parse_column(row.id, "severity", &row.severity, Severity::parse)?,
            status: parse_column(row.id, "status", &row.status, Status::parse)?,
            priority: parse_column(row.id, "priority", &row.priority, Priority::parse)?,
            id: row.id,
            title: row.title,
            description: row.description,
            reporter: row.reporter,
            assignee: row.assignee,
            tags: row.tags,
            steps_to_reproduce: row.steps_to_reproduce,
            environment: row.environment.map(|Json(env)| env),
            attachments: row.attachments.0,
            comments: row.comments.0,
            due_date: row.due_date,
            resolved_at: row.resolved_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
