use crate::error::CoreError;

/// Bug identifiers are UUIDv7, issued by the service at creation.
pub type BugId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Parse a path segment into a [`BugId`].
pub fn parse_bug_id(raw: &str) -> Result<BugId, CoreError> {
    BugId::parse_str(raw).map_err(|_| CoreError::MalformedId {
        entity: "Bug",
        raw: raw.to_string(),
    })
}
