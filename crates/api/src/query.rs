//! Query parameter types for the bug list endpoint.

use serde::Deserialize;

use bugtrack_core::bug::{Priority, Severity, Status};
use bugtrack_db::{BugFilter, PageRequest};

/// `GET /api/bugs?status=&severity=&priority=&reporter=&page=&limit=`.
///
/// Blank values are ignored, so `?status=` lists every status.
#[derive(Debug, Default, Deserialize)]
pub struct BugListParams {
    pub status: Option<String>,
    pub severity: Option<String>,
    pub priority: Option<String>,
    pub reporter: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl BugListParams {
    /// Parse the equality filters.
    ///
    /// Returns `None` when an enum filter names a value no bug can hold, so
    /// the query matches nothing.
    pub fn filter(&self) -> Option<BugFilter> {
        Some(BugFilter {
            status: enum_filter(&self.status, Status::parse)?,
            severity: enum_filter(&self.severity, Severity::parse)?,
            priority: enum_filter(&self.priority, Priority::parse)?,
            reporter: non_blank(&self.reporter).map(str::to_string),
        })
    }

    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

/// `Some(None)` for an absent or blank value, `None` for an unknown one.
fn enum_filter<T>(value: &Option<String>, parse: fn(&str) -> Option<T>) -> Option<Option<T>> {
    match non_blank(value) {
        None => Some(None),
        Some(raw) => parse(raw).map(Some),
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
