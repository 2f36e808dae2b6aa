//! The storage seam between request handlers and persistence.

use async_trait::async_trait;

use bugtrack_core::bug::{Bug, BugChanges, Comment, NewBug, Priority, Severity, Status};
use bugtrack_core::types::BugId;

use crate::error::StoreError;

/// Optional list filters. Enum filters match exactly; `reporter` matches a
/// case-insensitive substring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BugFilter {
    pub status: Option<Status>,
    pub severity: Option<Severity>,
    pub priority: Option<Priority>,
    pub reporter: Option<String>,
}

impl BugFilter {
    /// In-process evaluation of the filter, mirroring the SQL `WHERE` clause.
    pub fn matches(&self, bug: &Bug) -> bool {
        self.status.map_or(true, |s| bug.status == s)
            && self.severity.map_or(true, |s| bug.severity == s)
            && self.priority.map_or(true, |p| bug.priority == p)
            && self.reporter.as_deref().map_or(true, |needle| {
                bug.reporter
                    .to_lowercase()
                    .contains(&needle.to_lowercase())
            })
    }
}

/// A 1-based page request with its limit already clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub const DEFAULT_PAGE: i64 = 1;
    pub const DEFAULT_LIMIT: i64 = 10;
    pub const MAX_LIMIT: i64 = 100;

    /// Apply defaults and clamp: `page >= 1`, `1 <= limit <= MAX_LIMIT`.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(Self::DEFAULT_PAGE).max(1),
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
        }
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// `ceil(total / limit)`; zero when there is nothing to show.
    pub fn page_count(&self, total: i64) -> i64 {
        if total <= 0 {
            0
        } else {
            (total + self.limit - 1) / self.limit
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results plus the unpaginated match count.
#[derive(Debug, Clone)]
pub struct BugPage {
    pub items: Vec<Bug>,
    pub total: i64,
}

/// Persistence operations for bug records.
///
/// Implementations assign ids and timestamps, apply
/// [`Bug::apply_resolution_rule`] on every write, and report absence with
/// `None`/`false` rather than an error. Concurrent writers to the same record
/// are last-write-wins.
#[async_trait]
pub trait BugStore: Send + Sync {
    /// Matching bugs ordered newest first, sliced to `page`.
    async fn list(&self, filter: &BugFilter, page: PageRequest) -> Result<BugPage, StoreError>;

    async fn find_by_id(&self, id: BugId) -> Result<Option<Bug>, StoreError>;

    async fn create(&self, new: NewBug) -> Result<Bug, StoreError>;

    /// Persist only the supplied fields and refresh `updated_at`.
    async fn update(&self, id: BugId, changes: &BugChanges) -> Result<Option<Bug>, StoreError>;

    async fn add_comment(&self, id: BugId, comment: Comment) -> Result<Option<Bug>, StoreError>;

    /// Returns `true` when a record was removed.
    async fn delete(&self, id: BugId) -> Result<bool, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
