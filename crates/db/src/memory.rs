//! In-process [`BugStore`] for local development and tests.
//!
//! Records live in insertion order behind a `tokio` `RwLock`; nothing
//! survives a restart.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use bugtrack_core::bug::{Bug, BugChanges, Comment, NewBug};
use bugtrack_core::types::BugId;

use crate::error::StoreError;
use crate::store::{BugFilter, BugPage, BugStore, PageRequest};

#[derive(Debug, Default)]
pub struct MemoryBugStore {
    bugs: RwLock<Vec<Bug>>,
}

impl MemoryBugStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pre-built record as-is, e.g. to seed fixtures with fixed
    /// timestamps.
    pub async fn insert(&self, bug: Bug) {
        self.bugs.write().await.push(bug);
    }
}

#[async_trait]
impl BugStore for MemoryBugStore {
    async fn list(&self, filter: &BugFilter, page: PageRequest) -> Result<BugPage, StoreError> {
        let bugs = self.bugs.read().await;

        // Reverse insertion order first so equal timestamps list newest first
        // after the stable sort.
        let mut matches: Vec<&Bug> = bugs.iter().rev().filter(|b| filter.matches(b)).collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matches.len() as i64;
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit).unwrap_or(usize::MAX);
        let items = matches
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        Ok(BugPage { items, total })
    }

    async fn find_by_id(&self, id: BugId) -> Result<Option<Bug>, StoreError> {
        let bugs = self.bugs.read().await;
        Ok(bugs.iter().find(|b| b.id == id).cloned())
    }

    async fn create(&self, new: NewBug) -> Result<Bug, StoreError> {
        let bug = Bug::new(BugId::now_v7(), new, Utc::now());
        self.bugs.write().await.push(bug.clone());
        Ok(bug)
    }

    async fn update(&self, id: BugId, changes: &BugChanges) -> Result<Option<Bug>, StoreError> {
        let mut bugs = self.bugs.write().await;
        Ok(bugs.iter_mut().find(|b| b.id == id).map(|bug| {
            bug.apply_changes(changes, Utc::now());
            bug.clone()
        }))
    }

    async fn add_comment(&self, id: BugId, comment: Comment) -> Result<Option<Bug>, StoreError> {
        let mut bugs = self.bugs.write().await;
        Ok(bugs.iter_mut().find(|b| b.id == id).map(|bug| {
            bug.push_comment(comment, Utc::now());
            bug.clone()
        }))
    }

    async fn delete(&self, id: BugId) -> Result<bool, StoreError> {
        let mut bugs = self.bugs.write().await;
        match bugs.iter().position(|b| b.id == id) {
            Some(idx) => {
                bugs.remove(idx);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
