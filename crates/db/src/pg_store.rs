//! PostgreSQL-backed [`BugStore`].

use async_trait::async_trait;
use chrono::Utc;

use bugtrack_core::bug::{Bug, BugChanges, Comment, NewBug};
use bugtrack_core::types::BugId;

use crate::error::StoreError;
use crate::models::bug::BugRow;
use crate::repositories::BugRepo;
use crate::store::{BugFilter, BugPage, BugStore, PageRequest};
use crate::DbPool;

#[derive(Debug, Clone)]
pub struct PgBugStore {
    pool: DbPool,
}

impl PgBugStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn into_bug(row: Option<BugRow>) -> Result<Option<Bug>, StoreError> {
    row.map(Bug::try_from).transpose()
}

#[async_trait]
impl BugStore for PgBugStore {
    async fn list(&self, filter: &BugFilter, page: PageRequest) -> Result<BugPage, StoreError> {
        let rows = BugRepo::list(&self.pool, filter, page).await?;
        let total = BugRepo::count(&self.pool, filter).await?;
        let items = rows
            .into_iter()
            .map(Bug::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(returned = items.len(), total, "Listed bugs from database");
        Ok(BugPage { items, total })
    }

    async fn find_by_id(&self, id: BugId) -> Result<Option<Bug>, StoreError> {
        into_bug(BugRepo::find_by_id(&self.pool, id).await?)
    }

    async fn create(&self, new: NewBug) -> Result<Bug, StoreError> {
        let bug = Bug::new(BugId::now_v7(), new, Utc::now());
        let row = BugRepo::insert(&self.pool, &bug).await?;
        Bug::try_from(row)
    }

    async fn update(&self, id: BugId, changes: &BugChanges) -> Result<Option<Bug>, StoreError> {
        if changes.is_empty() {
            tracing::debug!(bug_id = %id, "Update with no field changes, touching updated_at only");
        }
        into_bug(BugRepo::update(&self.pool, id, changes, Utc::now()).await?)
    }

    async fn add_comment(&self, id: BugId, comment: Comment) -> Result<Option<Bug>, StoreError> {
        into_bug(BugRepo::append_comment(&self.pool, id, &comment, Utc::now()).await?)
    }

    async fn delete(&self, id: BugId) -> Result<bool, StoreError> {
        Ok(BugRepo::delete(&self.pool, id).await?)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        if self.pool.is_closed() {
            return Err(StoreError::Unavailable("connection pool is closed".into()));
        }
        crate::health_check(&self.pool).await?;
        Ok(())
    }
}
