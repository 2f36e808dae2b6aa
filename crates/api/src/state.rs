use std::sync::Arc;

use bugtrack_db::BugStore;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Bug persistence, PostgreSQL or in-memory depending on configuration.
    pub store: Arc<dyn BugStore>,
}
