pub mod bugs;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// /bugs                  list, create
/// /bugs/{id}             get, update, delete
/// /bugs/{id}/comments    add comment
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/bugs", bugs::router())
}
